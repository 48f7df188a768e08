//! Local cache of catalog type names.
//!
//! Type rows are shared by every user, created on first sight and never
//! updated or removed.

use sqlx::SqliteConnection;
use std::sync::Arc;
use tracing::debug;

use crate::catalog::CatalogSource;
use crate::storage::CatalogTypeRepository;

pub const FALLBACK_TYPE: &str = "Normal";

pub struct TypeCache {
    source: Arc<dyn CatalogSource>,
}

impl TypeCache {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self { source }
    }

    /// Capitalized primary type of `code`, or `Normal` when the catalog
    /// cannot tell.
    pub async fn fetch_type_name(&self, code: &str) -> String {
        match self.source.item_detail(code).await {
            Ok(detail) => match detail.primary_type() {
                Some(name) if !name.is_empty() => capitalize(name),
                _ => FALLBACK_TYPE.to_string(),
            },
            Err(e) => {
                debug!(code, "Type lookup failed, using {}: {}", FALLBACK_TYPE, e);
                FALLBACK_TYPE.to_string()
            }
        }
    }

    /// Local id of `type_name`, creating the row if needed.
    pub async fn resolve_type(conn: &mut SqliteConnection, type_name: &str) -> Result<i64, sqlx::Error> {
        CatalogTypeRepository::get_or_create(conn, &capitalize(type_name)).await
    }
}

/// First character upper case, the rest lower case.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
