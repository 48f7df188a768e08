//! Catalog listing enriched with the caller's favorite and team flags.

use futures::future::join_all;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::client::CatalogSource;
use super::types::{CatalogItem, ItemDetail, NamedResource};
use crate::core::validation::char_len;
use crate::core::{ApiError, ApiResult};
use crate::storage::{CollectionRepository, Database};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;
pub const MAX_NAME_FILTER_LEN: usize = 50;

pub const MSG_INVALID_PARAMS: &str = "Parâmetros inválidos";
pub const MSG_INVALID_NAME_FILTER: &str = "Nome inválido";
pub const MSG_INVALID_GENERATION: &str = "Geração inválida";
pub const MSG_GENERATION_NOT_FOUND: &str = "Geração não encontrada!";
pub const MSG_CATALOG_UNAVAILABLE: &str = "catalog listing unavailable";

/// Raw query string. Numbers arrive as text so a bad value is a 400 with
/// our own message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    pub nome: Option<String>,
    pub geracao: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Validated listing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFilter {
    pub name: Option<String>,
    pub generation: Option<u8>,
    pub limit: u32,
    pub offset: u32,
}

impl CatalogFilter {
    pub fn parse(query: &CatalogQuery) -> ApiResult<Self> {
        let limit = parse_number(query.limit.as_deref(), DEFAULT_LIMIT)?.clamp(1, MAX_LIMIT);
        let offset = parse_number(query.offset.as_deref(), 0)?.clamp(0, u32::MAX as i64);

        let name = non_empty(query.nome.as_deref());
        if let Some(name) = &name {
            if char_len(name) > MAX_NAME_FILTER_LEN {
                return Err(ApiError::bad_request(MSG_INVALID_NAME_FILTER));
            }
        }

        let generation = match non_empty(query.geracao.as_deref()) {
            Some(raw) => Some(parse_generation(&raw)?),
            None => None,
        };

        Ok(Self {
            name,
            generation,
            limit: limit as u32,
            offset: offset as u32,
        })
    }

    fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn parse_number(value: Option<&str>, default: i64) -> ApiResult<i64> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| ApiError::bad_request(MSG_INVALID_PARAMS)),
    }
}

/// A digit string between 1 and 9.
fn parse_generation(raw: &str) -> ApiResult<u8> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::bad_request(MSG_INVALID_GENERATION));
    }
    match raw.parse::<u8>() {
        Ok(n) if (1..=9).contains(&n) => Ok(n),
        _ => Err(ApiError::bad_request(MSG_INVALID_GENERATION)),
    }
}

fn matches_name(candidate: &str, needle_lower: &str) -> bool {
    candidate.to_lowercase().contains(needle_lower)
}

/// Codes the caller has flagged, loaded once per listing.
#[derive(Debug, Default)]
struct CallerFlags {
    favorites: HashSet<String>,
    team: HashSet<String>,
}

impl CallerFlags {
    fn enrich(&self, detail: ItemDetail) -> CatalogItem {
        CatalogItem {
            favorito: self.favorites.contains(&detail.name),
            equipe: self.team.contains(&detail.name),
            id: detail.id,
            nome: detail.name,
            imagem: detail.sprites.front_default,
        }
    }
}

pub struct CatalogGateway {
    db: Database,
    source: Arc<dyn CatalogSource>,
    search_window: u32,
}

impl CatalogGateway {
    pub fn new(db: Database, source: Arc<dyn CatalogSource>, search_window: u32) -> Self {
        Self {
            db,
            source,
            search_window,
        }
    }

    pub async fn list_catalog(&self, caller_id: i64, query: &CatalogQuery) -> ApiResult<Vec<CatalogItem>> {
        let filter = CatalogFilter::parse(query)?;
        let flags = self.load_flags(caller_id).await?;

        let codes = if let Some(generation) = filter.generation {
            let members = self.source.generation(generation).await.map_err(|e| {
                debug!(generation, "Generation lookup failed: {}", e);
                ApiError::not_found(MSG_GENERATION_NOT_FOUND)
            })?;
            filter.paginate(filter_by_name(members.pokemon_species, filter.name.as_deref()))
        } else if let Some(name) = filter.name.as_deref() {
            match self.source.list_page(self.search_window, 0).await {
                Ok(page) => filter.paginate(filter_by_name(page.results, Some(name))),
                Err(e) => {
                    warn!("Catalog search window unavailable: {}", e);
                    return Ok(Vec::new());
                }
            }
        } else {
            self.source
                .list_page(filter.limit, filter.offset)
                .await
                .map_err(|e| ApiError::internal(format!("{}: {}", MSG_CATALOG_UNAVAILABLE, e)))?
                .results
        };

        let details = self.fetch_details(codes).await;
        Ok(details.into_iter().map(|d| flags.enrich(d)).collect())
    }

    async fn load_flags(&self, caller_id: i64) -> ApiResult<CallerFlags> {
        let mut conn = self.db.pool().acquire().await?;
        let entries = CollectionRepository::list_for_user(&mut conn, caller_id).await?;

        let mut flags = CallerFlags::default();
        for entry in entries {
            if entry.is_favorite {
                flags.favorites.insert(entry.code.clone());
            }
            if entry.is_on_team {
                flags.team.insert(entry.code);
            }
        }
        Ok(flags)
    }

    /// Fetches details concurrently, keeping listing order. Items whose
    /// detail cannot be fetched are left out.
    async fn fetch_details(&self, resources: Vec<NamedResource>) -> Vec<ItemDetail> {
        let lookups = resources
            .iter()
            .map(|resource| self.source.item_detail(&resource.name));

        join_all(lookups)
            .await
            .into_iter()
            .zip(resources.iter())
            .filter_map(|(result, resource)| match result {
                Ok(detail) => Some(detail),
                Err(e) => {
                    debug!(code = %resource.name, "Skipping item: {}", e);
                    None
                }
            })
            .collect()
    }
}

fn filter_by_name(resources: Vec<NamedResource>, name: Option<&str>) -> Vec<NamedResource> {
    match name {
        Some(name) => {
            let needle = name.to_lowercase();
            resources
                .into_iter()
                .filter(|r| matches_name(&r.name, &needle))
                .collect()
        }
        None => resources,
    }
}
