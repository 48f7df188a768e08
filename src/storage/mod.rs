//! Relational store: connection pool, schema bootstrap and per-entity repositories.
//!
//! Repositories take a `&mut SqliteConnection` so the same call works on a
//! pooled connection or inside a transaction (`&mut *tx`).

pub mod collection;
pub mod types;
pub mod users;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

pub use collection::{CollectionEntry, CollectionRepository, CollectionView, Flag, NewEntry};
pub use types::CatalogTypeRepository;
pub use users::{NewUser, Role, UserRecord, UserRepository};

const SCHEMA: &str = include_str!("../../migrations/001_init.sql");

/// Shared handle to the database pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let is_memory = config.url.contains(":memory:");
        ensure_parent_dir(&config.url);

        let mut options = SqliteConnectOptions::from_str(&config.url)
            .context("Invalid database URL format")?
            .create_if_missing(true)
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal);
        if !is_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Each in-memory connection is its own database, so keep exactly one alive.
        let pool_options = if is_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections.max(1))
                .acquire_timeout(Duration::from_secs(30))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .context("Failed to apply database schema")?;

        info!(memory = is_memory, "Database ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Creates the directory of a file-backed sqlite URL.
fn ensure_parent_dir(url: &str) {
    let Some(rest) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) else {
        return;
    };
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path.contains(":memory:") {
        return;
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Failed to create database dir {:?}: {}", parent, e);
            }
        }
    }
}

#[cfg(test)]
pub(crate) async fn memory_db() -> Database {
    Database::connect(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    })
    .await
    .expect("in-memory database")
}
