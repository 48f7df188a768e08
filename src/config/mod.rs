//! Application configuration.
//!
//! Values come from an optional TOML file and are then overridden by
//! environment variables (see [`env_config`]).

pub mod env_config;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Development-only JWT secret. Deployments must set `JWT_SECRET_KEY`.
pub const DEFAULT_JWT_SECRET: &str = "fallback-key-development";

/// Password of the bootstrap admin when none is configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub catalog: CatalogConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub token_ttl_secs: u64,
    pub password: PasswordHashConfig,
}

/// Argon2id cost parameters used for new hashes.
///
/// Verification always reads the parameters embedded in the stored hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordHashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// PokeAPI root, e.g. `https://pokeapi.co/api/v2`
    pub base_url: String,
    /// Per-request timeout. Unset means the transport default (none).
    pub timeout_secs: Option<u64>,
    /// Size of the listing scanned by name search
    pub search_window: u32,
}

/// First admin account, created when the store holds no admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub enabled: bool,
    pub admin_name: String,
    pub admin_login: String,
    pub admin_email: String,
    pub admin_password: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec![
                "http://localhost:4200".to_string(),
                "http://127.0.0.1:4200".to_string(),
                "http://localhost:5000".to_string(),
                "http://127.0.0.1:5000".to_string(),
            ],
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./pokeapi.db".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_secs: 3600,
            password: PasswordHashConfig::default(),
        }
    }
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        // argon2 crate defaults (OWASP baseline)
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pokeapi.co/api/v2".to_string(),
            timeout_secs: None,
            search_window: 1000,
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            admin_name: "Administrador".to_string(),
            admin_login: "admin".to_string(),
            admin_email: "admin@pokedex.com".to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl AuthConfig {
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

impl AppConfig {
    /// Loads `path` when it exists, then applies environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Self::from_toml(&raw)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        } else {
            tracing::info!("Config file {} not found, using defaults", path.display());
            Self::default()
        };

        env_config::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}
