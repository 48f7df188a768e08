use anyhow::{Context, Result};
use std::env;

use super::AppConfig;

/// Overrides file values with the process environment.
///
/// | Variable            | Field                      |
/// |---------------------|----------------------------|
/// | `HOST`              | `server.host`              |
/// | `PORT`              | `server.port`              |
/// | `CORS_ALLOW_ORIGIN` | `server.cors_origins` (comma separated) |
/// | `DATABASE_URL`      | `database.url`             |
/// | `JWT_SECRET_KEY`    | `auth.jwt_secret`          |
/// | `POKEAPI_BASE_URL`  | `catalog.base_url`         |
/// | `ADMIN_PASSWORD`    | `bootstrap.admin_password` |
pub fn apply_env_overrides(config: &mut AppConfig) -> Result<()> {
    if let Some(host) = non_empty("HOST") {
        config.server.host = host;
    }
    if let Some(port) = non_empty("PORT") {
        config.server.port = port
            .parse()
            .with_context(|| format!("PORT must be a port number, got {}", port))?;
    }
    if let Some(origins) = non_empty("CORS_ALLOW_ORIGIN") {
        config.server.cors_origins = split_origins(&origins);
    }
    if let Some(url) = non_empty("DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(secret) = non_empty("JWT_SECRET_KEY") {
        config.auth.jwt_secret = secret;
    }
    if let Some(url) = non_empty("POKEAPI_BASE_URL") {
        config.catalog.base_url = url;
    }
    if let Some(password) = non_empty("ADMIN_PASSWORD") {
        config.bootstrap.admin_password = password;
    }
    Ok(())
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
