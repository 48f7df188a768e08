//! Caller extraction: bearer token from the `Authorization` header, then the
//! caller's current role from the store.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use std::sync::Arc;

use crate::api::server::PokedexServer;
use crate::auth::access::Caller;
use crate::core::ApiError;

pub const MSG_MISSING_TOKEN: &str = "Token de acesso ausente";

/// Token of an `Authorization: Bearer <token>` header.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// The authenticated caller. Rejects with 401 when the token is missing,
/// malformed, forged or expired, or when its account was deleted.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Caller);

#[async_trait]
impl FromRequestParts<Arc<PokedexServer>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<PokedexServer>,
    ) -> Result<Self, Self::Rejection> {
        let caller = resolve_caller(parts, state).await?;
        caller.require_account()?;
        Ok(Self(caller))
    }
}

/// Like [`AuthUser`], but a valid token whose account no longer exists
/// still passes with `role: None`. The handler decides what that means.
#[derive(Debug, Clone, Copy)]
pub struct TokenUser(pub Caller);

#[async_trait]
impl FromRequestParts<Arc<PokedexServer>> for TokenUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<PokedexServer>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_caller(parts, state).await?))
    }
}

async fn resolve_caller(parts: &Parts, state: &PokedexServer) -> Result<Caller, ApiError> {
    let token = extract_token(&parts.headers)
        .ok_or_else(|| ApiError::unauthorized(MSG_MISSING_TOKEN))?;
    let user_id = state.auth.tokens().verify(token)?;

    let mut conn = state.db.pool().acquire().await?;
    let caller = Caller::load(&mut conn, user_id).await?;
    tracing::debug!(user_id, admin = caller.is_admin(), "Caller resolved");
    Ok(caller)
}
