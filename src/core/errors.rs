//! Error taxonomy shared by every service and handler.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Message returned for every internal failure. Details only go to the log.
pub const INTERNAL_MESSAGE: &str = "Erro interno do servidor";

/// Application error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Malformed, oversized or missing input
    #[error("{0}")]
    BadRequest(String),

    /// Bad credentials or a missing/invalid/expired token
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate login or email
    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for clients
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "server_error",
        }
    }

    /// Message safe to show to the caller
    pub fn user_message(&self) -> &str {
        match self {
            Self::BadRequest(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg) => msg,
            Self::Internal(_) => INTERNAL_MESSAGE,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(format!("database: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Internal(format!("token encoding: {}", err))
    }
}

/// Renders `{"msg": .., "code": ..}` so the web client can show `msg` directly.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            tracing::error!("request failed: {}", detail);
        }

        let status = self.status_code();
        let body = Json(json!({
            "msg": self.user_message(),
            "code": self.error_code(),
        }));

        (status, body).into_response()
    }
}

/// True when the database rejected a write because of a UNIQUE constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

/// True when a write lost a race with a concurrent writer: a UNIQUE
/// violation, or SQLite refusing the write lock (`SQLITE_BUSY`/`SQLITE_LOCKED`
/// and their extended codes).
pub fn is_write_conflict(err: &sqlx::Error) -> bool {
    if is_unique_violation(err) {
        return true;
    }
    match err.as_database_error().and_then(|db| db.code()) {
        Some(code) => matches!(code.as_ref(), "5" | "6" | "261" | "262" | "517"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::internal("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_message_is_generic() {
        let err = ApiError::internal("disk I/O error at /var/lib/pokeapi.db");
        assert_eq!(err.user_message(), INTERNAL_MESSAGE);
        assert_eq!(err.error_code(), "server_error");
    }

    #[test]
    fn test_user_message_passthrough() {
        let err = ApiError::bad_request("Equipe já possui 6 Pokémon!");
        assert_eq!(err.user_message(), "Equipe já possui 6 Pokémon!");
    }

    #[test]
    fn test_row_not_found_maps_to_internal() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::Internal(_)));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_write_conflict(&sqlx::Error::RowNotFound));
    }
}
