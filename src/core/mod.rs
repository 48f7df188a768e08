pub mod errors;
pub mod validation;

pub use errors::ApiError;

/// Result alias used across services and handlers.
pub type ApiResult<T> = Result<T, ApiError>;
