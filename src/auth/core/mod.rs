//! Credential primitives: password hashing and access tokens.

pub mod password_service;
pub mod token_service;

pub use password_service::PasswordService;
pub use token_service::{IssuedToken, TokenService, MSG_INVALID_TOKEN};
