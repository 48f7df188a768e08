//! Request extractors.

pub mod extract_user;

pub use extract_user::{extract_token, AuthUser, TokenUser};
