//! HTTP handlers, one module per route group.

pub mod auth;
pub mod health;
pub mod pokemon;
pub mod user_pokemon;
pub mod users;

pub use health::root;
