// src/api/mod.rs

pub mod handlers;
pub mod json;           // JSON body extractor
pub mod middleware;     // Caller extraction
pub mod server;
pub mod server_config;  // Server limits
pub mod types;

pub use server::PokedexServer;
