// src/lib.rs

pub mod api;
pub mod auth;
pub mod catalog;
pub mod collection;
pub mod config;
pub mod core;
pub mod storage;
pub mod users;

pub use api::PokedexServer;
pub use config::AppConfig;
pub use core::{ApiError, ApiResult};
