//! External creature catalog: HTTP client and the per-user listing gateway.

pub mod client;
pub mod gateway;
pub mod types;

pub use client::{CatalogError, CatalogSource, PokeApiClient};
pub use gateway::{CatalogGateway, CatalogQuery};
pub use types::CatalogItem;
