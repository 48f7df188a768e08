//! User-owned favorites and battle team, plus the shared type cache.

pub mod service;
pub mod type_cache;

pub use service::{CollectionService, EntryRequest};
pub use type_cache::TypeCache;
