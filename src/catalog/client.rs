//! HTTP client for the external creature catalog (PokeAPI-compatible).

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::types::{Generation, ItemDetail, ResourcePage};
use crate::config::CatalogConfig;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Transport(String),

    #[error("catalog returned status {0}")]
    Status(u16),

    #[error("catalog response could not be decoded: {0}")]
    Decode(String),

    #[error("invalid catalog url: {0}")]
    Url(String),
}

/// Read-only access to the external catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// One page of the item listing.
    async fn list_page(&self, limit: u32, offset: u32) -> Result<ResourcePage, CatalogError>;

    /// Species belonging to generation `number`.
    async fn generation(&self, number: u8) -> Result<Generation, CatalogError>;

    /// Detail of one item, by its code (slug).
    async fn item_detail(&self, code: &str) -> Result<ItemDetail, CatalogError>;
}

pub struct PokeApiClient {
    client: Client,
    base_url: Url,
}

impl PokeApiClient {
    /// No request timeout unless `timeout_secs` is configured.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let base_url =
            Url::parse(&config.base_url).map_err(|e| CatalogError::Url(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::Url(config.base_url.clone()));
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::Url(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        debug!(url = %url, "Catalog request");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status().as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))
    }
}

#[async_trait]
impl CatalogSource for PokeApiClient {
    async fn list_page(&self, limit: u32, offset: u32) -> Result<ResourcePage, CatalogError> {
        let url = self.endpoint(&["pokemon"])?;
        self.get_json(url, &[("limit", limit.to_string()), ("offset", offset.to_string())])
            .await
    }

    async fn generation(&self, number: u8) -> Result<Generation, CatalogError> {
        let url = self.endpoint(&["generation", &number.to_string()])?;
        self.get_json(url, &[]).await
    }

    async fn item_detail(&self, code: &str) -> Result<ItemDetail, CatalogError> {
        let url = self.endpoint(&["pokemon", code])?;
        self.get_json(url, &[]).await
    }
}
