//! `GET /pokemon`

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::middleware::AuthUser;
use crate::api::server::PokedexServer;
use crate::catalog::{CatalogItem, CatalogQuery};
use crate::core::ApiResult;

/// Catalog page with the caller's favorite/team flags.
pub async fn list_pokemon(
    State(state): State<Arc<PokedexServer>>,
    AuthUser(caller): AuthUser,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<Vec<CatalogItem>>> {
    let items = state.catalog.list_catalog(caller.id, &query).await?;
    Ok(Json(items))
}
