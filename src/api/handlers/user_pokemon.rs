//! `/user-pokemon/*` handlers: favorites and battle team.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::json::JsonBody;
use crate::api::middleware::AuthUser;
use crate::api::server::PokedexServer;
use crate::api::types::MessageResponse;
use crate::collection::EntryRequest;
use crate::core::ApiResult;
use crate::storage::CollectionView;

pub const MSG_FAVORITE_ADDED: &str = "Favorito adicionado!";
pub const MSG_FAVORITE_REMOVED: &str = "Favorito removido!";
pub const MSG_TEAM_ADDED: &str = "Pokémon adicionado à equipe!";
pub const MSG_TEAM_REMOVED: &str = "Pokémon removido da equipe!";

pub async fn list_favorites(
    State(state): State<Arc<PokedexServer>>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<Vec<CollectionView>>> {
    Ok(Json(state.collection.list_favorites(caller.id).await?))
}

pub async fn add_favorite(
    State(state): State<Arc<PokedexServer>>,
    AuthUser(caller): AuthUser,
    JsonBody(req): JsonBody<EntryRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    state.collection.add_favorite(caller.id, req).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::new(MSG_FAVORITE_ADDED))))
}

pub async fn remove_favorite(
    State(state): State<Arc<PokedexServer>>,
    AuthUser(caller): AuthUser,
    Path(codigo): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.collection.remove_favorite(caller.id, &codigo).await?;
    Ok(Json(MessageResponse::new(MSG_FAVORITE_REMOVED)))
}

pub async fn list_team(
    State(state): State<Arc<PokedexServer>>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<Vec<CollectionView>>> {
    Ok(Json(state.collection.list_team(caller.id).await?))
}

pub async fn add_to_team(
    State(state): State<Arc<PokedexServer>>,
    AuthUser(caller): AuthUser,
    JsonBody(req): JsonBody<EntryRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    state.collection.add_to_team(caller.id, req).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::new(MSG_TEAM_ADDED))))
}

pub async fn remove_from_team(
    State(state): State<Arc<PokedexServer>>,
    AuthUser(caller): AuthUser,
    Path(codigo): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.collection.remove_from_team(caller.id, &codigo).await?;
    Ok(Json(MessageResponse::new(MSG_TEAM_REMOVED)))
}
