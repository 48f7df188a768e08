//! `/usuarios/*` handlers.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use std::sync::Arc;

use crate::api::json::JsonBody;
use crate::api::middleware::AuthUser;
use crate::api::server::PokedexServer;
use crate::api::types::{MessageResponse, UserEnvelope};
use crate::auth::service::MSG_USER_NOT_FOUND;
use crate::auth::types::{UpdateUserRequest, UpdatedUser, UserDetails, UserView};
use crate::core::{ApiError, ApiResult};

pub const MSG_USER_UPDATED: &str = "Usuário atualizado com sucesso";
pub const MSG_USER_DELETED: &str = "Usuário deletado com sucesso";

/// Non-numeric ids address no user.
fn user_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::not_found(MSG_USER_NOT_FOUND))
}

pub async fn list_users(
    State(state): State<Arc<PokedexServer>>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<Vec<UserDetails>>> {
    Ok(Json(state.users.list_users(&caller).await?))
}

pub async fn get_user(
    State(state): State<Arc<PokedexServer>>,
    AuthUser(caller): AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<UserView>> {
    let id = user_id(path)?;
    Ok(Json(state.users.get_user(&caller, id).await?))
}

pub async fn update_user(
    State(state): State<Arc<PokedexServer>>,
    AuthUser(caller): AuthUser,
    path: Result<Path<i64>, PathRejection>,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> ApiResult<Json<UserEnvelope<UpdatedUser>>> {
    let id = user_id(path)?;
    let usuario = state.users.update_user(&caller, id, req).await?;
    Ok(Json(UserEnvelope {
        msg: MSG_USER_UPDATED.to_string(),
        usuario,
    }))
}

pub async fn delete_user(
    State(state): State<Arc<PokedexServer>>,
    AuthUser(caller): AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let id = user_id(path)?;
    state.users.delete_user(&caller, id).await?;
    Ok(Json(MessageResponse::new(MSG_USER_DELETED)))
}
