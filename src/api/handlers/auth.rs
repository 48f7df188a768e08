//! `/auth/*` handlers.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::json::JsonBody;
use crate::api::middleware::{AuthUser, TokenUser};
use crate::api::server::PokedexServer;
use crate::api::types::{MessageResponse, UserEnvelope};
use crate::auth::types::{
    AdminResetPasswordRequest, ChangePasswordRequest, LoginRequest, LoginResponse,
    RegisterRequest, UserSummary,
};
use crate::core::ApiResult;

pub const MSG_REGISTERED: &str = "Usuário registrado com sucesso!";
pub const MSG_PASSWORD_CHANGED: &str = "Senha alterada com sucesso";
pub const MSG_PASSWORD_RESET: &str = "Senha redefinida com sucesso";

/// `POST /auth/register`
pub async fn register(
    State(state): State<Arc<PokedexServer>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserEnvelope<UserSummary>>)> {
    let usuario = state.auth.register(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            msg: MSG_REGISTERED.to_string(),
            usuario,
        }),
    ))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<Arc<PokedexServer>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    Ok(Json(state.auth.login(req).await?))
}

/// `POST /auth/change-password`. A token of a deleted account gets 404.
pub async fn change_password(
    State(state): State<Arc<PokedexServer>>,
    TokenUser(caller): TokenUser,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state.auth.change_password(&caller, req).await?;
    Ok(Json(MessageResponse::new(MSG_PASSWORD_CHANGED)))
}

/// `POST /auth/admin/reset-password`
pub async fn admin_reset_password(
    State(state): State<Arc<PokedexServer>>,
    AuthUser(caller): AuthUser,
    JsonBody(req): JsonBody<AdminResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state.auth.admin_reset_password(&caller, req).await?;
    Ok(Json(MessageResponse::new(MSG_PASSWORD_RESET)))
}
