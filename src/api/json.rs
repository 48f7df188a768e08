//! JSON body extractor with the API's own rejection format.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::core::validation::{MSG_INVALID_DATA, MSG_TOO_LONG};
use crate::core::ApiError;

/// Like [`Json`], but a body that cannot be decoded into `T` is a
/// `400 {"msg": "Dados inválidos"}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(map_rejection(rejection)),
        }
    }
}

fn map_rejection(rejection: JsonRejection) -> ApiError {
    debug!("JSON body rejected: {}", rejection.body_text());
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::bad_request(MSG_TOO_LONG);
    }
    ApiError::bad_request(MSG_INVALID_DATA)
}
