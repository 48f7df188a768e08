//! Response envelopes shared by the handlers.

use serde::Serialize;

/// `{"msg": ..}`
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// `{"msg": .., "usuario": ..}`
#[derive(Debug, Clone, Serialize)]
pub struct UserEnvelope<T> {
    pub msg: String,
    pub usuario: T,
}
