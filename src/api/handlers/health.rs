//! Liveness root.

pub const ROOT_MESSAGE: &str = "API PokeAPI está funcionando!";

/// `GET /`
pub async fn root() -> &'static str {
    ROOT_MESSAGE
}
