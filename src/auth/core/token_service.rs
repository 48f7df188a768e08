//! Access token issuing and validation (HS256 JWT)

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::errors::ApiError;

pub const MSG_INVALID_TOKEN: &str = "Token inválido ou expirado";

/// JWT Claims
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User ID, as a decimal string
    sub: String,
    /// Expiry, unix seconds
    exp: u64,
    /// Issued at, unix seconds
    iat: u64,
}

/// A freshly issued access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

/// Issues and validates access tokens.
///
/// The token carries only the user id. Roles are read from the store on every
/// request so a demotion takes effect immediately.
pub struct TokenService {
    /// Kept zeroized on drop
    secret: zeroize::Zeroizing<String>,
    ttl_secs: u64,
}

impl TokenService {
    pub fn new(secret: String, ttl_secs: u64) -> Self {
        Self {
            secret: zeroize::Zeroizing::new(secret),
            ttl_secs,
        }
    }

    pub fn issue(&self, user_id: i64) -> Result<IssuedToken, ApiError> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + self.ttl_secs,
            iat: now,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        debug!("Issued access token");
        Ok(IssuedToken {
            token,
            expires_in: self.ttl_secs,
        })
    }

    /// Returns the user id carried by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<i64, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            debug!("Token rejected: {}", e);
            ApiError::unauthorized(MSG_INVALID_TOKEN)
        })?;

        data.claims
            .sub
            .parse::<i64>()
            .map_err(|_| ApiError::unauthorized(MSG_INVALID_TOKEN))
    }
}
