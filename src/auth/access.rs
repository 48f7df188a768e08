//! Caller resolution and role gates.
//!
//! The token only says who the caller is. What the caller may do is read from
//! the `users` table on every request.

use sqlx::SqliteConnection;
use tracing::warn;

use crate::auth::core::MSG_INVALID_TOKEN;
use crate::core::{ApiError, ApiResult};
use crate::storage::{Role, UserRepository};

pub const MSG_ADMIN_ONLY: &str = "Acesso negado. Apenas administradores.";
pub const MSG_ACCESS_DENIED: &str = "Acesso negado.";

/// The authenticated caller of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: i64,
    /// `None` when the token is valid but the account no longer exists.
    pub role: Option<Role>,
}

impl Caller {
    /// Re-reads the caller's current role.
    pub async fn load(conn: &mut SqliteConnection, id: i64) -> ApiResult<Self> {
        let role = UserRepository::find_by_id(conn, id).await?.map(|u| u.role);
        if role.is_none() {
            warn!(user_id = id, "Token refers to a missing account");
        }
        Ok(Self { id, role })
    }

    /// Fails with 401 when the token outlived its account.
    pub fn require_account(&self) -> ApiResult<()> {
        if self.role.is_none() {
            return Err(ApiError::unauthorized(MSG_INVALID_TOKEN));
        }
        Ok(())
    }

    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }

    pub fn require_admin(&self) -> ApiResult<()> {
        if !self.is_admin() {
            return Err(ApiError::forbidden(MSG_ADMIN_ONLY));
        }
        Ok(())
    }

    /// Passes when acting on one's own resource, or when admin.
    pub fn require_self_or_admin(&self, target_id: i64) -> ApiResult<()> {
        if self.id != target_id && !self.is_admin() {
            return Err(ApiError::forbidden(MSG_ACCESS_DENIED));
        }
        Ok(())
    }
}
