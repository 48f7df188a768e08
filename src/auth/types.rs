//! Request and response shapes for the auth and account endpoints.
//!
//! Field names follow the JSON contract of the web client (`nome`, `senha`, ...).
//! Request fields are optional so a missing field can be reported as such
//! instead of as a generic decoding failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{Role, UserRecord};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub nome: Option<String>,
    pub login: Option<String>,
    pub email: Option<String>,
    pub senha: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub login: Option<String>,
    pub senha: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub senha_atual: Option<String>,
    pub nova_senha: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminResetPasswordRequest {
    pub user_id: Option<i64>,
    pub nova_senha: Option<String>,
}

/// Profile update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub nome: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Identity without role or timestamps: registration result and the view a
/// non-admin gets of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub nome: String,
    pub login: String,
    pub email: String,
}

/// Identity plus role, returned on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub nome: String,
    pub login: String,
    pub email: String,
    pub role: Role,
}

/// Everything but the credential hash. Admin-only view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub id: i64,
    pub nome: String,
    pub login: String,
    pub email: String,
    pub role: Role,
    pub dt_inclusao: DateTime<Utc>,
    pub dt_alteracao: DateTime<Utc>,
}

/// Result of a profile update. `role` is only filled for admin callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatedUser {
    pub id: i64,
    pub nome: String,
    pub login: String,
    pub email: String,
    pub role: Option<Role>,
}

/// Successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub usuario: UserProfile,
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            nome: user.name.clone(),
            login: user.login.clone(),
            email: user.email.clone(),
        }
    }
}

impl From<&UserRecord> for UserProfile {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            nome: user.name.clone(),
            login: user.login.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

impl From<&UserRecord> for UserDetails {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            nome: user.name.clone(),
            login: user.login.clone(),
            email: user.email.clone(),
            role: user.role,
            dt_inclusao: user.created_at,
            dt_alteracao: user.updated_at,
        }
    }
}

/// A profile as seen by a given caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UserView {
    Full(UserDetails),
    Reduced(UserSummary),
}
