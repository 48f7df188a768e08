//! Registration, login and password flows.

use tracing::{info, warn};

use crate::auth::access::Caller;
use crate::auth::core::{PasswordService, TokenService};
use crate::auth::types::{
    AdminResetPasswordRequest, ChangePasswordRequest, LoginRequest, LoginResponse,
    RegisterRequest, UserProfile, UserSummary,
};
use crate::core::errors::is_unique_violation;
use crate::core::validation::{
    self, ensure_max_len, required, MAX_EMAIL_LEN, MAX_LOGIN_LEN, MAX_NAME_LEN, MAX_PASSWORD_LEN,
    MSG_INVALID_DATA, MSG_MISSING_FIELDS, MSG_TOO_LONG,
};
use crate::core::{ApiError, ApiResult};
use crate::storage::{Database, NewUser, Role, UserRepository};

pub const MSG_LOGIN_TAKEN: &str = "Login já existe";
pub const MSG_EMAIL_TAKEN: &str = "Email já cadastrado";
pub const MSG_BAD_CREDENTIALS: &str = "Credenciais inválidas";
pub const MSG_WRONG_CURRENT_PASSWORD: &str = "Senha atual incorreta";
pub const MSG_SAME_PASSWORD: &str = "A nova senha deve ser diferente da atual";
pub const MSG_USER_NOT_FOUND: &str = "Usuário não encontrado";
pub const MSG_RESET_OWN_PASSWORD: &str =
    "Use a rota de alteração de senha para alterar sua própria senha";

/// Account credential flows over the `users` table.
pub struct AuthService {
    db: Database,
    passwords: PasswordService,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(db: Database, passwords: PasswordService, tokens: TokenService) -> Self {
        Self {
            db,
            passwords,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Creates a `user` account. The role is never taken from the request.
    pub async fn register(&self, req: RegisterRequest) -> ApiResult<UserSummary> {
        let name = required_text(req.nome)?;
        let login = required_text(req.login)?;
        let email = required_text(req.email)?;
        let password = required(req.senha, MSG_MISSING_FIELDS)?;

        ensure_max_len(&name, MAX_NAME_LEN, MSG_TOO_LONG)?;
        ensure_max_len(&login, MAX_LOGIN_LEN, MSG_TOO_LONG)?;
        ensure_max_len(&email, MAX_EMAIL_LEN, MSG_TOO_LONG)?;
        self.passwords.validate_length(&password)?;
        validation::validate_email(&email)?;

        let login = validation::normalize_identifier(&login);
        let email = validation::normalize_identifier(&email);

        let mut tx = self.db.pool().begin().await?;

        if UserRepository::find_by_login(&mut tx, &login).await?.is_some() {
            return Err(ApiError::conflict(MSG_LOGIN_TAKEN));
        }
        if UserRepository::find_by_email(&mut tx, &email).await?.is_some() {
            return Err(ApiError::conflict(MSG_EMAIL_TAKEN));
        }

        let password_hash = self.passwords.hash_password(&password)?;
        let new_user = NewUser {
            name,
            login,
            email,
            password_hash,
            role: Role::User,
        };

        // A concurrent registration can pass the checks above; the UNIQUE
        // constraints decide.
        let id = UserRepository::insert(&mut tx, &new_user)
            .await
            .map_err(unique_to_conflict)?;
        tx.commit().await?;

        info!(user_id = id, login = %new_user.login, "User registered");
        Ok(UserSummary {
            id,
            nome: new_user.name,
            login: new_user.login,
            email: new_user.email,
        })
    }

    pub async fn login(&self, req: LoginRequest) -> ApiResult<LoginResponse> {
        let login = required(req.login, MSG_MISSING_FIELDS)?;
        let password = required(req.senha, MSG_MISSING_FIELDS)?;
        ensure_max_len(&login, MAX_LOGIN_LEN, MSG_INVALID_DATA)?;
        ensure_max_len(&password, MAX_PASSWORD_LEN, MSG_INVALID_DATA)?;

        let mut conn = self.db.pool().acquire().await?;
        let user = match UserRepository::find_by_login(&mut conn, &login).await? {
            Some(user) => user,
            None => {
                self.passwords.verify_dummy(&password);
                warn!(login = %login, "Login failed: unknown login");
                return Err(ApiError::unauthorized(MSG_BAD_CREDENTIALS));
            }
        };

        if !self.passwords.verify_password(&password, &user.password_hash) {
            warn!(login = %login, "Login failed: wrong password");
            return Err(ApiError::unauthorized(MSG_BAD_CREDENTIALS));
        }

        let issued = self.tokens.issue(user.id)?;
        info!(user_id = user.id, "User logged in");

        Ok(LoginResponse {
            access_token: issued.token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            usuario: UserProfile::from(&user),
        })
    }

    pub async fn change_password(&self, caller: &Caller, req: ChangePasswordRequest) -> ApiResult<()> {
        let current = required(req.senha_atual, MSG_MISSING_FIELDS)?;
        let new_password = required(req.nova_senha, MSG_MISSING_FIELDS)?;

        let mut tx = self.db.pool().begin().await?;
        let user = UserRepository::find_by_id(&mut tx, caller.id)
            .await?
            .ok_or_else(|| ApiError::not_found(MSG_USER_NOT_FOUND))?;

        if !self.passwords.verify_password(&current, &user.password_hash) {
            warn!(user_id = caller.id, "Password change rejected: wrong current password");
            return Err(ApiError::bad_request(MSG_WRONG_CURRENT_PASSWORD));
        }
        if current == new_password {
            return Err(ApiError::bad_request(MSG_SAME_PASSWORD));
        }
        self.passwords.validate_length(&new_password)?;

        let hash = self.passwords.hash_password(&new_password)?;
        UserRepository::update_password(&mut tx, user.id, &hash).await?;
        tx.commit().await?;

        info!(user_id = user.id, "Password changed");
        Ok(())
    }

    /// Overwrites another user's password. Admins change their own through
    /// [`AuthService::change_password`].
    pub async fn admin_reset_password(
        &self,
        caller: &Caller,
        req: AdminResetPasswordRequest,
    ) -> ApiResult<()> {
        caller.require_admin()?;

        let target_id = required(req.user_id, MSG_MISSING_FIELDS)?;
        let new_password = required(req.nova_senha, MSG_MISSING_FIELDS)?;

        if target_id == caller.id {
            return Err(ApiError::bad_request(MSG_RESET_OWN_PASSWORD));
        }
        self.passwords.validate_length(&new_password)?;

        let mut tx = self.db.pool().begin().await?;
        if UserRepository::find_by_id(&mut tx, target_id).await?.is_none() {
            return Err(ApiError::not_found(MSG_USER_NOT_FOUND));
        }

        let hash = self.passwords.hash_password(&new_password)?;
        UserRepository::update_password(&mut tx, target_id, &hash).await?;
        tx.commit().await?;

        info!(admin_id = caller.id, user_id = target_id, "Password reset by admin");
        Ok(())
    }
}

/// A present but blank field counts as missing. Returns the trimmed value.
pub(crate) fn required_text(value: Option<String>) -> ApiResult<String> {
    let value = required(value, MSG_MISSING_FIELDS)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request(MSG_MISSING_FIELDS));
    }
    Ok(trimmed.to_string())
}

/// Maps a UNIQUE violation on `users` to the matching conflict message.
pub(crate) fn unique_to_conflict(err: sqlx::Error) -> ApiError {
    if is_unique_violation(&err) {
        let detail = err.to_string();
        if detail.contains("users.login") {
            return ApiError::conflict(MSG_LOGIN_TAKEN);
        }
        return ApiError::conflict(MSG_EMAIL_TAKEN);
    }
    ApiError::from(err)
}
