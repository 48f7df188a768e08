//! Input validation shared by the auth, account and collection flows.
//!
//! Lengths are counted in characters, not bytes, so accented names such as
//! "Pokémon" are measured the way a user types them.

use crate::core::errors::ApiError;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_LOGIN_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 100;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 200;

pub const MAX_CODE_LEN: usize = 50;
pub const MAX_ITEM_NAME_LEN: usize = 100;
pub const MAX_IMAGE_URL_LEN: usize = 200;

pub const MSG_MISSING_FIELDS: &str = "Campos obrigatórios faltando";
pub const MSG_INVALID_DATA: &str = "Dados inválidos";
pub const MSG_TOO_LONG: &str = "Dados muito longos";
pub const MSG_PASSWORD_RANGE: &str = "Senha deve ter entre 6 e 200 caracteres";
pub const MSG_INVALID_EMAIL: &str = "Email inválido";

pub fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Unwraps a required field, failing with `msg` when it is absent.
pub fn required<T>(value: Option<T>, msg: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::bad_request(msg))
}

pub fn ensure_max_len(value: &str, max: usize, msg: &str) -> Result<(), ApiError> {
    if char_len(value) > max {
        return Err(ApiError::bad_request(msg));
    }
    Ok(())
}

/// Password must be between 6 and 200 characters.
pub fn validate_password_length(password: &str) -> Result<(), ApiError> {
    let len = char_len(password);
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(ApiError::bad_request(MSG_PASSWORD_RANGE));
    }
    Ok(())
}

/// Minimal email check: an `@` and a `.` somewhere in the address.
pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if !email.contains('@') || !email.contains('.') {
        return Err(ApiError::bad_request(MSG_INVALID_EMAIL));
    }
    Ok(())
}

/// Logins and emails are stored and compared lowercase.
pub fn normalize_identifier(value: &str) -> String {
    value.trim().to_lowercase()
}
