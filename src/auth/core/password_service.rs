//! Password hashing (Argon2id, PHC string format)

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand_core::OsRng;
use tracing::warn;

use crate::config::PasswordHashConfig;
use crate::core::errors::ApiError;
use crate::core::validation::validate_password_length;

/// Hashes and verifies account passwords.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    /// Verified against when a login does not exist, so unknown and known
    /// logins cost the same.
    dummy_hash: String,
}

impl PasswordService {
    pub fn new(config: &PasswordHashConfig) -> Result<Self, ApiError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| ApiError::internal(format!("invalid argon2 parameters: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2
            .hash_password(b"placeholder-password", &salt)
            .map_err(|e| ApiError::internal(format!("password hashing failed: {}", e)))?
            .to_string();

        Ok(Self { argon2, dummy_hash })
    }

    /// Salted one-way hash of `password`.
    pub fn hash_password(&self, password: &str) -> Result<String, ApiError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ApiError::internal(format!("password hashing failed: {}", e)))?
            .to_string();
        Ok(hash)
    }

    /// Parameters are read from the stored hash, so hashes made with older
    /// cost settings keep verifying.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored password hash could not be parsed: {}", e);
                return false;
            }
        };
        self.argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    }

    /// Password must be between 6 and 200 characters.
    pub fn validate_length(&self, password: &str) -> Result<(), ApiError> {
        validate_password_length(password)
    }

    /// Burns one verification for a login that does not exist.
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.verify_password(password, &self.dummy_hash);
    }
}

#[cfg(test)]
pub(crate) fn fast_config() -> PasswordHashConfig {
    PasswordHashConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let service = PasswordService::new(&fast_config()).unwrap();

        let hash = service.hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("secret1"));

        assert!(service.verify_password("secret1", &hash));
        assert!(!service.verify_password("secret2", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let service = PasswordService::new(&fast_config()).unwrap();
        let a = service.hash_password("secret1").unwrap();
        let b = service.hash_password("secret1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        let service = PasswordService::new(&fast_config()).unwrap();
        assert!(!service.verify_password("secret1", "not-a-phc-string"));
    }

    #[test]
    fn test_hash_from_other_params_still_verifies() {
        let strong = PasswordService::new(&PasswordHashConfig {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        let hash = strong.hash_password("secret1").unwrap();

        let fast = PasswordService::new(&fast_config()).unwrap();
        assert!(fast.verify_password("secret1", &hash));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let config = PasswordHashConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        };
        assert!(PasswordService::new(&config).is_err());
    }
}
