use argon2::{
    password_hash::{
        rand_core::OsRng,
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, Error as Argon2Error
    },
    Argon2, Algorithm, Params, Version
};

use crate::errors::PasswordError;
use crate::settings::AppConfig;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PasswordParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        PasswordParams {
            memory_kib: 15_000,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl From<&AppConfig> for PasswordParams {
    fn from(config: &AppConfig) -> Self {
        PasswordParams {
            memory_kib: config.password_memory_kib,
            iterations: config.password_iterations,
            ..PasswordParams::default()
        }
    }
}

pub fn hash_password(password: &str, params: &PasswordParams) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(params.memory_kib, params.iterations, params.parallelism, None)
            .map_err(|e| PasswordError::InvalidParameters(e.to_string()))?
    );

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingError(e.to_string()))
        .map(|hash| hash.to_string())
}

/// Cost parameters are read from the PHC string, so hashes made with older
/// settings still verify.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hashed) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Stored password hash is unreadable: {}", e);
            return false;
        }
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => true,
        Err(Argon2Error::Password) => false,
        Err(e) => {
            tracing::error!("Password verification error: {}", e);
            false
        }
    }
}
