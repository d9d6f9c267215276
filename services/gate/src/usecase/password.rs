//! Argon2id password hashing in PHC string format, so parameters and salt
//! travel with the hash. Verification is resistant to timing side channels.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::error::GateError;

pub fn hash_password(password: &str) -> Result<String, GateError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| GateError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// `Ok(false)` for a wrong password; `Err` only for a malformed stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, GateError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| GateError::Internal(anyhow::anyhow!("stored hash unparseable: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(GateError::Internal(anyhow::anyhow!(
            "password verification failed: {e}"
        ))),
    }
}
