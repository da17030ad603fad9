//! Argon2 password verification for protected links.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::AppError;

/// Checks `password` against a stored Argon2 PHC string.
///
/// CPU-bound; call through [`verify_password_blocking`] on async paths.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the stored hash is not a valid PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        tracing::error!("Stored password hash is malformed: {}", e);
        AppError::internal("Stored password hash is malformed")
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Runs [`verify_password`] on the blocking thread pool.
///
/// # Errors
///
/// Returns [`AppError::Internal`] on a malformed hash or a failed blocking task.
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::internal(format!("Password check task failed: {}", e)))?
}

/// Hashes `password` into an Argon2id PHC string using the given salt bytes.
///
/// Link passwords are set by the owner-facing CRUD service; this exists for
/// seeding and tooling.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the salt is unusable.
pub fn hash_password(password: &str, salt: &[u8]) -> Result<String, AppError> {
    let salt = SaltString::encode_b64(salt)
        .map_err(|e| AppError::internal(format!("Invalid salt: {}", e)))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("Password hashing failed: {}", e)))
}

/// Returns true if the string looks like an Argon2 PHC hash.
pub fn is_argon2_hash(value: &str) -> bool {
    value.starts_with("$argon2")
}
