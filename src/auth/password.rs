//! Password hashing and verification
//!
//! bcrypt with the default cost. Hashing and matching are CPU-intensive,
//! so both run on the blocking thread pool to keep the async runtime free.

use super::AuthError;
use bcrypt::DEFAULT_COST;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum accepted password length (bcrypt truncates at 72 bytes)
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Hash a password with bcrypt.
///
/// `cost` defaults to the bcrypt default; tests pass a low cost to stay fast.
pub async fn hash_password(password: &str, cost: Option<u32>) -> Result<String, AuthError> {
    let password = password.to_string();
    let cost = cost.unwrap_or(DEFAULT_COST);

    tokio::task::spawn_blocking(move || {
        bcrypt::hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(format!("task join error: {e}")))?
}

/// Match a plaintext password against a stored bcrypt hash.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let hash = hash.to_string();

    tokio::task::spawn_blocking(move || {
        bcrypt::verify(password, &hash).map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(format!("task join error: {e}")))?
}

/// Validate password strength at registration time.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}
