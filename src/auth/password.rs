//! Salted one-way password hashing.
//!
//! Hashes are stored in PHC string format, so the parameters used to
//! produce a hash travel with it.

use std::sync::LazyLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::AppError;

const UNKNOWN_ACCOUNT_PASSWORD: &str = "devconnect-unknown-account";

/// Stand-in hash checked when a login names no account, built with the
/// same parameters as stored hashes.
static UNKNOWN_ACCOUNT_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password(UNKNOWN_ACCOUNT_PASSWORD).ok());

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Returns `true` when `password` matches the stored hash.
///
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash could not be parsed: {e}");
            false
        }
    }
}

/// Run hashing on the blocking pool; it is deliberately slow.
pub async fn hash_password_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {e}")))?
}

pub async fn verify_password_blocking(password: String, password_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Verification task failed: {e}")))
}

/// Check a login password against the account's stored hash.
///
/// With no account the password is still run through a full argon2
/// verification against a stand-in hash, and the result is always `false`.
pub async fn verify_account_password(
    password: String,
    stored_hash: Option<String>,
) -> Result<bool, AppError> {
    match stored_hash {
        Some(hash) => verify_password_blocking(password, hash).await,
        None => tokio::task::spawn_blocking(move || {
            if let Some(hash) = UNKNOWN_ACCOUNT_HASH.as_deref() {
                verify_password(&password, hash);
            }
            false
        })
        .await
        .map_err(|e| AppError::Internal(format!("Verification task failed: {e}"))),
    }
}
