use thiserror::Error;

use crate::validation::FieldError;

/// Application-wide error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Missing, malformed, tampered or expired session token.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Authenticated, but the resource belongs to someone else.
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User already exists")]
    DuplicateUser,

    /// Same message whether the email is unknown or the password is wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Post already liked")]
    AlreadyLiked,

    #[error("Post has not yet been liked")]
    NotLiked,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Helper conversion from anyhow::Error
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for AppError {
    fn from(err: bson::ser::Error) -> Self {
        AppError::Internal(format!("Failed to encode document: {err}"))
    }
}
