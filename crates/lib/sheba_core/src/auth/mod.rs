//! Authentication and authorization logic.
//!
//! Provides password hashing, JWT management, phone validation, and the
//! database queries shared by the HTTP layer.

pub mod jwt;
pub mod password;
pub mod phone;
pub mod queries;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    CredentialError,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
