//! Authentication and session management.
//!
//! Provides password hashing, JWT issuance and verification, the credential
//! store the session manager checks tokens against, and the session manager
//! itself.

pub mod config;
pub mod jwt;
pub mod memory;
pub mod password;
pub mod queries;
pub mod session;
pub mod store;

use thiserror::Error;

/// Authentication errors.
///
/// `Unauthorized` carries no detail. The cause of a token rejection is
/// logged where it happens.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username already taken")]
    DuplicateUsername,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Password hash error: {0}")]
    HashError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
