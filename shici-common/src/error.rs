//! Common error types for the shici services

use thiserror::Error;

/// Common result type for shici operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the corpus, query and account layers
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested entity does not resolve
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid caller input that could not be clamped to a default
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Username already registered
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Uniqueness violation on a contact field (email, phone)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unknown username or wrong password. Both cases share this variant.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Account exists but is not active
    #[error("Account is disabled")]
    Disabled,

    /// Credential failed signature, format or expiry validation
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Credential is valid but not yet inside the refresh window
    #[error("Token is not near expiry; refresh rejected")]
    RefreshTooEarly,

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures of the backing store rather than the request
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Io(_))
    }
}
