//! Common error types for MediaVault

use thiserror::Error;

/// Common result type for MediaVault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the MediaVault backend
#[derive(Error, Debug)]
pub enum Error {
    /// Submitted PIN matched neither the admin PIN nor an active guest
    #[error("Invalid credential")]
    InvalidCredential,

    /// Token was malformed, had a bad signature, or is past its expiry
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Authenticated principal lacks the required role
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Uniqueness constraint rejected the operation (duplicate email, filename)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Classify a database error, surfacing uniqueness violations as Conflict.
    ///
    /// SQLite reports UNIQUE constraint failures as database errors; callers
    /// inserting into constrained tables use this to keep the duplicate-claim
    /// contract (the constraint is the guard, not a pre-check).
    pub fn from_db_unique(err: sqlx::Error, what: &str) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return Error::Conflict(what.to_string());
            }
        }
        Error::Database(err)
    }
}
