//! Error types for the catalog store.

use thiserror::Error;

/// Catalog operation result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Catalog store errors.
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error (connection, query, etc.)
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// IO error (file system operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid state transition
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl DbError {
    /// Create an invalid state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}
