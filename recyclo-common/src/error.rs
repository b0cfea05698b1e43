//! Common error types for Recyclo

use thiserror::Error;

/// Common result type for Recyclo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Recyclo crates
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

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Classifier returned an unusable prediction or could not be reached
    #[error("Classifier error: {0}")]
    Classifier(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
