//! Common error types for trackmood

use thiserror::Error;

/// Common result type for trackmood operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared across the trackmood crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization of a value failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
