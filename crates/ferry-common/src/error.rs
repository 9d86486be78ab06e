//! Error types shared across Ferry crates

use thiserror::Error;

/// Result type alias for Ferry operations
pub type Result<T> = std::result::Result<T, FerryError>;

/// Main error type for shared Ferry utilities
#[derive(Error, Debug)]
pub enum FerryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid record key: {0}")]
    InvalidKey(String),
}
