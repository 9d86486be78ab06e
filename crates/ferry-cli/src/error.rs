//! Error types for Ferry CLI
//!
//! Every message tells the user what went wrong and what to try next.

use ferry_etl::{ConfigError, EtlError, SourceFormatError};
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Required file is missing
    #[error("File not found: '{0}'. Verify the file path exists and you have read permissions.")]
    FileNotFound(String),

    /// Pipeline configuration cannot be used
    #[error("Invalid pipeline configuration: {0}. Run 'ferry check --config <PATH>' for details.")]
    Config(#[from] ConfigError),

    /// Source file cannot be parsed
    #[error("Cannot read source: {0}. Check the file contents or pass --format explicitly.")]
    Source(#[from] SourceFormatError),

    /// Media root is not a directory
    #[error("Media root not found: '{0}'. Pass an existing directory with --media or FERRY_MEDIA_ROOT.")]
    MediaRoot(String),

    /// Store directory could not be read or written
    #[error("Store error: {0}. Check the --output directory permissions and contents.")]
    Store(#[from] EtlError),

    /// Report could not be serialized
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Create a file not found error
    pub fn file_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::FileNotFound(path.as_ref().display().to_string())
    }

    /// Create a media root error
    pub fn media_root(path: impl AsRef<std::path::Path>) -> Self {
        Self::MediaRoot(path.as_ref().display().to_string())
    }
}
