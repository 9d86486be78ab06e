//! Configuration management for Ferry CLI
//!
//! Paths come from the environment (after `.env`), then from command-line
//! flags, which take precedence.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// CLI Configuration Constants
// ============================================================================

/// Pipeline configuration used when neither flag nor environment names one
pub const DEFAULT_CONFIG_FILE: &str = "ferry.toml";

/// Store directory used when neither flag nor environment names one
pub const DEFAULT_OUTPUT_DIR: &str = "ferry-data";

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Pipeline configuration file
    pub pipeline: PathBuf,

    /// Media root for file fields
    pub media_root: Option<PathBuf>,

    /// Directory holding the store's JSON Lines files
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipeline: PathBuf::from(DEFAULT_CONFIG_FILE),
            media_root: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl Config {
    /// Load config from environment variables
    ///
    /// - `FERRY_CONFIG`: pipeline configuration file
    /// - `FERRY_MEDIA_ROOT`: media root directory
    /// - `FERRY_OUTPUT_DIR`: store directory
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(path) = std::env::var("FERRY_CONFIG") {
            config.pipeline = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("FERRY_MEDIA_ROOT") {
            config.media_root = Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("FERRY_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(path);
        }

        config
    }

    /// Apply command-line flags on top
    pub fn with_overrides(
        mut self,
        pipeline: Option<PathBuf>,
        media_root: Option<PathBuf>,
        output_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(path) = pipeline {
            self.pipeline = path;
        }
        if media_root.is_some() {
            self.media_root = media_root;
        }
        if let Some(path) = output_dir {
            self.output_dir = path;
        }
        self
    }
}
