//! Ferry CLI Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Command-line interface for running Ferry imports.
//!
//! - **Import**: load a source file into the configured store (`ferry import`)
//! - **Check**: validate a pipeline configuration (`ferry check`)

pub mod commands;
pub mod config;
pub mod error;
pub mod render;

// Re-export commonly used types
pub use config::Config;
pub use error::{CliError, Result};

use clap::{Parser, Subcommand, ValueEnum};
use ferry_etl::extract::SourceFormat;
use std::path::PathBuf;

/// Ferry - batch import of tagged records across schema generations
#[derive(Parser, Debug)]
#[command(name = "ferry")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import records from a source file
    Import {
        /// Source file (dumpdata JSON or JSON Lines)
        source: PathBuf,

        /// Pipeline configuration (defaults to $FERRY_CONFIG or ferry.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Media root for file fields (defaults to $FERRY_MEDIA_ROOT)
        #[arg(short, long)]
        media: Option<PathBuf>,

        /// Store directory (defaults to $FERRY_OUTPUT_DIR or ferry-data)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Source format: auto, dumpdata or jsonl
        #[arg(short, long)]
        format: Option<SourceFormat>,

        /// Delete existing records of every configured entity first
        #[arg(long)]
        purge: bool,

        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        report: ReportFormat,
    },

    /// Validate a pipeline configuration
    Check {
        /// Pipeline configuration (defaults to $FERRY_CONFIG or ferry.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// How to print an import report
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}
