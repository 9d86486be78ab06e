//! Ferry CLI - Main entry point

use clap::Parser;
use ferry_cli::commands::import::ImportOptions;
use ferry_cli::{Cli, Commands, Config};
use ferry_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::{error, warn};

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Verbose mode logs debug to the console, otherwise only warnings
    let base = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        })
        .output(LogOutput::Console)
        .log_file_prefix("ferry")
        .build();

    // Environment variables take precedence
    let log_config = base.clone().merge_env().unwrap_or(base);

    // The CLI works without logging
    let _guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        }
    };

    match execute(&cli) {
        Ok(true) => {}
        Ok(false) => {
            warn!("Import finished with failed records");
            process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// Execute the CLI command. `Ok(false)` means the import recorded failures.
fn execute(cli: &Cli) -> anyhow::Result<bool> {
    let env = Config::from_env();

    match &cli.command {
        Commands::Import {
            source,
            config,
            media,
            output,
            format,
            purge,
            report,
        } => {
            let config = env.with_overrides(config.clone(), media.clone(), output.clone());
            let options = ImportOptions {
                source: source.clone(),
                format: *format,
                purge: *purge,
                report: *report,
            };
            let report = ferry_cli::commands::import::run(&config, &options)?;
            Ok(!report.has_failures())
        }

        Commands::Check { config } => {
            let config = env.with_overrides(config.clone(), None, None);
            ferry_cli::commands::check::run(&config)?;
            Ok(true)
        }
    }
}
