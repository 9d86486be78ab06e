//! `ferry import` command implementation
//!
//! Loads the pipeline, runs every loader against the source and writes the
//! store back to the output directory.

use std::path::PathBuf;
use tracing::{info, warn};

use ferry_etl::config::PipelineConfig;
use ferry_etl::extract::{open_source, SourceFormat};
use ferry_etl::load::ImportCoordinator;
use ferry_etl::media::MediaRoot;
use ferry_etl::report::ImportReport;

use crate::config::Config;
use crate::error::{CliError, Result};
use crate::render;
use crate::ReportFormat;

/// Flags specific to one import
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub source: PathBuf,
    pub format: Option<SourceFormat>,
    pub purge: bool,
    pub report: ReportFormat,
}

/// Run an import and print its report.
///
/// Returns the report so the caller can pick the exit status.
pub fn run(config: &Config, options: &ImportOptions) -> Result<ImportReport> {
    if !config.pipeline.is_file() {
        return Err(CliError::file_not_found(&config.pipeline));
    }
    if !options.source.is_file() {
        return Err(CliError::file_not_found(&options.source));
    }

    let pipeline = PipelineConfig::from_path(&config.pipeline)?;
    let registry = pipeline.registry()?;
    let coordinator = ImportCoordinator::new(registry.loaders()?);

    let mut source_config = pipeline.source.clone();
    if let Some(format) = options.format {
        source_config.format = format;
    }
    let extractor = open_source(&options.source, &source_config)?;

    let media = match &config.media_root {
        Some(path) if path.is_dir() => Some(MediaRoot::new(path)),
        Some(path) => return Err(CliError::media_root(path)),
        None => None,
    };

    let mut store = pipeline.store();
    if config.output_dir.is_dir() {
        let loaded = store.load_dir(&config.output_dir)?;
        info!(records = loaded, dir = %config.output_dir.display(), "Loaded existing store");
    }

    if options.purge {
        let purged: usize = coordinator
            .purge(&mut store)
            .into_iter()
            .map(|(_, deleted)| deleted)
            .sum();
        info!(records = purged, "Purged existing records");
    }

    let report = coordinator.run(extractor.as_ref(), media.as_ref(), &mut store);
    store.export_dir(&config.output_dir)?;

    if report.has_failures() {
        warn!(failed = report.totals().failed, "Import finished with failures");
    }

    match options.report {
        ReportFormat::Text => print!("{}", render::text(&report)),
        ReportFormat::Json => println!("{}", render::json(&report)?),
    }

    Ok(report)
}
