//! Ferry ETL Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Batch import of tagged records into a validating store, adapting each
//! record across schema generations on the way.
//!
//! # Pipeline
//!
//! - **Extract**: [`extract::Extractor`] yields [`RawRecord`]s filtered by
//!   source tag (Django-style dumpdata JSON or JSON Lines).
//! - **Transform**: [`transform::TransformerSelector`] probes the ordered
//!   candidates on the first record of a batch and applies the winner to
//!   every record.
//! - **Load**: [`load::Loader`] resolves media files and hands each record
//!   to a [`store::Store`]; [`load::ImportCoordinator`] runs loaders in
//!   dependency order and collects an [`report::ImportReport`].
//!
//! # Example
//!
//! ```no_run
//! use ferry_etl::config::PipelineConfig;
//! use ferry_etl::extract::open_source;
//! use ferry_etl::load::ImportCoordinator;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig::from_path("ferry.toml")?;
//!     let registry = config.registry()?;
//!     let mut store = config.store();
//!     let source = open_source("export/blog.json", &config.source)?;
//!
//!     let coordinator = ImportCoordinator::new(registry.loaders()?);
//!     let report = coordinator.run(source.as_ref(), None, &mut store);
//!     println!("{} records failed", report.totals().failed);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod load;
pub mod media;
pub mod record;
pub mod registry;
pub mod report;
pub mod store;
pub mod transform;

// Re-export commonly used types
pub use error::{
    AdaptationError, ConfigError, EtlError, MediaError, NoApplicableTransform, Result,
    SourceFormatError, ValidationErrors,
};
pub use ferry_common::{EntityType, RecordKey};
pub use record::{Fields, RawRecord, TransformedRecord};
