//! Ferry Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the Ferry workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`FerryError`] and the [`Result`] alias
//! - **Logging**: `tracing` subscriber setup driven by [`logging::LogConfig`]
//! - **Checksums**: SHA-256 fingerprints for media files
//! - **Types**: [`EntityType`] and [`RecordKey`], shared by every crate
//!
//! # Example
//!
//! ```no_run
//! use ferry_common::{checksum, EntityType, Result};
//!
//! fn fingerprint(path: &str) -> Result<()> {
//!     let entity = EntityType::new("blog.entry");
//!     let digest = checksum::sha256_file(path)?;
//!     println!("{entity}: {digest}");
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{FerryError, Result};
pub use types::{EntityType, RecordKey};
