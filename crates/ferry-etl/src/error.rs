//! Error taxonomy of the import pipeline
//!
//! | Error                     | Scope                                   |
//! |---------------------------|-----------------------------------------|
//! | [`SourceFormatError`]     | whole run when opening, else one batch  |
//! | [`NoApplicableTransform`] | one loader's batch                      |
//! | [`AdaptationError`]       | one record                              |
//! | [`MediaError`]            | one record                              |
//! | [`ValidationErrors`]      | one record                              |
//! | [`ConfigError`]           | before the run starts                   |
//!
//! Record and batch errors are turned into report entries by the loader;
//! only [`SourceFormatError`] at open time and [`ConfigError`] reach the
//! caller as `Err`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

use ferry_common::{EntityType, FerryError};

/// Result type alias for pipeline setup and store I/O
pub type Result<T> = std::result::Result<T, EtlError>;

/// The source cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct SourceFormatError {
    pub message: String,
}

impl SourceFormatError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A candidate transform could not adapt a record.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct AdaptationError {
    pub message: String,
}

impl AdaptationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(format!("missing field '{}'", field))
    }
}

/// One rejected candidate during selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeFailure {
    pub candidate: String,
    pub reason: String,
}

/// Every candidate failed on the first record of a batch.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("no applicable transform for '{entity}': all {tried} candidates failed on the first record")]
pub struct NoApplicableTransform {
    pub entity: EntityType,
    pub tried: usize,
    pub probes: Vec<ProbeFailure>,
}

/// Field-level validation failures reported by a store.
///
/// Messages are grouped per field; fields iterate in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Field name used for errors not tied to a single field
    pub const NON_FIELD: &'static str = "__all__";

    pub fn new() -> Self {
        Self::default()
    }

    /// Shortcut for a single message
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(f, m)| (f.as_str(), m.as_slice()))
    }

    /// One line: `field: message message, other: message`
    pub fn summary(&self) -> String {
        self.fields
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for ValidationErrors {}

/// A file field could not be resolved against the media root.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum MediaError {
    #[error("cannot resolve media for '{field}' without a media root")]
    NoMediaRoot { field: String },

    #[error("path for '{field}' does not appear to be relative: {path:?}")]
    NotRelative { field: String, path: String },

    #[error("file not found for '{field}': {}", .path.display())]
    NotFound { field: String, path: PathBuf },

    #[error("cannot read file for '{field}' at {}: {message}", .path.display())]
    Unreadable {
        field: String,
        path: PathBuf,
        message: String,
    },
}

/// Invalid pipeline configuration, detected before any record is read.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Pipeline declares no entities")]
    NoEntities,

    #[error("Entity '{0}' has no transform candidates")]
    NoCandidates(EntityType),

    #[error("Entity '{0}' is declared more than once")]
    DuplicateEntity(EntityType),

    #[error("Entity '{0}' is not registered")]
    UnknownEntity(EntityType),

    #[error("Field '{field}' of '{entity}' references undeclared entity '{target}'")]
    UnknownReference {
        entity: EntityType,
        field: String,
        target: EntityType,
    },

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Umbrella error for callers driving a whole import
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Source format error: {0}")]
    Source(#[from] SourceFormatError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] FerryError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_summary_is_sorted() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "This field is required.");
        errors.add("category", "Select a valid choice.");
        errors.add("category", "Enter a valid reference key.");

        assert_eq!(
            errors.summary(),
            "category: Select a valid choice. Enter a valid reference key., title: This field is required."
        );
        assert_eq!(errors.get("title").unwrap().len(), 1);
        assert!(errors.get("slug").is_none());
    }

    #[test]
    fn test_validation_errors_serialize_as_map() {
        let errors = ValidationErrors::single("pk", "record with this key already exists");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({"pk": ["record with this key already exists"]}));
    }

    #[test]
    fn test_media_error_messages() {
        let err = MediaError::NotFound {
            field: "cover_image".to_string(),
            path: PathBuf::from("/media/story/a.jpg"),
        };
        assert_eq!(err.to_string(), "file not found for 'cover_image': /media/story/a.jpg");
    }

    #[test]
    fn test_no_applicable_transform_message() {
        let err = NoApplicableTransform {
            entity: EntityType::new("widget"),
            tried: 2,
            probes: Vec::new(),
        };
        assert_eq!(
            err.to_string(),
            "no applicable transform for 'widget': all 2 candidates failed on the first record"
        );
    }
}
