//! Django-style `dumpdata` JSON sources
//!
//! ```json
//! [
//!   {"model": "blog.category", "pk": 1, "fields": {"title": "News"}},
//!   {"model": "blog.article", "pk": 7, "fields": {"category": 1}}
//! ]
//! ```
//!
//! The outer `pk` always leads the record's fields. A `pk` inside `fields`
//! overrides its value but not its position.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Extractor, RecordIter};
use crate::error::SourceFormatError;
use crate::record::{Fields, RawRecord, KEY_FIELD};

const EXPECTED_KEYS: [&str; 3] = ["fields", "model", "pk"];

/// Extractor over a whole dumpdata file, parsed and checked at open
#[derive(Debug, Clone)]
pub struct DumpdataExtractor {
    origin: Option<PathBuf>,
    records: Vec<(String, RawRecord)>,
}

impl DumpdataExtractor {
    /// Read and validate a dumpdata file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceFormatError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SourceFormatError::new(format!("Cannot read {}: {}", path.display(), e))
        })?;

        let mut extractor = Self::from_json_str(&text)?;
        extractor.origin = Some(path.to_path_buf());
        Ok(extractor)
    }

    /// Parse dumpdata held in memory
    pub fn from_json_str(text: &str) -> Result<Self, SourceFormatError> {
        let data: Value = serde_json::from_str(text)
            .map_err(|e| SourceFormatError::new(format!("Invalid JSON: {}", e)))?;

        let Value::Array(items) = data else {
            return Err(SourceFormatError::new(
                "Expected a JSON array of dumpdata records",
            ));
        };

        let records = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| clean(index, item))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(records = records.len(), "Parsed dumpdata source");
        Ok(Self {
            origin: None,
            records,
        })
    }

    /// Distinct model tags, in order of first appearance
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = Vec::new();
        for (tag, _) in &self.records {
            if !tags.contains(&tag.as_str()) {
                tags.push(tag);
            }
        }
        tags
    }
}

/// Check one element and flatten it to `(model, {pk, ...fields})`
fn clean(index: usize, item: Value) -> Result<(String, RawRecord), SourceFormatError> {
    let mut object = match item {
        Value::Object(object) => object,
        other => {
            return Err(SourceFormatError::new(format!(
                "Error with JSON record {}: Expected mapping with keys {}, but found {}",
                index,
                key_list(EXPECTED_KEYS.iter().copied()),
                item_kind(&other)
            )))
        }
    };

    let mut found: Vec<&str> = object.keys().map(String::as_str).collect();
    found.sort_unstable();
    if found != EXPECTED_KEYS {
        return Err(SourceFormatError::new(format!(
            "Error with JSON record {}: Expected mapping with keys {}, but found {}",
            index,
            key_list(EXPECTED_KEYS.iter().copied()),
            key_list(found.into_iter())
        )));
    }

    let tag = match object.shift_remove("model") {
        Some(Value::String(tag)) => tag,
        _ => {
            return Err(SourceFormatError::new(format!(
                "Error with JSON record {}: 'model' must be a string",
                index
            )))
        }
    };

    let inner = match object.shift_remove("fields") {
        Some(Value::Object(inner)) => inner,
        _ => {
            return Err(SourceFormatError::new(format!(
                "Error with JSON record {}: 'fields' must be a mapping",
                index
            )))
        }
    };

    let mut fields = Fields::new();
    fields.insert(
        KEY_FIELD.to_string(),
        object.shift_remove("pk").unwrap_or(Value::Null),
    );
    fields.extend(inner);

    Ok((tag, RawRecord::new(index, fields)))
}

fn key_list<'a>(keys: impl Iterator<Item = &'a str>) -> String {
    let quoted: Vec<String> = keys.map(|k| format!("'{}'", k)).collect();
    format!("[{}]", quoted.join(", "))
}

fn item_kind(item: &Value) -> &'static str {
    match item {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}

impl Extractor for DumpdataExtractor {
    fn records<'a>(&'a self, tag: Option<&'a str>) -> Result<RecordIter<'a>, SourceFormatError> {
        Ok(Box::new(
            self.records
                .iter()
                .filter(move |(model, _)| tag.is_none_or(|t| t == model.as_str()))
                .map(|(_, record)| Ok::<_, SourceFormatError>(record.clone())),
        ))
    }

    fn describe(&self) -> String {
        match &self.origin {
            Some(path) => path.display().to_string(),
            None => "<memory>".to_string(),
        }
    }
}
