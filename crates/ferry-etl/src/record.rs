//! Record types flowing through the pipeline

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use ferry_common::RecordKey;

/// Field data of one record, in source order
pub type Fields = serde_json::Map<String, Value>;

/// Name of the field carrying a record's key
pub const KEY_FIELD: &str = "pk";

/// Source-shaped record as yielded by an extractor.
///
/// Immutable once yielded: transforms only ever see `&RawRecord`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRecord {
    position: usize,
    fields: Fields,
}

impl RawRecord {
    pub fn new(position: usize, fields: Fields) -> Self {
        Self { position, fields }
    }

    /// Zero-based index of the record in its source
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Key of the record, when it carries a valid one
    pub fn key(&self) -> Option<RecordKey> {
        self.fields
            .get(KEY_FIELD)
            .and_then(|value| RecordKey::from_value(value).ok())
    }
}

/// Adapted record, ready for a store.
///
/// File fields are kept apart from plain fields: they hold paths relative to
/// the media root and are resolved by the loader just before persisting. A
/// file field present without a path maps to `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransformedRecord {
    pub fields: Fields,
    pub files: BTreeMap<String, Option<String>>,
}

impl TransformedRecord {
    pub fn from_fields(fields: Fields) -> Self {
        Self {
            fields,
            files: BTreeMap::new(),
        }
    }

    /// Raw key value, if the record has one
    pub fn key_value(&self) -> Option<&Value> {
        self.fields.get(KEY_FIELD).filter(|v| !v.is_null())
    }

    /// Every field name produced, plain and file fields alike
    pub fn field_names(&self) -> BTreeSet<String> {
        self.fields
            .keys()
            .chain(self.files.keys())
            .cloned()
            .collect()
    }
}
