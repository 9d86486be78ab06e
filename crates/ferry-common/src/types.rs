//! Common types used across Ferry

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FerryError, Result};

/// Logical target schema a record belongs to, e.g. `blog.category`.
///
/// Opaque to the pipeline: it is only compared, hashed and displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(String);

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EntityType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Unique key of a persisted record.
///
/// Source files carry either integer primary keys or string slugs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    Int(i64),
    Text(String),
}

impl RecordKey {
    /// Build a key from a JSON value.
    ///
    /// Integers and non-empty strings are accepted. Numeric strings stay
    /// strings: `"7"` and `7` are different keys.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(RecordKey::Int)
                .ok_or_else(|| FerryError::InvalidKey(format!("{} is not an integer", n))),
            Value::String(s) if !s.is_empty() => Ok(RecordKey::Text(s.clone())),
            other => Err(FerryError::InvalidKey(format!(
                "expected an integer or a non-empty string, found {}",
                other
            ))),
        }
    }

    /// Convert back into a JSON value
    pub fn to_value(&self) -> Value {
        match self {
            RecordKey::Int(n) => Value::from(*n),
            RecordKey::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKey::Int(n) => write!(f, "{}", n),
            RecordKey::Text(s) => write!(f, "{:?}", s),
        }
    }
}
