//! Declared target schemas and field validation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::ValidationErrors;
use crate::media::MediaFile;
use crate::record::{Fields, TransformedRecord};
use crate::transform::ExpectedShape;
use ferry_common::{EntityType, RecordKey};

pub const REQUIRED: &str = "This field is required.";

/// Type of a declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    Integer,
    Float,
    Boolean,
    /// RFC 3339 date and time
    Datetime,
    /// Key of a committed record of another entity
    Reference { entity: EntityType },
    /// Media file resolved against the media root
    File,
    /// Datetime filled with the commit time when absent
    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Fields of one entity. A schema without fields accepts anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    pub entity: EntityType,
    pub fields: BTreeMap<String, FieldSpec>,
}

impl EntitySchema {
    pub fn new(entity: EntityType) -> Self {
        Self {
            entity,
            fields: BTreeMap::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    pub fn is_permissive(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names for strict probing, `None` for a permissive schema
    pub fn shape(&self) -> Option<ExpectedShape> {
        if self.is_permissive() {
            return None;
        }

        let auto: BTreeSet<String> = self
            .fields
            .iter()
            .filter(|(_, spec)| spec.kind == FieldKind::Timestamp)
            .map(|(name, _)| name.clone())
            .collect();

        Some(ExpectedShape {
            fields: self.fields.keys().cloned().collect(),
            auto,
        })
    }

    /// `(field, target entity)` for every reference field
    pub fn references(&self) -> impl Iterator<Item = (&str, &EntityType)> {
        self.fields.iter().filter_map(|(name, spec)| match &spec.kind {
            FieldKind::Reference { entity } => Some((name.as_str(), entity)),
            _ => None,
        })
    }

    /// Validate a record and build the field map to store (without key).
    ///
    /// `exists` answers whether a referenced record is committed. Every
    /// declared field is checked so all messages are reported at once.
    pub fn clean<F>(
        &self,
        record: &TransformedRecord,
        files: &[MediaFile],
        now: DateTime<Utc>,
        exists: F,
    ) -> Result<Fields, ValidationErrors>
    where
        F: Fn(&EntityType, &RecordKey) -> bool,
    {
        if self.is_permissive() {
            let mut cleaned = record.fields.clone();
            for file in files {
                cleaned.insert(file.field.clone(), file_value(file));
            }
            return Ok(cleaned);
        }

        let mut cleaned = Fields::new();
        let mut errors = ValidationErrors::new();

        for (name, spec) in &self.fields {
            let value = record.fields.get(name).filter(|v| !v.is_null());

            let result = match &spec.kind {
                FieldKind::File => match files.iter().find(|f| &f.field == name) {
                    Some(file) => Ok(Some(file_value(file))),
                    None if value.is_some() => Err("No file was submitted.".to_string()),
                    None if spec.required => Err(REQUIRED.to_string()),
                    None => Ok(None),
                },
                FieldKind::Timestamp => match value {
                    Some(v) => check_datetime(v).map(Some),
                    None => Ok(Some(Value::String(now.to_rfc3339()))),
                },
                kind => match value {
                    Some(Value::String(s)) if s.is_empty() && spec.required => {
                        Err(REQUIRED.to_string())
                    }
                    Some(v) => check_value(kind, v, &exists).map(Some),
                    None if spec.required => Err(REQUIRED.to_string()),
                    None => Ok(None),
                },
            };

            match result {
                Ok(Some(v)) => {
                    cleaned.insert(name.clone(), v);
                }
                Ok(None) => {}
                Err(message) => errors.add(name.clone(), message),
            }
        }

        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(errors)
        }
    }
}

fn file_value(file: &MediaFile) -> Value {
    json!({
        "path": file.relative_path,
        "size": file.size,
        "sha256": file.sha256,
    })
}

fn check_datetime(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(s) if DateTime::parse_from_rfc3339(s).is_ok() => Ok(value.clone()),
        _ => Err("Enter a valid date/time.".to_string()),
    }
}

fn check_value<F>(kind: &FieldKind, value: &Value, exists: &F) -> Result<Value, String>
where
    F: Fn(&EntityType, &RecordKey) -> bool,
{
    match kind {
        FieldKind::Text { max_length } => {
            let Value::String(s) = value else {
                return Err("Enter a text value.".to_string());
            };
            let length = s.chars().count();
            match max_length {
                Some(max) if length > *max => Err(format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    max, length
                )),
                _ => Ok(value.clone()),
            }
        }
        FieldKind::Integer => match value.as_i64() {
            Some(n) => Ok(Value::from(n)),
            None => Err("Enter a whole number.".to_string()),
        },
        FieldKind::Float => match value {
            Value::Number(_) => Ok(value.clone()),
            _ => Err("Enter a number.".to_string()),
        },
        FieldKind::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            other => Err(format!("'{}' value must be either true or false.", other)),
        },
        FieldKind::Datetime | FieldKind::Timestamp => check_datetime(value),
        FieldKind::Reference { entity } => {
            let key = RecordKey::from_value(value)
                .map_err(|_| "Enter a valid reference key.".to_string())?;
            if exists(entity, &key) {
                Ok(value.clone())
            } else {
                Err(format!(
                    "Select a valid choice. {} is not an existing {}.",
                    key, entity
                ))
            }
        }
        FieldKind::File => Err("No file was submitted.".to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn product() -> EntitySchema {
        EntitySchema::new(EntityType::new("shop.product"))
            .field(
                "title",
                FieldSpec::new(FieldKind::Text {
                    max_length: Some(10),
                })
                .required(),
            )
            .field("stock", FieldSpec::new(FieldKind::Integer))
            .field(
                "category",
                FieldSpec::new(FieldKind::Reference {
                    entity: EntityType::new("shop.category"),
                })
                .required(),
            )
            .field("image", FieldSpec::new(FieldKind::File))
            .field("created", FieldSpec::new(FieldKind::Timestamp))
    }

    fn record(value: Value) -> TransformedRecord {
        TransformedRecord::from_fields(value.as_object().cloned().unwrap())
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-18T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn category_one(entity: &EntityType, key: &RecordKey) -> bool {
        entity.as_str() == "shop.category" && *key == RecordKey::Int(1)
    }

    #[test]
    fn test_clean_valid_record() {
        let file = MediaFile {
            field: "image".to_string(),
            relative_path: "p/gear.png".to_string(),
            path: PathBuf::from("/media/p/gear.png"),
            size: 3,
            sha256: "abc".to_string(),
        };
        let cleaned = product()
            .clean(
                &record(json!({"pk": 4, "title": "Gear", "category": 1, "legacy": true})),
                &[file],
                now(),
                category_one,
            )
            .unwrap();

        assert_eq!(cleaned.get("title"), Some(&json!("Gear")));
        assert_eq!(cleaned.get("created"), Some(&json!("2026-01-18T09:30:00+00:00")));
        assert_eq!(cleaned.get("image").unwrap()["path"], json!("p/gear.png"));
        assert!(!cleaned.contains_key("legacy"));
        assert!(!cleaned.contains_key("pk"));
    }

    #[test]
    fn test_clean_collects_every_error() {
        let errors = product()
            .clean(
                &record(json!({"title": "A very long title", "stock": "many", "category": 9})),
                &[],
                now(),
                category_one,
            )
            .unwrap_err();

        assert_eq!(
            errors.get("title").unwrap(),
            ["Ensure this value has at most 10 characters (it has 17)."]
        );
        assert_eq!(errors.get("stock").unwrap(), ["Enter a whole number."]);
        assert_eq!(
            errors.get("category").unwrap(),
            ["Select a valid choice. 9 is not an existing shop.category."]
        );
    }

    #[test]
    fn test_required_and_timestamp_from_data() {
        let errors = product()
            .clean(
                &record(json!({"title": "", "created": "yesterday"})),
                &[],
                now(),
                category_one,
            )
            .unwrap_err();

        assert_eq!(errors.get("title").unwrap(), [REQUIRED]);
        assert_eq!(errors.get("category").unwrap(), [REQUIRED]);
        assert_eq!(errors.get("created").unwrap(), ["Enter a valid date/time."]);

        let cleaned = product()
            .clean(
                &record(json!({"title": "Gear", "category": 1, "created": "2020-05-01T00:00:00Z"})),
                &[],
                now(),
                category_one,
            )
            .unwrap();
        assert_eq!(cleaned.get("created"), Some(&json!("2020-05-01T00:00:00Z")));
    }

    #[test]
    fn test_permissive_schema_keeps_everything() {
        let schema = EntitySchema::new(EntityType::new("widget"));
        assert!(schema.shape().is_none());

        let cleaned = schema
            .clean(&record(json!({"name": "gear", "x": 1})), &[], now(), |_, _| false)
            .unwrap();
        assert_eq!(cleaned.len(), 2);
    }

    #[test]
    fn test_shape_and_references() {
        let schema = product();
        let shape = schema.shape().unwrap();
        assert!(shape.fields.contains("image"));
        assert_eq!(shape.auto.iter().collect::<Vec<_>>(), vec!["created"]);

        let refs: Vec<_> = schema.references().collect();
        assert_eq!(refs, vec![("category", &EntityType::new("shop.category"))]);
    }

    #[test]
    fn test_field_spec_from_toml() {
        let fields: BTreeMap<String, FieldSpec> = toml::from_str(
            r#"
            title = { kind = "text", max_length = 200, required = true }
            category = { kind = "reference", entity = "blog.category" }
            created = { kind = "timestamp" }
            "#,
        )
        .unwrap();

        assert_eq!(
            fields["title"],
            FieldSpec::new(FieldKind::Text {
                max_length: Some(200)
            })
            .required()
        );
        assert!(!fields["category"].required);
        assert_eq!(fields["created"].kind, FieldKind::Timestamp);
    }
}
