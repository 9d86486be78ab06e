//! Declarative transform steps
//!
//! A candidate declared in configuration is an ordered list of steps applied
//! to a copy of the raw record. Every step is pure: the same input always
//! gives the same output.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::AdaptationError;
use crate::record::TransformedRecord;

/// Target type of a `coerce` step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Integer,
    Float,
    Boolean,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::String => write!(f, "string"),
            ValueKind::Integer => write!(f, "integer"),
            ValueKind::Float => write!(f, "float"),
            ValueKind::Boolean => write!(f, "boolean"),
        }
    }
}

/// One operation on a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Move `from` to `to`; fails when `from` is absent
    Rename { from: String, to: String },

    /// Remove fields when present
    Drop { fields: Vec<String> },

    /// Fail unless every field is present
    Require { fields: Vec<String> },

    /// Insert `value` when `field` is absent
    Default { field: String, value: Value },

    /// Overwrite `field` with `value`
    Set { field: String, value: Value },

    /// Convert the value of `field`; null stays null
    Coerce { field: String, to: ValueKind },

    /// Mark a string field as a media path relative to the media root;
    /// an empty or null path leaves the field without a file
    File { field: String },
}

impl Step {
    pub fn apply(&self, record: &mut TransformedRecord) -> Result<(), AdaptationError> {
        let fields = &mut record.fields;

        match self {
            Step::Rename { from, to } => {
                let value = fields
                    .shift_remove(from)
                    .ok_or_else(|| AdaptationError::missing_field(from))?;
                fields.insert(to.clone(), value);
            }
            Step::Drop { fields: names } => {
                for name in names {
                    fields.shift_remove(name);
                }
            }
            Step::Require { fields: names } => {
                if let Some(missing) = names.iter().find(|name| !fields.contains_key(*name)) {
                    return Err(AdaptationError::missing_field(missing));
                }
            }
            Step::Default { field, value } => {
                if !fields.contains_key(field) {
                    fields.insert(field.clone(), value.clone());
                }
            }
            Step::Set { field, value } => {
                fields.insert(field.clone(), value.clone());
            }
            Step::Coerce { field, to } => {
                if let Some(value) = fields.get_mut(field) {
                    *value = coerce(value, *to).map_err(|reason| {
                        AdaptationError::new(format!(
                            "cannot convert '{}' to {}: {}",
                            field, to, reason
                        ))
                    })?;
                }
            }
            Step::File { field } => match fields.shift_remove(field) {
                None => {}
                Some(Value::Null) => {
                    record.files.insert(field.clone(), None);
                }
                Some(Value::String(path)) => {
                    let path = (!path.is_empty()).then_some(path);
                    record.files.insert(field.clone(), path);
                }
                Some(other) => {
                    return Err(AdaptationError::new(format!(
                        "file field '{}' must hold a path, found {}",
                        field, other
                    )))
                }
            },
        }

        Ok(())
    }
}

fn coerce(value: &Value, to: ValueKind) -> Result<Value, String> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match to {
        ValueKind::String => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(format!("{} is not a scalar", other)),
        },
        ValueKind::Integer => match value {
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Ok(Value::from(i)),
                (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(Value::from(f as i64))
                }
                _ => Err(format!("{} is not a whole number", n)),
            },
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("{:?} is not a whole number", s)),
            other => Err(format!("{} is not a whole number", other)),
        },
        ValueKind::Float => {
            let parsed = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            parsed
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("{} is not a number", value))
        }
        ValueKind::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(format!("{} is not 0 or 1", n)),
            },
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
                "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
                _ => Err(format!("{:?} is not a boolean", s)),
            },
            other => Err(format!("{} is not a boolean", other)),
        },
    }
}
