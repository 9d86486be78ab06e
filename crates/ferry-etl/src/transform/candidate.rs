//! Named transform candidates

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::steps::Step;
use crate::error::AdaptationError;
use crate::record::{RawRecord, TransformedRecord, KEY_FIELD};

type TransformFn =
    dyn Fn(&RawRecord) -> Result<TransformedRecord, AdaptationError> + Send + Sync;

/// Field names a target schema expects, used for strict probing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedShape {
    /// Every declared field
    pub fields: BTreeSet<String>,
    /// Fields the store fills in itself when absent
    pub auto: BTreeSet<String>,
}

/// One schema generation's adaptation of raw records.
///
/// The function must be pure: the selector re-applies the winning candidate
/// to the first record of a batch.
#[derive(Clone)]
pub struct TransformCandidate {
    name: String,
    func: Arc<TransformFn>,
    ignore_missing: BTreeSet<String>,
    ignore_extra: BTreeSet<String>,
}

impl TransformCandidate {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&RawRecord) -> Result<TransformedRecord, AdaptationError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
            ignore_missing: BTreeSet::new(),
            ignore_extra: BTreeSet::new(),
        }
    }

    /// Candidate running declarative steps over a copy of the raw fields
    pub fn from_steps(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self::new(name, move |raw: &RawRecord| {
            let mut record = TransformedRecord::from_fields(raw.fields().clone());
            for step in &steps {
                step.apply(&mut record)?;
            }
            Ok(record)
        })
    }

    /// Candidate passing fields through unchanged
    pub fn identity(name: impl Into<String>) -> Self {
        Self::from_steps(name, Vec::new())
    }

    /// Expected fields this candidate may leave out without failing a probe
    pub fn ignore_missing<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_missing.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Unexpected fields this candidate may produce without failing a probe
    pub fn ignore_extra<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_extra.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, raw: &RawRecord) -> Result<TransformedRecord, AdaptationError> {
        (self.func)(raw)
    }

    /// Compare a probe's output with the expected shape.
    ///
    /// Returns one line per kind of mismatch, field names sorted.
    pub fn shape_errors(&self, output: &TransformedRecord, shape: &ExpectedShape) -> Vec<String> {
        let produced = output.field_names();
        let mut errors = Vec::new();

        let missing: Vec<&str> = shape
            .fields
            .iter()
            .filter(|f| !shape.auto.contains(*f))
            .filter(|f| !produced.contains(*f) && !self.ignore_missing.contains(*f))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            errors.push(format!("missing fields: {}", missing.join(", ")));
        }

        let extra: Vec<&str> = produced
            .iter()
            .filter(|f| f.as_str() != KEY_FIELD && !shape.fields.contains(*f))
            .filter(|f| !self.ignore_extra.contains(*f))
            .map(String::as_str)
            .collect();
        if !extra.is_empty() {
            errors.push(format!("extra fields: {}", extra.join(", ")));
        }

        errors
    }
}

impl fmt::Debug for TransformCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformCandidate")
            .field("name", &self.name)
            .field("ignore_missing", &self.ignore_missing)
            .field("ignore_extra", &self.ignore_extra)
            .finish_non_exhaustive()
    }
}
