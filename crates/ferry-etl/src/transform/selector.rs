//! Per-batch candidate selection
//!
//! The ordered candidates are probed on the first record of a batch only.
//! The first one that adapts it wins and is applied to every record of the
//! batch, the first included; later records never trigger a new probe.

use tracing::{info, warn};

use super::candidate::{ExpectedShape, TransformCandidate};
use crate::error::{AdaptationError, ConfigError, NoApplicableTransform, ProbeFailure};
use crate::record::{RawRecord, TransformedRecord};
use ferry_common::EntityType;

/// Outcome of a successful selection
#[derive(Debug)]
pub struct SelectedBatch {
    /// Name of the winning candidate
    pub candidate: String,
    /// One result per input record, in input order
    pub results: Vec<Result<TransformedRecord, AdaptationError>>,
}

/// Ordered candidates for one entity
#[derive(Debug, Clone)]
pub struct TransformerSelector {
    entity: EntityType,
    candidates: Vec<TransformCandidate>,
    shape: Option<ExpectedShape>,
}

impl TransformerSelector {
    pub fn new(
        entity: EntityType,
        candidates: Vec<TransformCandidate>,
    ) -> Result<Self, ConfigError> {
        if candidates.is_empty() {
            return Err(ConfigError::NoCandidates(entity));
        }

        Ok(Self {
            entity,
            candidates,
            shape: None,
        })
    }

    /// Reject probes whose output does not match `shape`
    pub fn with_shape(mut self, shape: ExpectedShape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn entity(&self) -> &EntityType {
        &self.entity
    }

    pub fn candidates(&self) -> &[TransformCandidate] {
        &self.candidates
    }

    /// Probe the candidates in order on `first`.
    pub fn select(&self, first: &RawRecord) -> Result<&TransformCandidate, NoApplicableTransform> {
        let mut probes = Vec::new();

        for candidate in &self.candidates {
            match self.probe(candidate, first) {
                Ok(()) => {
                    info!(
                        entity = %self.entity,
                        candidate = candidate.name(),
                        rejected = probes.len(),
                        "Selected transform"
                    );
                    return Ok(candidate);
                }
                Err(reason) => {
                    warn!(
                        entity = %self.entity,
                        candidate = candidate.name(),
                        position = first.position(),
                        %reason,
                        "Transform rejected"
                    );
                    probes.push(ProbeFailure {
                        candidate: candidate.name().to_string(),
                        reason,
                    });
                }
            }
        }

        Err(NoApplicableTransform {
            entity: self.entity.clone(),
            tried: probes.len(),
            probes,
        })
    }

    fn probe(&self, candidate: &TransformCandidate, record: &RawRecord) -> Result<(), String> {
        let output = candidate.apply(record).map_err(|e| e.message)?;

        if let Some(shape) = &self.shape {
            let errors = candidate.shape_errors(&output, shape);
            if !errors.is_empty() {
                return Err(errors.join("; "));
            }
        }

        Ok(())
    }

    /// Select a candidate on the first record and apply it to the batch.
    ///
    /// An empty batch exercises no candidate and returns `Ok(None)`.
    pub fn select_and_apply(
        &self,
        batch: &[RawRecord],
    ) -> Result<Option<SelectedBatch>, NoApplicableTransform> {
        let Some(first) = batch.first() else {
            return Ok(None);
        };

        let selected = self.select(first)?;
        let results = batch.iter().map(|record| selected.apply(record)).collect();

        Ok(Some(SelectedBatch {
            candidate: selected.name().to_string(),
            results,
        }))
    }
}
