//! Per-record outcomes and run reports

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::error::{
    AdaptationError, MediaError, NoApplicableTransform, SourceFormatError, ValidationErrors,
};
use crate::store::EntityRef;
use ferry_common::{EntityType, RecordKey};

/// Why a record (or a whole batch) failed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureDetail {
    Adaptation(AdaptationError),
    Validation(ValidationErrors),
    Media(MediaError),
    NoApplicableTransform(NoApplicableTransform),
    Source(SourceFormatError),
}

impl FailureDetail {
    /// True for failures that stop a loader's whole batch
    pub fn is_batch_level(&self) -> bool {
        matches!(
            self,
            FailureDetail::NoApplicableTransform(_) | FailureDetail::Source(_)
        )
    }
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureDetail::Adaptation(e) => write!(f, "adaptation failed: {}", e),
            FailureDetail::Validation(e) => write!(f, "validation failed: {}", e),
            FailureDetail::Media(e) => write!(f, "media error: {}", e),
            FailureDetail::NoApplicableTransform(e) => {
                write!(f, "{}", e)?;
                for probe in &e.probes {
                    write!(f, "; {}: {}", probe.candidate, probe.reason)?;
                }
                Ok(())
            }
            FailureDetail::Source(e) => write!(f, "source error: {}", e),
        }
    }
}

/// Result of processing one record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum LoadOutcome {
    Committed(EntityRef),
    Skipped(String),
    Failed(FailureDetail),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordOutcome {
    /// Position in the source; `None` for a batch-level failure
    pub position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<RecordKey>,
    #[serde(flatten)]
    pub outcome: LoadOutcome,
}

impl RecordOutcome {
    pub fn record(position: usize, key: Option<RecordKey>, outcome: LoadOutcome) -> Self {
        Self {
            position: Some(position),
            key,
            outcome,
        }
    }

    /// Marker for a batch aborted before any record was processed
    pub fn batch_failure(detail: FailureDetail) -> Self {
        Self {
            position: None,
            key: None,
            outcome: LoadOutcome::Failed(detail),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, LoadOutcome::Failed(_))
    }
}

/// Committed / skipped / failed tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadCounts {
    pub committed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl LoadCounts {
    pub fn total(&self) -> usize {
        self.committed + self.skipped + self.failed
    }
}

impl std::ops::AddAssign for LoadCounts {
    fn add_assign(&mut self, other: Self) {
        self.committed += other.committed;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Outcomes of one loader, in record order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoaderReport {
    pub entity: EntityType,
    /// Selected candidate; `None` for an empty or aborted batch
    pub candidate: Option<String>,
    pub outcomes: Vec<RecordOutcome>,
}

impl LoaderReport {
    pub fn new(entity: EntityType) -> Self {
        Self {
            entity,
            candidate: None,
            outcomes: Vec::new(),
        }
    }

    pub fn counts(&self) -> LoadCounts {
        let mut counts = LoadCounts::default();
        for outcome in &self.outcomes {
            match outcome.outcome {
                LoadOutcome::Committed(_) => counts.committed += 1,
                LoadOutcome::Skipped(_) => counts.skipped += 1,
                LoadOutcome::Failed(_) => counts.failed += 1,
            }
        }
        counts
    }

    /// The batch-level failure, if the batch was aborted
    pub fn batch_failure(&self) -> Option<&FailureDetail> {
        self.outcomes.iter().find_map(|o| match (&o.position, &o.outcome) {
            (None, LoadOutcome::Failed(detail)) => Some(detail),
            _ => None,
        })
    }
}

/// Report of one import run, one entry per loader in run order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub run_id: Uuid,
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub loaders: Vec<LoaderReport>,
}

impl ImportReport {
    pub fn start(source: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            source: source.into(),
            started_at: Utc::now(),
            finished_at: None,
            loaders: Vec::new(),
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn loader(&self, entity: &EntityType) -> Option<&LoaderReport> {
        self.loaders.iter().find(|l| &l.entity == entity)
    }

    pub fn totals(&self) -> LoadCounts {
        let mut totals = LoadCounts::default();
        for loader in &self.loaders {
            totals += loader.counts();
        }
        totals
    }

    pub fn has_failures(&self) -> bool {
        self.loaders
            .iter()
            .any(|l| l.outcomes.iter().any(RecordOutcome::is_failed))
    }
}
