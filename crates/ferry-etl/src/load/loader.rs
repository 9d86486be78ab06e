//! Per-entity loader

use tracing::{debug, error, info, info_span};

use crate::error::{AdaptationError, ConfigError, SourceFormatError};
use crate::extract::Extractor;
use crate::media::{resolve_files, MediaRoot};
use crate::record::{RawRecord, TransformedRecord};
use crate::report::{FailureDetail, LoadOutcome, LoaderReport, RecordOutcome};
use crate::store::{Store, StoreResponse};
use crate::transform::{ExpectedShape, TransformCandidate, TransformerSelector};
use ferry_common::{EntityType, RecordKey};

/// Runs extraction, selection, media resolution and persistence for one
/// entity.
#[derive(Debug, Clone)]
pub struct Loader {
    selector: TransformerSelector,
    source_tag: String,
}

impl Loader {
    /// Loader reading records tagged with the entity's own name
    pub fn new(
        entity: EntityType,
        candidates: Vec<TransformCandidate>,
    ) -> Result<Self, ConfigError> {
        let source_tag = entity.as_str().to_string();
        Ok(Self {
            selector: TransformerSelector::new(entity, candidates)?,
            source_tag,
        })
    }

    pub fn with_source_tag(mut self, tag: impl Into<String>) -> Self {
        self.source_tag = tag.into();
        self
    }

    /// Enable strict probing against `shape`
    pub fn with_shape(mut self, shape: ExpectedShape) -> Self {
        self.selector = self.selector.with_shape(shape);
        self
    }

    pub fn entity(&self) -> &EntityType {
        self.selector.entity()
    }

    pub fn source_tag(&self) -> &str {
        &self.source_tag
    }

    pub fn candidates(&self) -> &[TransformCandidate] {
        self.selector.candidates()
    }

    /// Load this entity's batch. Never fails: every problem is an outcome.
    pub fn run(
        &self,
        extractor: &dyn Extractor,
        media: Option<&MediaRoot>,
        store: &mut dyn Store,
    ) -> LoaderReport {
        let span = info_span!("loader", entity = %self.entity());
        let _enter = span.enter();

        let mut report = LoaderReport::new(self.entity().clone());
        info!(source_tag = %self.source_tag, "Loader started");

        let batch = match self.read_batch(extractor) {
            Ok(batch) => batch,
            Err(e) => {
                error!(error = %e, "Cannot read batch");
                report
                    .outcomes
                    .push(RecordOutcome::batch_failure(FailureDetail::Source(e)));
                return report;
            }
        };

        let selected = match self.selector.select_and_apply(&batch) {
            Ok(Some(selected)) => selected,
            Ok(None) => {
                info!("No records for this entity");
                return report;
            }
            Err(e) => {
                error!(error = %e, "Batch aborted");
                report.outcomes.push(RecordOutcome::batch_failure(
                    FailureDetail::NoApplicableTransform(e),
                ));
                return report;
            }
        };

        report.candidate = Some(selected.candidate);
        for (raw, result) in batch.iter().zip(selected.results) {
            report.outcomes.push(self.load_record(raw, result, media, store));
        }

        let counts = report.counts();
        info!(
            candidate = report.candidate.as_deref().unwrap_or_default(),
            committed = counts.committed,
            skipped = counts.skipped,
            failed = counts.failed,
            "Loader finished"
        );
        report
    }

    fn read_batch(&self, extractor: &dyn Extractor) -> Result<Vec<RawRecord>, SourceFormatError> {
        extractor.records(Some(self.source_tag.as_str()))?.collect()
    }

    fn load_record(
        &self,
        raw: &RawRecord,
        result: Result<TransformedRecord, AdaptationError>,
        media: Option<&MediaRoot>,
        store: &mut dyn Store,
    ) -> RecordOutcome {
        let position = raw.position();

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                error!(position, error = %e, "Record could not be adapted");
                return RecordOutcome::record(
                    position,
                    raw.key(),
                    LoadOutcome::Failed(FailureDetail::Adaptation(e)),
                );
            }
        };

        let key = record
            .key_value()
            .and_then(|value| RecordKey::from_value(value).ok())
            .or_else(|| raw.key());

        let files = match resolve_files(media, &record.files) {
            Ok(files) => files,
            Err(e) => {
                error!(position, error = %e, "Media resolution failed");
                return RecordOutcome::record(
                    position,
                    key,
                    LoadOutcome::Failed(FailureDetail::Media(e)),
                );
            }
        };

        let outcome = match store.persist(self.entity(), &record, &files) {
            Ok(StoreResponse::Committed(committed)) => {
                debug!(position, record = %committed, "Committed");
                LoadOutcome::Committed(committed)
            }
            Ok(StoreResponse::Ignored(reason)) => {
                info!(position, %reason, "Record skipped");
                LoadOutcome::Skipped(reason)
            }
            Err(errors) => {
                error!(position, errors = %errors, "Record failed validation");
                LoadOutcome::Failed(FailureDetail::Validation(errors))
            }
        };

        let key = match &outcome {
            LoadOutcome::Committed(committed) => Some(committed.key.clone()),
            _ => key,
        };
        RecordOutcome::record(position, key, outcome)
    }
}
