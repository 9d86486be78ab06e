//! Import run coordination
//!
//! Loaders run strictly in the order given, one after the other. Order is
//! the only dependency mechanism: loading dependents before what they
//! reference produces validation failures, not a crash.

use tracing::{info, warn};

use super::loader::Loader;
use crate::extract::Extractor;
use crate::media::MediaRoot;
use crate::report::ImportReport;
use crate::store::Store;
use ferry_common::EntityType;

/// Owns the ordered loaders of an import
#[derive(Debug, Clone)]
pub struct ImportCoordinator {
    loaders: Vec<Loader>,
}

impl ImportCoordinator {
    pub fn new(loaders: Vec<Loader>) -> Self {
        Self { loaders }
    }

    pub fn loaders(&self) -> &[Loader] {
        &self.loaders
    }

    /// Delete existing records of every entity, dependents first.
    ///
    /// Returns `(entity, deleted)` in purge order.
    pub fn purge(&self, store: &mut dyn Store) -> Vec<(EntityType, usize)> {
        self.loaders
            .iter()
            .rev()
            .map(|loader| {
                let deleted = store.purge(loader.entity());
                info!(entity = %loader.entity(), deleted, "Purged existing records");
                (loader.entity().clone(), deleted)
            })
            .collect()
    }

    /// Run every loader in order. Never fails: problems are in the report.
    pub fn run(
        &self,
        extractor: &dyn Extractor,
        media: Option<&MediaRoot>,
        store: &mut dyn Store,
    ) -> ImportReport {
        let mut report = ImportReport::start(extractor.describe());
        info!(
            run_id = %report.run_id,
            source = %report.source,
            loaders = self.loaders.len(),
            "Import started"
        );

        for loader in &self.loaders {
            let loader_report = loader.run(extractor, media, store);
            if loader_report.batch_failure().is_some() {
                warn!(entity = %loader.entity(), "Continuing after batch failure");
            }
            report.loaders.push(loader_report);
        }

        let report = report.finish();
        let totals = report.totals();
        info!(
            run_id = %report.run_id,
            committed = totals.committed,
            skipped = totals.skipped,
            failed = totals.failed,
            "Import finished"
        );
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::extract::DumpdataExtractor;
    use crate::record::TransformedRecord;
    use crate::store::SchemaStore;
    use crate::store::StoreResponse;
    use crate::transform::TransformCandidate;
    use serde_json::json;

    fn loader(entity: &str) -> Loader {
        Loader::new(
            EntityType::new(entity),
            vec![TransformCandidate::identity("v1")],
        )
        .unwrap()
    }

    #[test]
    fn test_purge_runs_in_reverse_order() {
        let mut store = SchemaStore::default();
        for entity in ["category", "product"] {
            let record = TransformedRecord::from_fields(
                json!({"pk": 1}).as_object().cloned().unwrap(),
            );
            let response = store.persist(&EntityType::new(entity), &record, &[]).unwrap();
            assert!(matches!(response, StoreResponse::Committed(_)));
        }

        let coordinator = ImportCoordinator::new(vec![loader("category"), loader("product")]);
        let purged = coordinator.purge(&mut store);

        assert_eq!(
            purged,
            vec![
                (EntityType::new("product"), 1),
                (EntityType::new("category"), 1)
            ]
        );
    }

    #[test]
    fn test_report_follows_loader_order() {
        let extractor = DumpdataExtractor::from_json_str(
            r#"[{"model": "b", "pk": 1, "fields": {}}, {"model": "a", "pk": 1, "fields": {}}]"#,
        )
        .unwrap();
        let coordinator = ImportCoordinator::new(vec![loader("a"), loader("b"), loader("c")]);

        let mut store = SchemaStore::default();
        let report = coordinator.run(&extractor, None, &mut store);

        let order: Vec<&str> = report.loaders.iter().map(|l| l.entity.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(report.totals().committed, 2);
        assert_eq!(report.source, "<memory>");
        assert!(report.finished_at.is_some());
    }
}
