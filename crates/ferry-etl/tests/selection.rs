//! Candidate selection behaviour across whole batches

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use serde_json::{json, Value};

use ferry_etl::error::ValidationErrors;
use ferry_etl::extract::DumpdataExtractor;
use ferry_etl::load::Loader;
use ferry_etl::media::MediaFile;
use ferry_etl::report::{FailureDetail, LoadOutcome};
use ferry_etl::store::{EntityRef, Store, StoreResponse};
use ferry_etl::transform::{Step, TransformCandidate, TransformerSelector};
use ferry_etl::{EntityType, Fields, RawRecord, RecordKey, TransformedRecord};

/// Store accepting everything and counting calls
#[derive(Default)]
struct CountingStore {
    persisted: Vec<TransformedRecord>,
}

impl Store for CountingStore {
    fn persist(
        &mut self,
        entity: &EntityType,
        record: &TransformedRecord,
        _files: &[MediaFile],
    ) -> Result<StoreResponse, ValidationErrors> {
        self.persisted.push(record.clone());
        Ok(StoreResponse::Committed(EntityRef {
            entity: entity.clone(),
            key: RecordKey::Int(self.persisted.len() as i64),
        }))
    }

    fn purge(&mut self, _entity: &EntityType) -> usize {
        0
    }
}

fn requiring(name: &str, field: &str) -> TransformCandidate {
    TransformCandidate::from_steps(
        name,
        vec![
            Step::Require {
                fields: vec![field.to_string()],
            },
            Step::Set {
                field: "via".to_string(),
                value: json!(name),
            },
        ],
    )
}

fn widgets(records: &[Value]) -> DumpdataExtractor {
    let items: Vec<Value> = records
        .iter()
        .enumerate()
        .map(|(i, fields)| json!({"model": "widget", "pk": i + 1, "fields": fields}))
        .collect();
    DumpdataExtractor::from_json_str(&Value::Array(items).to_string()).unwrap()
}

#[test]
fn test_selected_candidate_is_kept_for_the_batch() {
    // Record 1 would pass candidate A, but B was chosen on record 0.
    let extractor = widgets(&[
        json!({"name": "one"}),
        json!({"name": "two", "title": "Two"}),
        json!({"name": "three"}),
    ]);
    let loader = Loader::new(
        EntityType::new("widget"),
        vec![requiring("A", "title"), requiring("B", "name")],
    )
    .unwrap();

    let mut store = CountingStore::default();
    let report = loader.run(&extractor, None, &mut store);

    assert_eq!(report.candidate.as_deref(), Some("B"));
    assert_eq!(report.outcomes.len(), 3);
    assert!(store
        .persisted
        .iter()
        .all(|record| record.fields["via"] == json!("B")));
}

#[test]
fn test_all_candidates_failing_aborts_batch_without_store_calls() {
    let extractor = widgets(&[json!({"label": "x"}), json!({"name": "y"})]);
    let loader = Loader::new(
        EntityType::new("widget"),
        vec![requiring("A", "title"), requiring("B", "name")],
    )
    .unwrap();

    let mut store = CountingStore::default();
    let report = loader.run(&extractor, None, &mut store);

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].position, None);
    match &report.outcomes[0].outcome {
        LoadOutcome::Failed(FailureDetail::NoApplicableTransform(e)) => {
            assert_eq!(e.tried, 2);
            assert_eq!(e.entity, EntityType::new("widget"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(store.persisted.is_empty());
}

#[test]
fn test_empty_batch_has_no_outcomes() {
    let extractor = widgets(&[]);
    let loader = Loader::new(EntityType::new("widget"), vec![requiring("A", "title")]).unwrap();

    let mut store = CountingStore::default();
    let report = loader.run(&extractor, None, &mut store);

    assert!(report.outcomes.is_empty());
    assert!(report.batch_failure().is_none());
}

#[test]
fn test_later_adaptation_error_fails_only_that_record() {
    let extractor = widgets(&[json!({"name": "one"}), json!({"title": "Two"})]);
    let loader = Loader::new(EntityType::new("widget"), vec![requiring("B", "name")]).unwrap();

    let mut store = CountingStore::default();
    let report = loader.run(&extractor, None, &mut store);

    assert!(matches!(report.outcomes[0].outcome, LoadOutcome::Committed(_)));
    assert!(matches!(
        report.outcomes[1].outcome,
        LoadOutcome::Failed(FailureDetail::Adaptation(_))
    ));
    assert_eq!(report.outcomes[1].position, Some(1));
    assert_eq!(store.persisted.len(), 1);
}

fn field_map() -> impl Strategy<Value = Fields> {
    prop::collection::btree_map(
        "[a-z]{1,6}",
        prop_oneof![
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
        ],
        0..6,
    )
    .prop_map(|map| map.into_iter().collect())
}

proptest! {
    #[test]
    fn prop_reapplying_selected_candidate_is_identical(
        batch in prop::collection::vec(field_map(), 1..8)
    ) {
        let records: Vec<RawRecord> = batch
            .into_iter()
            .enumerate()
            .map(|(i, fields)| RawRecord::new(i, fields))
            .collect();

        let selector = TransformerSelector::new(
            EntityType::new("widget"),
            vec![
                requiring("strict", "zzzzzzz"),
                TransformCandidate::from_steps(
                    "loose",
                    vec![
                        Step::Drop {
                            fields: vec!["a".to_string()],
                        },
                        Step::Default {
                            field: "b".to_string(),
                            value: json!(0),
                        },
                        Step::Coerce {
                            field: "b".to_string(),
                            to: ferry_etl::transform::ValueKind::String,
                        },
                    ],
                ),
            ],
        )
        .unwrap();

        let first = selector.select_and_apply(&records).unwrap().unwrap();
        let second = selector.select_and_apply(&records).unwrap().unwrap();

        prop_assert_eq!(&first.candidate, "loose");
        prop_assert_eq!(first.results, second.results);
    }
}
