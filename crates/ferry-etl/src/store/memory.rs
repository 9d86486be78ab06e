//! In-memory reference store backed by JSON Lines files

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use super::schema::EntitySchema;
use super::{EntityRef, Store, StoreResponse};
use crate::error::{EtlError, Result, ValidationErrors};
use crate::media::MediaFile;
use crate::record::{Fields, TransformedRecord, KEY_FIELD};
use ferry_common::{EntityType, RecordKey};

pub const DUPLICATE_KEY: &str = "record with this key already exists";
pub const KEYS_EXHAUSTED: &str = "no integer key is left for this record";

/// What to do with a record whose key is already committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Validation error on the key field
    #[default]
    Reject,
    /// Leave the existing record, report the new one as skipped
    Skip,
    /// Overwrite the existing record
    Replace,
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(DuplicatePolicy::Reject),
            "skip" => Ok(DuplicatePolicy::Skip),
            "replace" => Ok(DuplicatePolicy::Replace),
            _ => Err(format!("Invalid duplicate policy: {}", s)),
        }
    }
}

/// Committed records of one entity, in commit order
#[derive(Debug, Clone, Default)]
struct Table {
    rows: Vec<Fields>,
    index: BTreeMap<RecordKey, usize>,
}

impl Table {
    fn upsert(&mut self, key: RecordKey, fields: Fields) {
        match self.index.get(&key) {
            Some(&row) => self.rows[row] = fields,
            None => {
                self.index.insert(key, self.rows.len());
                self.rows.push(fields);
            }
        }
    }

    /// One past the largest integer key, or `None` once `i64::MAX` is taken
    fn next_key(&self) -> Option<RecordKey> {
        let max = self
            .index
            .keys()
            .filter_map(|key| match key {
                RecordKey::Int(n) => Some(*n),
                RecordKey::Text(_) => None,
            })
            .max()
            .unwrap_or(0);
        max.checked_add(1).map(RecordKey::Int)
    }
}

/// Validating store holding one table per entity
#[derive(Debug, Clone, Default)]
pub struct SchemaStore {
    schemas: BTreeMap<EntityType, EntitySchema>,
    tables: BTreeMap<EntityType, Table>,
    duplicates: DuplicatePolicy,
    clock: Option<DateTime<Utc>>,
}

impl SchemaStore {
    pub fn new(schemas: impl IntoIterator<Item = EntitySchema>) -> Self {
        Self {
            schemas: schemas
                .into_iter()
                .map(|schema| (schema.entity.clone(), schema))
                .collect(),
            ..Self::default()
        }
    }

    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    /// Use a fixed commit time for timestamp fields
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    pub fn duplicates(&self) -> DuplicatePolicy {
        self.duplicates
    }

    pub fn get(&self, entity: &EntityType, key: &RecordKey) -> Option<&Fields> {
        let table = self.tables.get(entity)?;
        table.index.get(key).map(|&row| &table.rows[row])
    }

    /// Committed records of `entity`, in commit order
    pub fn records(&self, entity: &EntityType) -> impl Iterator<Item = &Fields> {
        self.tables
            .get(entity)
            .into_iter()
            .flat_map(|table| table.rows.iter())
    }

    pub fn count(&self, entity: &EntityType) -> usize {
        self.tables.get(entity).map_or(0, |table| table.rows.len())
    }

    fn contains(&self, entity: &EntityType, key: &RecordKey) -> bool {
        self.tables
            .get(entity)
            .is_some_and(|table| table.index.contains_key(key))
    }

    /// Entities with a schema or a table, in name order
    fn entities(&self) -> Vec<EntityType> {
        let mut entities: Vec<EntityType> = self.schemas.keys().cloned().collect();
        for entity in self.tables.keys() {
            if !self.schemas.contains_key(entity) {
                entities.push(entity.clone());
            }
        }
        entities.sort();
        entities
    }

    /// Read `<entity>.jsonl` files written by a previous run.
    ///
    /// Records are taken as already valid. Returns the number loaded.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        let mut loaded = 0;

        for entity in self.entities() {
            let path = dir.join(format!("{}.jsonl", entity));
            if !path.is_file() {
                continue;
            }

            let table = self.tables.entry(entity.clone()).or_default();
            for (line, row) in serde_jsonlines::json_lines::<Fields, _>(&path)?.enumerate() {
                let fields = row?;
                let key = fields
                    .get(KEY_FIELD)
                    .ok_or_else(|| {
                        EtlError::Store(format!(
                            "{} line {}: record has no '{}'",
                            path.display(),
                            line + 1,
                            KEY_FIELD
                        ))
                    })
                    .and_then(|value| RecordKey::from_value(value).map_err(EtlError::from))?;
                table.upsert(key, fields);
                loaded += 1;
            }

            debug!(%entity, records = table.rows.len(), "Loaded existing records");
        }

        Ok(loaded)
    }

    /// Write each entity's records to `<dir>/<entity>.jsonl`.
    ///
    /// Entities without records get an empty file so a purge is persisted.
    pub fn export_dir(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        for entity in self.entities() {
            let path = dir.join(format!("{}.jsonl", entity));
            serde_jsonlines::write_json_lines(&path, self.records(&entity))?;
        }

        info!(dir = %dir.display(), "Exported store");
        Ok(())
    }
}

impl Store for SchemaStore {
    fn persist(
        &mut self,
        entity: &EntityType,
        record: &TransformedRecord,
        files: &[MediaFile],
    ) -> std::result::Result<StoreResponse, ValidationErrors> {
        let key = match record.key_value() {
            Some(value) => RecordKey::from_value(value)
                .map_err(|_| ValidationErrors::single(KEY_FIELD, "Enter a valid key."))?,
            None => self
                .tables
                .get(entity)
                .map_or(Some(RecordKey::Int(1)), Table::next_key)
                .ok_or_else(|| ValidationErrors::single(KEY_FIELD, KEYS_EXHAUSTED))?,
        };

        let duplicate = self.contains(entity, &key);
        if duplicate && self.duplicates == DuplicatePolicy::Skip {
            return Ok(StoreResponse::Ignored(format!(
                "{}#{} already exists",
                entity, key
            )));
        }

        let permissive;
        let schema = match self.schemas.get(entity) {
            Some(schema) => schema,
            None => {
                permissive = EntitySchema::new(entity.clone());
                &permissive
            }
        };

        let now = self.clock.unwrap_or_else(Utc::now);
        let cleaned = schema.clean(record, files, now, |target, referenced| {
            self.contains(target, referenced)
        });

        let cleaned = match (cleaned, duplicate && self.duplicates == DuplicatePolicy::Reject) {
            (Ok(cleaned), false) => cleaned,
            (Ok(_), true) => return Err(ValidationErrors::single(KEY_FIELD, DUPLICATE_KEY)),
            (Err(mut errors), true) => {
                errors.add(KEY_FIELD, DUPLICATE_KEY);
                return Err(errors);
            }
            (Err(errors), false) => return Err(errors),
        };

        let mut fields = Fields::new();
        fields.insert(KEY_FIELD.to_string(), key.to_value());
        for (name, value) in cleaned {
            if name != KEY_FIELD {
                fields.insert(name, value);
            }
        }

        self.tables
            .entry(entity.clone())
            .or_default()
            .upsert(key.clone(), fields);

        Ok(StoreResponse::Committed(EntityRef {
            entity: entity.clone(),
            key,
        }))
    }

    fn purge(&mut self, entity: &EntityType) -> usize {
        self.tables
            .remove(entity)
            .map_or(0, |table| table.rows.len())
    }
}
