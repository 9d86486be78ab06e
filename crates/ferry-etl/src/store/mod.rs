//! Persistence and validation collaborator
//!
//! The pipeline only depends on the [`Store`] trait. [`SchemaStore`] is the
//! reference implementation: declared schemas, in-memory tables and JSON
//! Lines files on disk.

pub mod memory;
pub mod schema;

pub use memory::{DuplicatePolicy, SchemaStore};
pub use schema::{EntitySchema, FieldKind, FieldSpec};

use serde::Serialize;
use std::fmt;

use crate::error::ValidationErrors;
use crate::media::MediaFile;
use crate::record::TransformedRecord;
use ferry_common::{EntityType, RecordKey};

/// Handle of a committed record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityRef {
    pub entity: EntityType,
    pub key: RecordKey,
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity, self.key)
    }
}

/// What a store did with a valid record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreResponse {
    Committed(EntityRef),
    /// Left alone on purpose, e.g. an existing key under the skip policy
    Ignored(String),
}

/// Validate and persist one record at a time.
///
/// Each call is its own transaction: a failure leaves earlier commits in
/// place.
pub trait Store {
    fn persist(
        &mut self,
        entity: &EntityType,
        record: &TransformedRecord,
        files: &[MediaFile],
    ) -> Result<StoreResponse, ValidationErrors>;

    /// Delete every record of `entity`, returning how many were removed
    fn purge(&mut self, entity: &EntityType) -> usize;
}
