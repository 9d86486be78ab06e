//! Pipeline configuration files
//!
//! A pipeline is declared in TOML (or YAML): how to read the source, what to
//! do with duplicate keys, and the ordered entities with their target fields
//! and ordered transform candidates.
//!
//! ```toml
//! duplicates = "skip"
//!
//! [source]
//! format = "dumpdata"
//!
//! [[entities]]
//! name = "shop.category"
//! tag = "category"
//! fields.title = { kind = "text", max_length = 100, required = true }
//!
//! [[entities.candidates]]
//! name = "v2"
//!
//! [[entities.candidates]]
//! name = "v1"
//! steps = [{ op = "rename", from = "name", to = "title" }]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ConfigError;
use crate::extract::SourceConfig;
use crate::registry::{EntityConfig, Registry};
use crate::store::{DuplicatePolicy, EntitySchema, FieldSpec, SchemaStore};
use crate::transform::{Step, TransformCandidate};
use ferry_common::EntityType;

/// Root of a pipeline configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub duplicates: DuplicatePolicy,

    #[serde(default)]
    pub source: SourceConfig,

    /// Entities in load order
    #[serde(default)]
    pub entities: Vec<EntityDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDecl {
    pub name: EntityType,

    /// Source tag, when it differs from the name
    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default = "default_strict")]
    pub strict: bool,

    /// Declared target fields; none means anything is accepted
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,

    /// Candidates in probing order
    #[serde(default)]
    pub candidates: Vec<CandidateDecl>,
}

fn default_strict() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDecl {
    pub name: String,

    #[serde(default)]
    pub ignore_missing: Vec<String>,

    #[serde(default)]
    pub ignore_extra: Vec<String>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

impl CandidateDecl {
    fn build(&self) -> TransformCandidate {
        TransformCandidate::from_steps(self.name.clone(), self.steps.clone())
            .ignore_missing(self.ignore_missing.iter().cloned())
            .ignore_extra(self.ignore_extra.iter().cloned())
    }
}

impl EntityDecl {
    fn schema(&self) -> EntitySchema {
        EntitySchema {
            entity: self.name.clone(),
            fields: self.fields.clone(),
        }
    }

    fn entity_config(&self) -> EntityConfig {
        let mut config = EntityConfig::new(
            self.name.clone(),
            self.candidates.iter().map(CandidateDecl::build).collect(),
        )
        .with_schema(self.schema())
        .strict(self.strict);

        if let Some(tag) = &self.tag {
            config = config.with_source_tag(tag.clone());
        }
        config
    }
}

impl PipelineConfig {
    /// Load and validate a `.toml`, `.yaml` or `.yml` file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::parse_yaml(&text, path)?,
            _ => Self::parse_toml(&text, path)?,
        };

        debug!(path = %path.display(), entities = config.entities.len(), "Loaded pipeline config");
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config = Self::parse_toml(text, Path::new("<inline>"))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate YAML text
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config = Self::parse_yaml(text, Path::new("<inline>"))?;
        config.validate()?;
        Ok(config)
    }

    fn parse_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::from(path),
            message: e.message().to_string(),
        })
    }

    fn parse_yaml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::from(path),
            message: e.to_string(),
        })
    }

    /// Report the first structural problem, if any
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entities.is_empty() {
            return Err(ConfigError::NoEntities);
        }

        let mut seen = BTreeSet::new();
        for entity in &self.entities {
            if !seen.insert(&entity.name) {
                return Err(ConfigError::DuplicateEntity(entity.name.clone()));
            }
            if entity.candidates.is_empty() {
                return Err(ConfigError::NoCandidates(entity.name.clone()));
            }
        }

        for entity in &self.entities {
            for (field, target) in entity.schema().references() {
                if !seen.contains(target) {
                    return Err(ConfigError::UnknownReference {
                        entity: entity.name.clone(),
                        field: field.to_string(),
                        target: target.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Registry with one entry per declared entity, in declaration order
    pub fn registry(&self) -> Result<Registry, ConfigError> {
        self.validate()?;

        let mut registry = Registry::new();
        for entity in &self.entities {
            registry.register(entity.entity_config())?;
        }
        registry.check_references()?;
        Ok(registry)
    }

    /// Empty store holding the declared schemas
    pub fn store(&self) -> SchemaStore {
        SchemaStore::new(self.entities.iter().map(EntityDecl::schema))
            .with_duplicates(self.duplicates)
    }
}
