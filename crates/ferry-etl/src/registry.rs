//! Entity registry
//!
//! Maps each entity to its source tag, ordered candidates and target
//! schema. Registration order is the default loader order.

use crate::error::ConfigError;
use crate::load::Loader;
use crate::store::EntitySchema;
use crate::transform::TransformCandidate;
use ferry_common::EntityType;

/// Everything needed to load one entity
#[derive(Debug, Clone)]
pub struct EntityConfig {
    pub entity: EntityType,
    /// Discriminator value in the source; the entity name when `None`
    pub source_tag: Option<String>,
    pub candidates: Vec<TransformCandidate>,
    pub schema: EntitySchema,
    /// Probe candidates against the schema's declared fields
    pub strict: bool,
}

impl EntityConfig {
    pub fn new(entity: impl Into<EntityType>, candidates: Vec<TransformCandidate>) -> Self {
        let entity = entity.into();
        Self {
            schema: EntitySchema::new(entity.clone()),
            entity,
            source_tag: None,
            candidates,
            strict: true,
        }
    }

    pub fn with_source_tag(mut self, tag: impl Into<String>) -> Self {
        self.source_tag = Some(tag.into());
        self
    }

    pub fn with_schema(mut self, schema: EntitySchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn loader(&self) -> Result<Loader, ConfigError> {
        let mut loader = Loader::new(self.entity.clone(), self.candidates.clone())?;

        if let Some(tag) = &self.source_tag {
            loader = loader.with_source_tag(tag.clone());
        }
        if self.strict {
            if let Some(shape) = self.schema.shape() {
                loader = loader.with_shape(shape);
            }
        }

        Ok(loader)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<EntityConfig>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, config: EntityConfig) -> Result<(), ConfigError> {
        if self.get(&config.entity).is_some() {
            return Err(ConfigError::DuplicateEntity(config.entity));
        }
        if config.candidates.is_empty() {
            return Err(ConfigError::NoCandidates(config.entity));
        }

        self.entries.push(config);
        Ok(())
    }

    pub fn get(&self, entity: &EntityType) -> Option<&EntityConfig> {
        self.entries.iter().find(|e| &e.entity == entity)
    }

    /// Registered entities, in registration order
    pub fn entities(&self) -> impl Iterator<Item = &EntityType> {
        self.entries.iter().map(|e| &e.entity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every reference field points at a registered entity
    pub fn check_references(&self) -> Result<(), ConfigError> {
        for entry in &self.entries {
            for (field, target) in entry.schema.references() {
                if self.get(target).is_none() {
                    return Err(ConfigError::UnknownReference {
                        entity: entry.entity.clone(),
                        field: field.to_string(),
                        target: target.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Loaders in registration order
    pub fn loaders(&self) -> Result<Vec<Loader>, ConfigError> {
        if self.entries.is_empty() {
            return Err(ConfigError::NoEntities);
        }
        self.entries.iter().map(EntityConfig::loader).collect()
    }

    /// Loaders for `order`, which may be any subset of registered entities
    pub fn loaders_for(&self, order: &[EntityType]) -> Result<Vec<Loader>, ConfigError> {
        order
            .iter()
            .map(|entity| {
                self.get(entity)
                    .ok_or_else(|| ConfigError::UnknownEntity(entity.clone()))
                    .and_then(EntityConfig::loader)
            })
            .collect()
    }

    pub fn schemas(&self) -> Vec<EntitySchema> {
        self.entries.iter().map(|e| e.schema.clone()).collect()
    }
}
