//! Schema registry.
//!
//! Every entity is described as data: ordered scalar fields plus ordered
//! relationships. The built-in domain ships as an embedded TOML model; any
//! other model with the same shape can be loaded at runtime.

use crate::endpoint::collection_segment;
use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

const BUILTIN_MODEL: &str = include_str!("../models/petclinic.toml");

/// Scalar field type. Drives the form input kind and value parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    Number,
    Email,
    Boolean,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Number => "number",
            FieldType::Email => "email",
            FieldType::Boolean => "boolean",
        }
    }

    /// Input hint shown next to an empty field.
    pub fn placeholder(&self) -> &'static str {
        match self {
            FieldType::Text => "",
            FieldType::Date => "YYYY-MM-DD",
            FieldType::DateTime => "YYYY-MM-DDTHH:MM:SS",
            FieldType::Number => "0",
            FieldType::Email => "name@example.com",
            FieldType::Boolean => "true / false",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// This entity stores a foreign key to the target.
    ParentReference,
    /// The target stores a foreign key back to this entity.
    NestedCollection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationshipDescriptor {
    pub target: String,
    pub kind: RelationshipKind,
}

impl RelationshipDescriptor {
    pub fn new(target: impl Into<String>, kind: RelationshipKind) -> Self {
        Self {
            target: target.into(),
            kind,
        }
    }

    /// Key of the relationship in caches and tabs.
    pub fn name(&self) -> String {
        self.target.to_lowercase()
    }

    /// Foreign key column a parent reference is stored under.
    pub fn foreign_key(&self) -> String {
        format!("{}_id", self.target.to_lowercase())
    }

    pub fn is_parent_reference(&self) -> bool {
        self.kind == RelationshipKind::ParentReference
    }

    pub fn is_nested_collection(&self) -> bool {
        self.kind == RelationshipKind::NestedCollection
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntitySchema {
    pub name: String,
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDescriptor>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldSpec::new(name, field_type));
        self
    }

    pub fn with_relationship(mut self, target: impl Into<String>, kind: RelationshipKind) -> Self {
        self.relationships
            .push(RelationshipDescriptor::new(target, kind));
        self
    }

    /// Path segment of the entity collection, e.g. `pets`.
    pub fn collection_segment(&self) -> String {
        collection_segment(&self.name)
    }

    pub fn parent_references(&self) -> impl Iterator<Item = &RelationshipDescriptor> {
        self.relationships.iter().filter(|r| r.is_parent_reference())
    }

    pub fn nested_collections(&self) -> impl Iterator<Item = &RelationshipDescriptor> {
        self.relationships.iter().filter(|r| r.is_nested_collection())
    }

    /// Look up a relationship by its lower-cased name.
    pub fn relationship(&self, name: &str) -> Option<&RelationshipDescriptor> {
        self.relationships
            .iter()
            .find(|r| r.target.eq_ignore_ascii_case(name))
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelFile {
    entities: Vec<EntitySchema>,
}

/// Read-only registry of every configured entity, in navigation order.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    entities: Vec<Arc<EntitySchema>>,
}

impl SchemaRegistry {
    pub fn new(entities: Vec<EntitySchema>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        for entity in &entities {
            if entity.name.trim().is_empty() {
                return Err(SchemaError::InvalidField {
                    entity: entity.name.clone(),
                    field: "name".to_string(),
                    reason: "entity name must not be empty".to_string(),
                });
            }
            if !seen.insert(entity.name.to_lowercase()) {
                return Err(SchemaError::DuplicateEntity(entity.name.clone()));
            }
            validate_fields(entity)?;
        }

        for entity in &entities {
            for rel in &entity.relationships {
                if !seen.contains(&rel.target.to_lowercase()) {
                    return Err(SchemaError::UnknownEntity(rel.target.clone()));
                }
            }
        }

        Ok(Self {
            entities: entities.into_iter().map(Arc::new).collect(),
        })
    }

    /// The embedded Owner / Pet / Vet / Visit model.
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::from_toml_str(BUILTIN_MODEL)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, SchemaError> {
        let model: ModelFile =
            toml::from_str(contents).map_err(|e| SchemaError::Parse(e.to_string()))?;
        Self::new(model.entities)
    }

    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SchemaError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Case-insensitive lookup over the configured entities.
    pub fn get_schema(&self, name: &str) -> Result<Arc<EntitySchema>, SchemaError> {
        self.entities
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| SchemaError::UnknownEntity(name.to_string()))
    }

    pub fn entities(&self) -> &[Arc<EntitySchema>] {
        &self.entities
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

fn validate_fields(entity: &EntitySchema) -> Result<(), SchemaError> {
    let mut names = HashSet::new();
    for field in &entity.fields {
        if field.name == "id" {
            return Err(SchemaError::InvalidField {
                entity: entity.name.clone(),
                field: field.name.clone(),
                reason: "id is implicit and must not be declared".to_string(),
            });
        }
        if field.name.trim().is_empty() {
            return Err(SchemaError::InvalidField {
                entity: entity.name.clone(),
                field: field.name.clone(),
                reason: "field name must not be empty".to_string(),
            });
        }
        if !names.insert(field.name.as_str()) {
            return Err(SchemaError::InvalidField {
                entity: entity.name.clone(),
                field: field.name.clone(),
                reason: "declared more than once".to_string(),
            });
        }
    }
    Ok(())
}
