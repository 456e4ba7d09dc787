//! Entity descriptions.
//!
//! A [`Model`] names every entity a context can hold and the fields each
//! entity declares. Field lookups are resolved against the description, so an
//! undeclared field is always an error rather than an implicit null.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sm_types::{RelationshipValue, ScalarKind, Value};

use crate::error::{ContextError, Result};

/// The declared kind of one entity field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// An attribute of the given kind.
    Attribute(ScalarKind),
    /// A to-one relationship to the named entity.
    ToOne(String),
    /// A to-many relationship to the named entity.
    ToMany(String),
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute(kind) => write!(f, "{kind}"),
            Self::ToOne(dest) => write!(f, "to-one {dest}"),
            Self::ToMany(dest) => write!(f, "to-many {dest}"),
        }
    }
}

impl FieldKind {
    /// Returns `true` if `value` may be stored in a field of this kind.
    ///
    /// Null is accepted by every field.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Attribute(kind), Value::Attribute(scalar)) => scalar.kind() == *kind,
            (Self::ToOne(_), Value::Relationship(RelationshipValue::ToOne(_))) => true,
            (Self::ToMany(_), Value::Relationship(RelationshipValue::ToMany(_))) => true,
            _ => false,
        }
    }
}

/// Description of one entity: its name and declared fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescription {
    name: String,
    fields: BTreeMap<String, FieldKind>,
}

impl EntityDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Declare an attribute field.
    pub fn attribute(mut self, name: impl Into<String>, kind: ScalarKind) -> Self {
        self.fields.insert(name.into(), FieldKind::Attribute(kind));
        self
    }

    /// Declare a to-one relationship to `destination`.
    pub fn to_one(mut self, name: impl Into<String>, destination: impl Into<String>) -> Self {
        self.fields
            .insert(name.into(), FieldKind::ToOne(destination.into()));
        self
    }

    /// Declare a to-many relationship to `destination`.
    pub fn to_many(mut self, name: impl Into<String>, destination: impl Into<String>) -> Self {
        self.fields
            .insert(name.into(), FieldKind::ToMany(destination.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_kind(&self, field: &str) -> Option<&FieldKind> {
        self.fields.get(field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Declared field names, in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Check that `value` may be stored in `field`.
    pub fn validate(&self, field: &str, value: &Value) -> Result<()> {
        let kind = self
            .field_kind(field)
            .ok_or_else(|| ContextError::FieldNotFound {
                entity: self.name.clone(),
                field: field.to_string(),
            })?;
        if kind.accepts(value) {
            Ok(())
        } else {
            Err(ContextError::TypeMismatch {
                entity: self.name.clone(),
                field: field.to_string(),
                expected: kind.to_string(),
                found: value.type_name(),
            })
        }
    }
}

/// The set of entities a context can hold.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    entities: BTreeMap<String, EntityDescription>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity description, replacing any previous one with that name.
    pub fn with_entity(mut self, entity: EntityDescription) -> Self {
        self.entities.insert(entity.name.clone(), entity);
        self
    }

    pub fn entity(&self, name: &str) -> Option<&EntityDescription> {
        self.entities.get(name)
    }

    /// Look up an entity or fail with [`ContextError::UnknownEntity`].
    pub fn require_entity(&self, name: &str) -> Result<&EntityDescription> {
        self.entity(name)
            .ok_or_else(|| ContextError::UnknownEntity(name.to_string()))
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }
}
