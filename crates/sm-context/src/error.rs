//! Error types for context operations.

use sm_types::{ContextId, RecordId};
use thiserror::Error;

/// Errors that can occur while working with a persistence context.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The entity has no field with this name.
    #[error("field not found: {entity}.{field}")]
    FieldNotFound { entity: String, field: String },

    /// The model does not describe an entity with this name.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// A value does not fit the declared kind of the field.
    #[error("type mismatch for {entity}.{field}: expected {expected}, found {found}")]
    TypeMismatch {
        entity: String,
        field: String,
        expected: String,
        found: &'static str,
    },

    /// The record has been deleted and can no longer be modified.
    #[error("record deleted: {0}")]
    RecordDeleted(RecordId),

    /// The record belongs to a different context.
    #[error("record {record} does not belong to {context}")]
    ForeignRecord { record: RecordId, context: ContextId },

    /// The context has been invalidated and accepts no further work.
    #[error("context invalidated: {0}")]
    Invalidated(ContextId),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Convenience type alias for context operations.
pub type Result<T> = std::result::Result<T, ContextError>;
