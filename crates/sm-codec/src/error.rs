use sm_context::ContextError;
use thiserror::Error;

/// Errors produced while decoding a record into a typed value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A required field holds no value.
    #[error("missing required field {entity}.{field}")]
    MissingField { entity: String, field: String },

    /// A field holds a value of the wrong kind.
    #[error("type mismatch for {entity}.{field}: expected {expected}, found {found}")]
    TypeMismatch {
        entity: String,
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The record is not of the entity the decoder expects.
    #[error("wrong entity: expected {expected}, found {found}")]
    WrongEntity { expected: String, found: String },

    /// A field value is well-typed but not acceptable.
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },

    /// The record could not be read.
    #[error("context error: {0}")]
    Context(#[from] ContextError),
}

/// Errors produced while encoding a typed value into a context.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("context error: {0}")]
    Context(#[from] ContextError),

    #[error("invalid value: {0}")]
    Invalid(String),
}

pub type DecodeResult<T> = Result<T, DecodeError>;

pub type EncodeResult<T> = Result<T, EncodeError>;
