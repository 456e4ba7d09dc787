//! Foundation types for structmirror.
//!
//! This crate provides the identifiers and the value model shared by every
//! other structmirror crate. Records held by a persistence context carry their
//! fields as [`Value`]s; typed structures are decoded from and encoded into
//! these values.
//!
//! # Key Types
//!
//! - [`RecordId`]: Stable identity of one record within a context (UUID v7)
//! - [`ContextId`]: Identity of a persistence context (UUID v7)
//! - [`Value`]: A field value: null, an attribute, or a relationship
//! - [`ScalarValue`]: Attribute values, also used for identifier matching
//! - [`RelationshipValue`]: To-one and to-many references to other records
//! - [`FieldMap`]: Ordered field name to value mapping

pub mod error;
pub mod id;
pub mod value;

pub use error::TypeError;
pub use id::{ContextId, RecordId};
pub use value::{FieldMap, RelationshipValue, ScalarKind, ScalarValue, Value};
