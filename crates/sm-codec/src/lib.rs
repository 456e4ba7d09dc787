//! Conversion between typed structures and context records.
//!
//! - [`Decode`] builds a typed value from a record's current fields. It must
//!   be a pure function of those fields.
//! - [`Encode`] writes a typed value into a context and returns the record
//!   that now holds it.
//!
//! [`FieldReader`] and [`upsert`] cover the boilerplate most implementations
//! need: typed field access with precise errors, and find-or-insert by an
//! identifier field.

pub mod decode;
pub mod encode;
pub mod error;

pub use decode::{decode_all, Decode, FieldReader};
pub use encode::{encode_all, string_list, upsert, Encode};
pub use error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
