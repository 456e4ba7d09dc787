//! The attribute/relationship value model.
//!
//! Every field of a record holds a [`Value`]: either nothing ([`Value::Null`]),
//! an attribute ([`ScalarValue`]), or a relationship to other records
//! ([`RelationshipValue`]). Identifier matching only ever compares attributes.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::RecordId;

/// Ordered mapping of field names to values, as stored on a record.
pub type FieldMap = BTreeMap<String, Value>;

/// The declared kind of an attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    String,
    Integer,
    Double,
    Boolean,
    Data,
    Date,
    /// Arbitrary JSON-representable content.
    Transformable,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::Data => "data",
            Self::Date => "date",
            Self::Transformable => "transformable",
        }
    }
}

/// An attribute value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    Data(Bytes),
    Date(DateTime<Utc>),
    Transformable(serde_json::Value),
}

impl ScalarValue {
    /// The kind of this attribute.
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::String(_) => ScalarKind::String,
            Self::Integer(_) => ScalarKind::Integer,
            Self::Double(_) => ScalarKind::Double,
            Self::Boolean(_) => ScalarKind::Boolean,
            Self::Data(_) => ScalarKind::Data,
            Self::Date(_) => ScalarKind::Date,
            Self::Transformable(_) => ScalarKind::Transformable,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value as `f64`; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(n) => Some(*n),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&Bytes> {
        match self {
            Self::Data(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_transformable(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Transformable(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Double(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Data(d) => write!(f, "<{} bytes>", d.len()),
            Self::Date(d) => write!(f, "{}", d.to_rfc3339()),
            Self::Transformable(v) => write!(f, "{v}"),
        }
    }
}

/// A reference from one record to others.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipValue {
    ToOne(RecordId),
    ToMany(Vec<RecordId>),
}

impl RelationshipValue {
    /// All referenced record IDs, in order.
    pub fn ids(&self) -> Vec<RecordId> {
        match self {
            Self::ToOne(id) => vec![*id],
            Self::ToMany(ids) => ids.clone(),
        }
    }

    pub fn is_to_many(&self) -> bool {
        matches!(self, Self::ToMany(_))
    }
}

/// The value of one record field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Attribute(ScalarValue),
    Relationship(RelationshipValue),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The attribute, if this value holds one.
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Self::Attribute(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_relationship(&self) -> Option<&RelationshipValue> {
        match self {
            Self::Relationship(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(ScalarValue::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar().and_then(ScalarValue::as_i64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar().and_then(ScalarValue::as_bool)
    }

    /// Short name of the variant held, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Attribute(s) => s.kind().as_str(),
            Self::Relationship(RelationshipValue::ToOne(_)) => "to-one",
            Self::Relationship(RelationshipValue::ToMany(_)) => "to-many",
        }
    }

    /// Returns `true` if this value is the attribute `scalar`.
    ///
    /// Null and relationship values never equal an attribute.
    pub fn matches_scalar(&self, scalar: &ScalarValue) -> bool {
        self.as_scalar() == Some(scalar)
    }

    /// Whether storing `other` over `self` would leave the field unchanged.
    ///
    /// Like `==`, except doubles compare by bit pattern, so a NaN is the
    /// same as itself.
    pub fn is_same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (
                Self::Attribute(ScalarValue::Double(a)),
                Self::Attribute(ScalarValue::Double(b)),
            ) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }

    /// Take the attribute out of this value or report what was found instead.
    pub fn into_scalar(self) -> Result<ScalarValue, TypeError> {
        match self {
            Self::Attribute(s) => Ok(s),
            other => Err(TypeError::Mismatch {
                expected: "attribute",
                found: other.type_name(),
            }),
        }
    }
}

impl From<ScalarValue> for Value {
    fn from(value: ScalarValue) -> Self {
        Self::Attribute(value)
    }
}

impl From<RelationshipValue> for Value {
    fn from(value: RelationshipValue) -> Self {
        Self::Relationship(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

macro_rules! scalar_from {
    ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl From<$ty> for ScalarValue {
                fn from($v: $ty) -> Self {
                    $body
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Attribute(ScalarValue::from(v))
                }
            }
        )*
    };
}

scalar_from! {
    String => |v| ScalarValue::String(v),
    &str => |v| ScalarValue::String(v.to_string()),
    i64 => |v| ScalarValue::Integer(v),
    i32 => |v| ScalarValue::Integer(i64::from(v)),
    u32 => |v| ScalarValue::Integer(i64::from(v)),
    f64 => |v| ScalarValue::Double(v),
    bool => |v| ScalarValue::Boolean(v),
    Bytes => |v| ScalarValue::Data(v),
    Vec<u8> => |v| ScalarValue::Data(Bytes::from(v)),
    DateTime<Utc> => |v| ScalarValue::Date(v),
    serde_json::Value => |v| ScalarValue::Transformable(v),
}
