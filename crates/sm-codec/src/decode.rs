use bytes::Bytes;
use chrono::{DateTime, Utc};
use sm_context::RecordHandle;
use sm_types::{RecordId, RelationshipValue, ScalarValue, Value};

use crate::error::{DecodeError, DecodeResult};

/// A type that can be built from a record's current fields.
///
/// Implementations must read only the record's fields, so decoding the same
/// record state twice yields equal values.
pub trait Decode: Sized {
    fn decode(record: &RecordHandle) -> DecodeResult<Self>;
}

/// Decode every record, stopping at the first failure.
pub fn decode_all<'a, T: Decode>(
    records: impl IntoIterator<Item = &'a RecordHandle>,
) -> DecodeResult<Vec<T>> {
    records.into_iter().map(T::decode).collect()
}

/// Typed access to the fields of one record.
///
/// Every accessor reports the entity and field name in its error, so a
/// failed decode says exactly which field was at fault.
pub struct FieldReader<'a> {
    record: &'a RecordHandle,
}

impl<'a> FieldReader<'a> {
    pub fn new(record: &'a RecordHandle) -> Self {
        Self { record }
    }

    /// Like [`new`](Self::new), but fail unless the record is of `entity`.
    pub fn for_entity(record: &'a RecordHandle, entity: &str) -> DecodeResult<Self> {
        if record.entity_name() != entity {
            return Err(DecodeError::WrongEntity {
                expected: entity.to_string(),
                found: record.entity_name().to_string(),
            });
        }
        Ok(Self::new(record))
    }

    pub fn record(&self) -> &RecordHandle {
        self.record
    }

    /// The raw value of `field`.
    pub fn value(&self, field: &str) -> DecodeResult<Value> {
        self.record.field(field).map_err(DecodeError::from)
    }

    pub fn required_string(&self, field: &str) -> DecodeResult<String> {
        self.required(field, "string", |s| s.as_str().map(str::to_string))
    }

    pub fn optional_string(&self, field: &str) -> DecodeResult<Option<String>> {
        self.optional(field, "string", |s| s.as_str().map(str::to_string))
    }

    pub fn required_i64(&self, field: &str) -> DecodeResult<i64> {
        self.required(field, "integer", ScalarValue::as_i64)
    }

    pub fn optional_i64(&self, field: &str) -> DecodeResult<Option<i64>> {
        self.optional(field, "integer", ScalarValue::as_i64)
    }

    pub fn required_f64(&self, field: &str) -> DecodeResult<f64> {
        self.required(field, "double", ScalarValue::as_f64)
    }

    pub fn required_bool(&self, field: &str) -> DecodeResult<bool> {
        self.required(field, "boolean", ScalarValue::as_bool)
    }

    pub fn optional_bool(&self, field: &str) -> DecodeResult<Option<bool>> {
        self.optional(field, "boolean", ScalarValue::as_bool)
    }

    pub fn required_date(&self, field: &str) -> DecodeResult<DateTime<Utc>> {
        self.required(field, "date", |s| s.as_date().copied())
    }

    pub fn optional_data(&self, field: &str) -> DecodeResult<Option<Bytes>> {
        self.optional(field, "data", |s| s.as_data().cloned())
    }

    /// A transformable field holding a JSON array of strings.
    ///
    /// An unset field reads as an empty list.
    pub fn string_list(&self, field: &str) -> DecodeResult<Vec<String>> {
        let Some(json) = self.optional(field, "transformable", |s| s.as_transformable().cloned())?
        else {
            return Ok(Vec::new());
        };
        let items = json.as_array().ok_or_else(|| DecodeError::Invalid {
            field: field.to_string(),
            reason: "expected a JSON array".to_string(),
        })?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| DecodeError::Invalid {
                        field: field.to_string(),
                        reason: format!("non-string element {item}"),
                    })
            })
            .collect()
    }

    /// The target of a to-one relationship, if set.
    pub fn to_one(&self, field: &str) -> DecodeResult<Option<RecordId>> {
        match self.value(field)? {
            Value::Null => Ok(None),
            Value::Relationship(RelationshipValue::ToOne(id)) => Ok(Some(id)),
            other => Err(self.mismatch(field, "to-one", &other)),
        }
    }

    /// The targets of a to-many relationship; empty if unset.
    pub fn to_many(&self, field: &str) -> DecodeResult<Vec<RecordId>> {
        match self.value(field)? {
            Value::Null => Ok(Vec::new()),
            Value::Relationship(RelationshipValue::ToMany(ids)) => Ok(ids),
            other => Err(self.mismatch(field, "to-many", &other)),
        }
    }

    fn required<T>(
        &self,
        field: &str,
        expected: &'static str,
        extract: impl Fn(&ScalarValue) -> Option<T>,
    ) -> DecodeResult<T> {
        self.optional(field, expected, extract)?
            .ok_or_else(|| DecodeError::MissingField {
                entity: self.record.entity_name().to_string(),
                field: field.to_string(),
            })
    }

    fn optional<T>(
        &self,
        field: &str,
        expected: &'static str,
        extract: impl Fn(&ScalarValue) -> Option<T>,
    ) -> DecodeResult<Option<T>> {
        let value = self.value(field)?;
        if value.is_null() {
            return Ok(None);
        }
        value
            .as_scalar()
            .and_then(&extract)
            .map(Some)
            .ok_or_else(|| self.mismatch(field, expected, &value))
    }

    fn mismatch(&self, field: &str, expected: &'static str, found: &Value) -> DecodeError {
        DecodeError::TypeMismatch {
            entity: self.record.entity_name().to_string(),
            field: field.to_string(),
            expected,
            found: found.type_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sm_context::{Context, ContextError, EntityDescription, Model};
    use sm_types::{FieldMap, ScalarKind};

    fn context() -> Context {
        Context::with_model(
            Model::new().with_entity(
                EntityDescription::new("Discussion")
                    .attribute("id", ScalarKind::String)
                    .attribute("subject", ScalarKind::String)
                    .attribute("pinned", ScalarKind::Boolean)
                    .attribute("score", ScalarKind::Integer)
                    .attribute("tags", ScalarKind::Transformable)
                    .to_one("author", "User")
                    .to_many("comments", "Comment"),
            ),
        )
    }

    fn insert(ctx: &Context, fields: &[(&str, Value)]) -> RecordHandle {
        let fields: FieldMap = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        ctx.insert("Discussion", fields).unwrap()
    }

    #[test]
    fn reads_typed_fields() {
        let ctx = context();
        let author = RecordId::new();
        let r = insert(
            &ctx,
            &[
                ("id", Value::from("D1")),
                ("pinned", Value::from(true)),
                ("score", Value::from(12i64)),
                ("tags", Value::from(serde_json::json!(["rust", "core"]))),
                ("author", Value::from(RelationshipValue::ToOne(author))),
            ],
        );
        let reader = FieldReader::for_entity(&r, "Discussion").unwrap();
        assert_eq!(reader.required_string("id").unwrap(), "D1");
        assert_eq!(reader.optional_string("subject").unwrap(), None);
        assert!(reader.required_bool("pinned").unwrap());
        assert_eq!(reader.required_i64("score").unwrap(), 12);
        assert_eq!(reader.required_f64("score").unwrap(), 12.0);
        assert_eq!(reader.string_list("tags").unwrap(), vec!["rust", "core"]);
        assert_eq!(reader.to_one("author").unwrap(), Some(author));
        assert!(reader.to_many("comments").unwrap().is_empty());
    }

    #[test]
    fn missing_required_field() {
        let ctx = context();
        let r = insert(&ctx, &[]);
        let err = FieldReader::new(&r).required_string("subject").unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingField {
                entity: "Discussion".into(),
                field: "subject".into()
            }
        );
    }

    #[test]
    fn wrong_kind_is_a_mismatch() {
        let ctx = context();
        let r = insert(&ctx, &[("score", Value::from(3i64))]);
        let err = FieldReader::new(&r).required_string("score").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TypeMismatch {
                expected: "string",
                found: "integer",
                ..
            }
        ));
    }

    #[test]
    fn undeclared_field_surfaces_context_error() {
        let ctx = context();
        let r = insert(&ctx, &[]);
        let err = FieldReader::new(&r).required_string("title").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Context(ContextError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn wrong_entity_is_rejected() {
        let ctx = context();
        let r = insert(&ctx, &[]);
        let err = FieldReader::for_entity(&r, "Comment").err().unwrap();
        assert_eq!(
            err,
            DecodeError::WrongEntity {
                expected: "Comment".into(),
                found: "Discussion".into()
            }
        );
    }

    #[test]
    fn string_list_rejects_non_strings() {
        let ctx = context();
        let r = insert(&ctx, &[("tags", Value::from(serde_json::json!(["a", 1])))]);
        assert!(matches!(
            FieldReader::new(&r).string_list("tags"),
            Err(DecodeError::Invalid { .. })
        ));

        let r = insert(&ctx, &[("tags", Value::from(serde_json::json!({"a": 1})))]);
        assert!(matches!(
            FieldReader::new(&r).string_list("tags"),
            Err(DecodeError::Invalid { .. })
        ));
    }

    #[test]
    fn decode_all_stops_at_first_error() {
        struct Subject(String);
        impl Decode for Subject {
            fn decode(record: &RecordHandle) -> DecodeResult<Self> {
                FieldReader::new(record).required_string("subject").map(Subject)
            }
        }

        let ctx = context();
        let a = insert(&ctx, &[("subject", Value::from("a"))]);
        let b = insert(&ctx, &[("subject", Value::from("b"))]);
        let decoded: Vec<Subject> = decode_all([&a, &b]).unwrap();
        assert_eq!(
            decoded.iter().map(|s| s.0.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );

        let empty = insert(&ctx, &[]);
        assert!(decode_all::<Subject>([&a, &empty, &b]).is_err());
    }
}
