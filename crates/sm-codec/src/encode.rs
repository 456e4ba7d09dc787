use sm_context::{Context, RecordHandle};
use sm_types::{FieldMap, ScalarValue, Value};
use tracing::debug;

use crate::error::EncodeResult;

/// A type that can be written into a context.
pub trait Encode {
    /// Write `self` into `context` and return the record holding it.
    ///
    /// Encoding the same value twice should update the same record rather
    /// than insert a duplicate; [`upsert`] does this by identifier.
    fn encode(&self, context: &Context) -> EncodeResult<RecordHandle>;
}

/// Encode every value in order, stopping at the first failure.
pub fn encode_all<'a, T: Encode + 'a>(
    values: impl IntoIterator<Item = &'a T>,
    context: &Context,
) -> EncodeResult<Vec<RecordHandle>> {
    values.into_iter().map(|v| v.encode(context)).collect()
}

/// Find the record of `entity` whose `key` field equals `value` and write
/// `fields` into it, or insert a new record with `fields` plus the key.
pub fn upsert(
    context: &Context,
    entity: &str,
    key: &str,
    value: impl Into<ScalarValue>,
    mut fields: FieldMap,
) -> EncodeResult<RecordHandle> {
    let value = value.into();
    if let Some(record) = context.find_first(entity, key, &value)? {
        fields.remove(key);
        context.set_fields(&record, fields)?;
        debug!(record = %record, key, "upsert updated existing record");
        return Ok(record);
    }

    fields.insert(key.to_string(), Value::Attribute(value));
    let record = context.insert(entity, fields)?;
    debug!(record = %record, key, "upsert inserted record");
    Ok(record)
}

/// A transformable value holding a JSON array of strings, the inverse of
/// [`FieldReader::string_list`](crate::FieldReader::string_list).
pub fn string_list<S: AsRef<str>>(items: &[S]) -> Value {
    let json = items
        .iter()
        .map(|s| serde_json::Value::String(s.as_ref().to_string()))
        .collect();
    Value::from(serde_json::Value::Array(json))
}
