//! Shared references to live records.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use sm_types::{ContextId, FieldMap, RecordId, Value};

use crate::error::{ContextError, Result};
use crate::model::EntityDescription;

struct RecordInner {
    id: RecordId,
    /// Insertion sequence within the owning context.
    seq: u64,
    context: ContextId,
    entity: Arc<EntityDescription>,
    fields: RwLock<FieldMap>,
    deleted: AtomicBool,
}

/// A reference to one record held by a [`Context`](crate::Context).
///
/// Handles are cheap to clone; every clone observes the same live field
/// values. Equality and hashing are by record identity, never by content.
#[derive(Clone)]
pub struct RecordHandle(Arc<RecordInner>);

impl RecordHandle {
    pub(crate) fn new(
        context: ContextId,
        seq: u64,
        entity: Arc<EntityDescription>,
        fields: FieldMap,
    ) -> Self {
        Self(Arc::new(RecordInner {
            id: RecordId::new(),
            seq,
            context,
            entity,
            fields: RwLock::new(fields),
            deleted: AtomicBool::new(false),
        }))
    }

    pub fn id(&self) -> RecordId {
        self.0.id
    }

    pub(crate) fn seq(&self) -> u64 {
        self.0.seq
    }

    /// The context this record belongs to.
    pub fn context_id(&self) -> ContextId {
        self.0.context
    }

    pub fn entity(&self) -> &EntityDescription {
        &self.0.entity
    }

    pub fn entity_name(&self) -> &str {
        self.0.entity.name()
    }

    /// Read the current value of `name`.
    ///
    /// A declared field that was never set reads as [`Value::Null`]. A field
    /// the entity does not declare fails with [`ContextError::FieldNotFound`].
    pub fn field(&self, name: &str) -> Result<Value> {
        if !self.0.entity.has_field(name) {
            return Err(ContextError::FieldNotFound {
                entity: self.entity_name().to_string(),
                field: name.to_string(),
            });
        }
        Ok(self.0.fields.read().get(name).cloned().unwrap_or_default())
    }

    /// Snapshot of every field that currently holds a value.
    pub fn fields(&self) -> FieldMap {
        self.0.fields.read().clone()
    }

    /// Whether the record has been deleted from its context.
    pub fn is_deleted(&self) -> bool {
        self.0.deleted.load(Ordering::Acquire)
    }

    /// Store `value` without validation. Returns `true` if the stored value
    /// changed.
    pub(crate) fn write_field(&self, name: &str, value: Value) -> bool {
        let mut fields = self.0.fields.write();
        let changed = fields.get(name).map_or(!value.is_null(), |old| !old.is_same_as(&value));
        if value.is_null() {
            fields.remove(name);
        } else {
            fields.insert(name.to_string(), value);
        }
        changed
    }

    pub(crate) fn mark_deleted(&self) -> bool {
        !self.0.deleted.swap(true, Ordering::AcqRel)
    }
}

impl PartialEq for RecordHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for RecordHandle {}

impl Hash for RecordHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordHandle")
            .field("id", &self.0.id)
            .field("entity", &self.entity_name())
            .field("deleted", &self.is_deleted())
            .finish()
    }
}

impl fmt::Display for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_name(), self.0.id.short_id())
    }
}
