//! The in-memory persistence context.
//!
//! [`Context`] holds live records, tracks pending changes, and turns each
//! processed set of changes into one [`ChangeBatch`] on its [`ChangeFeed`].
//! It provides no durability: `save` commits pending changes to the
//! in-memory record set and notifies observers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use sm_types::{ContextId, FieldMap, RecordId, ScalarValue, Value};
use tracing::{debug, info};

use crate::change::ChangeBatch;
use crate::config::ContextConfig;
use crate::error::{ContextError, Result};
use crate::feed::{ChangeCallback, ChangeFeed, ChangeNotifier, Subscription};
use crate::model::{EntityDescription, Model};
use crate::record::RecordHandle;

/// Changes accumulated since the last processed batch.
#[derive(Default)]
struct PendingChanges {
    inserted: HashSet<RecordHandle>,
    updated: HashSet<RecordHandle>,
    deleted: HashSet<RecordHandle>,
}

impl PendingChanges {
    fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    fn take(&mut self) -> ChangeBatch {
        let taken = std::mem::take(self);
        ChangeBatch {
            inserted: taken.inserted,
            updated: taken.updated,
            deleted: taken.deleted,
        }
    }
}

struct ContextState {
    records: HashMap<RecordId, RecordHandle>,
    next_seq: u64,
    pending: PendingChanges,
    invalidated: bool,
}

/// An in-memory unit of work over records described by a [`Model`].
///
/// Pending changes coalesce until processed:
/// - insert then update: reported as inserted only
/// - insert then delete: not reported at all
/// - update then delete: reported as deleted only
pub struct Context {
    id: ContextId,
    model: Model,
    entities: HashMap<String, Arc<EntityDescription>>,
    config: ContextConfig,
    feed: ChangeFeed,
    state: Mutex<ContextState>,
}

impl Context {
    pub fn new(model: Model, config: ContextConfig) -> Self {
        let id = ContextId::new();
        let entities = model
            .entity_names()
            .filter_map(|name| model.entity(name))
            .map(|entity| (entity.name().to_string(), Arc::new(entity.clone())))
            .collect();

        info!(context = %id, name = %config.name, "context created");

        Self {
            id,
            model,
            entities,
            config,
            feed: ChangeFeed::new(id),
            state: Mutex::new(ContextState {
                records: HashMap::new(),
                next_seq: 0,
                pending: PendingChanges::default(),
                invalidated: false,
            }),
        }
    }

    /// Create a context with the default configuration.
    pub fn with_model(model: Model) -> Self {
        Self::new(model, ContextConfig::default())
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// The feed change batches are published on.
    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Insert a new record of `entity` with the given fields.
    pub fn insert(&self, entity: &str, fields: FieldMap) -> Result<RecordHandle> {
        let description = self
            .entities
            .get(entity)
            .cloned()
            .ok_or_else(|| ContextError::UnknownEntity(entity.to_string()))?;
        for (name, value) in &fields {
            description.validate(name, value)?;
        }
        let fields = fields.into_iter().filter(|(_, v)| !v.is_null()).collect();

        let record = {
            let mut state = self.state.lock();
            self.ensure_valid(&state)?;
            let seq = state.next_seq;
            state.next_seq += 1;
            let record = RecordHandle::new(self.id, seq, description, fields);
            state.records.insert(record.id(), record.clone());
            state.pending.inserted.insert(record.clone());
            record
        };

        debug!(context = %self.id, record = %record, "record inserted");
        self.after_mutation()?;
        Ok(record)
    }

    /// Set one field of `record`.
    pub fn set(&self, record: &RecordHandle, field: &str, value: impl Into<Value>) -> Result<()> {
        let mut fields = FieldMap::new();
        fields.insert(field.to_string(), value.into());
        self.set_fields(record, fields)
    }

    /// Set several fields of `record` as one change.
    ///
    /// All values are validated before any is written. Writing values equal
    /// to the current ones records no change.
    pub fn set_fields(&self, record: &RecordHandle, fields: FieldMap) -> Result<()> {
        self.ensure_owned(record)?;
        for (name, value) in &fields {
            record.entity().validate(name, value)?;
        }

        let changed = {
            let mut state = self.state.lock();
            self.ensure_valid(&state)?;
            if record.is_deleted() {
                return Err(ContextError::RecordDeleted(record.id()));
            }
            let mut changed = false;
            for (name, value) in fields {
                changed |= record.write_field(&name, value);
            }
            if changed && !state.pending.inserted.contains(record) {
                state.pending.updated.insert(record.clone());
            }
            changed
        };

        if changed {
            debug!(context = %self.id, record = %record, "record updated");
            self.after_mutation()?;
        }
        Ok(())
    }

    /// Delete `record` from the context.
    pub fn delete(&self, record: &RecordHandle) -> Result<()> {
        self.ensure_owned(record)?;
        {
            let mut state = self.state.lock();
            self.ensure_valid(&state)?;
            if !record.mark_deleted() {
                return Err(ContextError::RecordDeleted(record.id()));
            }
            state.records.remove(&record.id());
            state.pending.updated.remove(record);
            if !state.pending.inserted.remove(record) {
                state.pending.deleted.insert(record.clone());
            }
        }

        debug!(context = %self.id, record = %record, "record deleted");
        self.after_mutation()
    }

    /// All live records of `entity`, in insertion order.
    pub fn fetch(&self, entity: &str) -> Result<Vec<RecordHandle>> {
        self.model.require_entity(entity)?;
        let state = self.state.lock();
        self.ensure_valid(&state)?;
        let mut records: Vec<RecordHandle> = state
            .records
            .values()
            .filter(|r| r.entity_name() == entity)
            .cloned()
            .collect();
        records.sort_by_key(RecordHandle::seq);
        Ok(records)
    }

    /// The first live record of `entity` whose `field` equals `value`.
    pub fn find_first(
        &self,
        entity: &str,
        field: &str,
        value: &ScalarValue,
    ) -> Result<Option<RecordHandle>> {
        let description = self.model.require_entity(entity)?;
        if !description.has_field(field) {
            return Err(ContextError::FieldNotFound {
                entity: entity.to_string(),
                field: field.to_string(),
            });
        }
        for record in self.fetch(entity)? {
            if record.field(field)?.matches_scalar(value) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Look up a live record by ID.
    pub fn record(&self, id: &RecordId) -> Option<RecordHandle> {
        self.state.lock().records.get(id).cloned()
    }

    /// Number of live records.
    pub fn record_count(&self) -> usize {
        self.state.lock().records.len()
    }

    /// Whether there are changes not yet published.
    pub fn has_changes(&self) -> bool {
        !self.state.lock().pending.is_empty()
    }

    /// Publish all pending changes as one batch and return it.
    ///
    /// An empty batch is returned, and nothing is published, when there are
    /// no pending changes.
    ///
    /// The batch is taken under the feed's delivery lock, so batches taken
    /// by different threads reach subscribers in the order they were taken.
    /// A call made from inside a subscriber callback queues its batch behind
    /// the one being delivered.
    pub fn process_pending_changes(&self) -> Result<ChangeBatch> {
        self.feed.publish_with(|| {
            let mut state = self.state.lock();
            self.ensure_valid(&state)?;
            Ok(state.pending.take())
        })
    }

    /// Commit pending changes and notify observers. Returns the number of
    /// records the committed batch touched.
    pub fn save(&self) -> Result<usize> {
        let batch = self.process_pending_changes()?;
        info!(context = %self.id, changes = %batch, "context saved");
        Ok(batch.len())
    }

    /// Invalidate the context. Pending changes are discarded, every
    /// subscription is dropped, and all later operations fail.
    pub fn invalidate(&self) {
        {
            let mut state = self.state.lock();
            if state.invalidated {
                return;
            }
            state.invalidated = true;
            state.pending = PendingChanges::default();
        }
        self.feed.invalidate();
        info!(context = %self.id, "context invalidated");
    }

    pub fn is_valid(&self) -> bool {
        !self.state.lock().invalidated
    }

    fn ensure_valid(&self, state: &ContextState) -> Result<()> {
        if state.invalidated {
            Err(ContextError::Invalidated(self.id))
        } else {
            Ok(())
        }
    }

    fn ensure_owned(&self, record: &RecordHandle) -> Result<()> {
        if record.context_id() == self.id {
            Ok(())
        } else {
            Err(ContextError::ForeignRecord {
                record: record.id(),
                context: self.id,
            })
        }
    }

    fn after_mutation(&self) -> Result<()> {
        if self.config.auto_process_changes {
            self.process_pending_changes()?;
        }
        Ok(())
    }
}

impl ChangeNotifier for Context {
    fn subscribe_changes(&self, callback: ChangeCallback) -> Result<Subscription> {
        if !self.is_valid() {
            return Err(ContextError::Invalidated(self.id));
        }
        self.feed.subscribe_changes(callback)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("records", &self.record_count())
            .finish()
    }
}
