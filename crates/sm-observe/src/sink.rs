use std::fmt;
use std::sync::Arc;

use sm_codec::DecodeError;

pub(crate) type ValueFn<T> = Arc<dyn Fn(&T) + Send + Sync>;
pub(crate) type DeletedFn = Arc<dyn Fn() + Send + Sync>;
pub(crate) type DecodeErrorFn = Arc<dyn Fn(&DecodeError) + Send + Sync>;

/// Callback slots an observer invokes during dispatch.
///
/// Every slot is optional; an empty slot means the event is dropped. Slots
/// are invoked synchronously on the publishing thread and never queued.
pub struct EventSink<T> {
    pub(crate) updated: Option<ValueFn<T>>,
    pub(crate) inserted: Option<ValueFn<T>>,
    pub(crate) deleted: Option<DeletedFn>,
    pub(crate) decode_error: Option<DecodeErrorFn>,
}

impl<T> EventSink<T> {
    pub fn new() -> Self {
        Self {
            updated: None,
            inserted: None,
            deleted: None,
            decode_error: None,
        }
    }

    /// Called with the freshly decoded value when the watched record changes.
    pub fn on_updated(mut self, f: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.updated = Some(Arc::new(f));
        self
    }

    /// Called with the decoded value when a newly inserted record matches.
    pub fn on_inserted(mut self, f: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.inserted = Some(Arc::new(f));
        self
    }

    /// Called when the watched record is deleted.
    pub fn on_deleted(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.deleted = Some(Arc::new(f));
        self
    }

    /// Called when a matching record fails to decode during dispatch.
    pub fn on_decode_error(mut self, f: impl Fn(&DecodeError) + Send + Sync + 'static) -> Self {
        self.decode_error = Some(Arc::new(f));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.updated.is_none()
            && self.inserted.is_none()
            && self.deleted.is_none()
            && self.decode_error.is_none()
    }
}

impl<T> Default for EventSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EventSink<T> {
    fn clone(&self) -> Self {
        Self {
            updated: self.updated.clone(),
            inserted: self.inserted.clone(),
            deleted: self.deleted.clone(),
            decode_error: self.decode_error.clone(),
        }
    }
}

impl<T> fmt::Debug for EventSink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("updated", &self.updated.is_some())
            .field("inserted", &self.inserted.is_some())
            .field("deleted", &self.deleted.is_some())
            .field("decode_error", &self.decode_error.is_some())
            .finish()
    }
}
