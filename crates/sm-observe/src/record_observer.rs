//! Observation of one specific record.

use std::sync::Arc;

use parking_lot::RwLock;
use sm_codec::{Decode, DecodeError};
use sm_context::{ChangeNotifier, RecordHandle};
use tracing::debug;

use crate::config::ObserverConfig;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::filter::ChangeFilter;
use crate::sink::EventSink;
use crate::target::WatchTarget;
use crate::ObserverState;

/// Keeps a typed mirror of one record.
///
/// The record is decoded at construction and again each time it appears in
/// a batch. Deletion clears the mirrored value. A decode failure during
/// dispatch leaves the previous value in place.
pub struct RecordObserver<T> {
    record: RecordHandle,
    value: Arc<RwLock<Option<T>>>,
    dispatcher: Arc<Dispatcher<T>>,
    filter: ChangeFilter,
}

impl<T> RecordObserver<T>
where
    T: Decode + Clone + Send + Sync + 'static,
{
    /// Observe `record` with the default configuration.
    ///
    /// Fails if the record cannot be decoded or the notifier refuses the
    /// subscription.
    pub fn new<N>(record: RecordHandle, notifier: &N) -> Result<Self>
    where
        N: ChangeNotifier + ?Sized,
    {
        Self::with_config(record, notifier, ObserverConfig::default())
    }

    pub fn with_config<N>(record: RecordHandle, notifier: &N, config: ObserverConfig) -> Result<Self>
    where
        N: ChangeNotifier + ?Sized,
    {
        let initial = T::decode(&record)?;
        let value = Arc::new(RwLock::new(Some(initial)));
        let order = config.inspection_order();
        let dispatcher = Arc::new(
            Dispatcher::new(record.to_string(), config).with_cache(Arc::clone(&value)),
        );

        let handler = Arc::clone(&dispatcher);
        let filter = ChangeFilter::subscribe(
            notifier,
            WatchTarget::identity(record.clone()),
            order,
            move |found| handler.handle(found),
        )?;
        debug!(observer = %dispatcher.label(), "record observer started");

        Ok(Self {
            record,
            value,
            dispatcher,
            filter,
        })
    }

    /// The most recently decoded value, or `None` after deletion.
    pub fn value(&self) -> Option<T> {
        self.value.read().clone()
    }
}

impl<T> RecordObserver<T> {
    /// The record being observed.
    pub fn record(&self) -> &RecordHandle {
        &self.record
    }

    pub fn target(&self) -> &WatchTarget {
        self.filter.target()
    }

    /// Replace every callback slot at once.
    pub fn set_event_sink(&self, sink: EventSink<T>) {
        self.dispatcher.set_sink(sink);
    }

    pub fn set_on_updated(&self, f: impl Fn(&T) + Send + Sync + 'static) {
        self.dispatcher.update_sink(|sink| sink.updated = Some(Arc::new(f)));
    }

    pub fn set_on_inserted(&self, f: impl Fn(&T) + Send + Sync + 'static) {
        self.dispatcher.update_sink(|sink| sink.inserted = Some(Arc::new(f)));
    }

    pub fn set_on_deleted(&self, f: impl Fn() + Send + Sync + 'static) {
        self.dispatcher.update_sink(|sink| sink.deleted = Some(Arc::new(f)));
    }

    pub fn set_on_decode_error(&self, f: impl Fn(&DecodeError) + Send + Sync + 'static) {
        self.dispatcher.update_sink(|sink| sink.decode_error = Some(Arc::new(f)));
    }

    pub fn state(&self) -> ObserverState {
        if self.filter.is_active() {
            ObserverState::Active
        } else {
            ObserverState::TornDown
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == ObserverState::Active
    }

    /// Stop observing. Returns `true` on the call that tore the observer
    /// down; later calls do nothing.
    pub fn close(&self) -> bool {
        let closed = self.filter.unsubscribe();
        if closed {
            debug!(observer = %self.dispatcher.label(), "record observer closed");
        }
        closed
    }
}

impl<T> Drop for RecordObserver<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> std::fmt::Debug for RecordObserver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordObserver")
            .field("record", &self.record)
            .field("state", &self.state())
            .finish()
    }
}
