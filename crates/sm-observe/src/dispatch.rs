//! Dispatch shared by both observers: decode the matched record and invoke
//! the right sink slot.

use std::sync::Arc;

use parking_lot::RwLock;
use sm_codec::Decode;
use sm_context::ChangeKind;
use tracing::{debug, warn};

use crate::config::ObserverConfig;
use crate::filter::FilterMatch;
use crate::sink::EventSink;

type RememberFn<T> = Box<dyn Fn(Option<&T>) + Send + Sync>;

pub(crate) struct Dispatcher<T> {
    label: String,
    config: ObserverConfig,
    sink: RwLock<EventSink<T>>,
    /// Keeps an observer's cached value in step with what was delivered.
    remember: Option<RememberFn<T>>,
}

impl<T> Dispatcher<T> {
    pub(crate) fn new(label: String, config: ObserverConfig) -> Self {
        Self {
            label,
            config,
            sink: RwLock::new(EventSink::new()),
            remember: None,
        }
    }

    /// Mirror every delivered value into `cache`; deletion clears it.
    pub(crate) fn with_cache(mut self, cache: Arc<RwLock<Option<T>>>) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.remember = Some(Box::new(move |value: Option<&T>| {
            *cache.write() = value.cloned();
        }));
        self
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn set_sink(&self, sink: EventSink<T>) {
        *self.sink.write() = sink;
    }

    pub(crate) fn update_sink(&self, f: impl FnOnce(&mut EventSink<T>)) {
        f(&mut self.sink.write());
    }

    fn remember(&self, value: Option<&T>) {
        if let Some(remember) = &self.remember {
            remember(value);
        }
    }
}

impl<T: Decode> Dispatcher<T> {
    /// Handle one filter match. Callbacks are cloned out of the sink before
    /// they run, so a callback may replace sink slots or close its observer.
    pub(crate) fn handle(&self, found: FilterMatch) {
        let kind = found.kind();
        match found {
            FilterMatch::Deleted(record) => {
                self.remember(None);
                debug!(observer = %self.label, record = %record, "watched record deleted");
                let callback = self.sink.read().deleted.clone();
                if let Some(callback) = callback {
                    callback();
                }
            }
            FilterMatch::Updated(record) | FilterMatch::Inserted(record) => {
                match T::decode(&record) {
                    Ok(value) => {
                        self.remember(Some(&value));
                        debug!(observer = %self.label, record = %record, %kind, "watched record decoded");
                        let callback = {
                            let sink = self.sink.read();
                            if kind == ChangeKind::Inserted {
                                sink.inserted.clone()
                            } else {
                                sink.updated.clone()
                            }
                        };
                        if let Some(callback) = callback {
                            callback(&value);
                        }
                    }
                    Err(err) => {
                        warn!(observer = %self.label, record = %record, error = %err, "decode failed during dispatch");
                        if !self.config.report_decode_errors {
                            return;
                        }
                        let callback = self.sink.read().decode_error.clone();
                        if let Some(callback) = callback {
                            callback(&err);
                        }
                    }
                }
            }
        }
    }
}
