//! Change observation for structmirror.
//!
//! Observers subscribe to a context's change feed, pick out the one record
//! they watch from each [`ChangeBatch`](sm_context::ChangeBatch), and mirror
//! it into a typed value.
//!
//! # Observers
//!
//! - [`RecordObserver`]: watches one specific record by identity and caches
//!   its decoded value.
//! - [`EntityObserver`]: watches whichever record of an entity currently has
//!   `key == value`. Nothing is cached; every event carries a freshly decoded
//!   value.
//!
//! Both are built on [`ChangeFilter`], which tests a batch against a
//! [`WatchTarget`] and reports at most one [`FilterMatch`] per batch.
//!
//! # Dispatch Rules
//!
//! 1. The updated set is inspected before the deleted set, then the inserted
//!    set. The first match wins; the rest of the batch is ignored.
//! 2. Callbacks run synchronously on the thread that published the batch.
//! 3. A field that does not exist, or a record of another entity, is simply
//!    not a match.
//! 4. Decode failures during dispatch go to `on_decode_error`; they never
//!    panic and never replace the cached value.
//! 5. `close` is idempotent and also runs on drop. It may be called from
//!    inside the observer's own callback.

pub mod config;
pub mod entity_observer;
pub mod error;
pub mod filter;
pub mod forward;
pub mod record_observer;
pub mod sink;
pub mod target;

mod dispatch;

#[cfg(test)]
mod fixtures;

pub use config::ObserverConfig;
pub use entity_observer::EntityObserver;
pub use error::{ObserveError, Result};
pub use filter::{ChangeFilter, FilterMatch};
pub use forward::ObserverEvent;
pub use record_observer::RecordObserver;
pub use sink::EventSink;
pub use target::WatchTarget;

/// Lifecycle of an observer. `TornDown` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObserverState {
    Active,
    TornDown,
}
