//! Per-target filtering of a context's change feed.

use std::sync::Arc;

use sm_context::{ChangeBatch, ChangeCallback, ChangeKind, ChangeNotifier, RecordHandle, Subscription};
use tracing::{debug, trace};

use crate::error::Result;
use crate::target::WatchTarget;

/// The record a [`ChangeFilter`] picked out of one batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterMatch {
    Inserted(RecordHandle),
    Updated(RecordHandle),
    Deleted(RecordHandle),
}

impl FilterMatch {
    fn new(kind: ChangeKind, record: RecordHandle) -> Self {
        match kind {
            ChangeKind::Inserted => Self::Inserted(record),
            ChangeKind::Updated => Self::Updated(record),
            ChangeKind::Deleted => Self::Deleted(record),
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::Inserted(_) => ChangeKind::Inserted,
            Self::Updated(_) => ChangeKind::Updated,
            Self::Deleted(_) => ChangeKind::Deleted,
        }
    }

    pub fn record(&self) -> &RecordHandle {
        match self {
            Self::Inserted(r) | Self::Updated(r) | Self::Deleted(r) => r,
        }
    }
}

/// A subscription that turns the coarse per-context feed into at most one
/// [`FilterMatch`] per batch for a single [`WatchTarget`].
///
/// Dropping the filter unsubscribes it.
#[derive(Debug)]
pub struct ChangeFilter {
    target: Arc<WatchTarget>,
    subscription: Subscription,
}

impl ChangeFilter {
    /// Subscribe to `notifier`, calling `handler` for every batch that
    /// contains a record matching `target`.
    ///
    /// `order` lists the batch sets to inspect; the first matching record
    /// in the first set that has one is reported.
    pub fn subscribe<N, F>(
        notifier: &N,
        target: WatchTarget,
        order: Vec<ChangeKind>,
        handler: F,
    ) -> Result<Self>
    where
        N: ChangeNotifier + ?Sized,
        F: Fn(FilterMatch) + Send + Sync + 'static,
    {
        let target = Arc::new(target);
        let watched = Arc::clone(&target);
        let callback: ChangeCallback = Arc::new(move |batch: &ChangeBatch| {
            if let Some(found) = Self::evaluate(&watched, batch, &order) {
                trace!(watch = %watched, kind = %found.kind(), record = %found.record(), "watch target matched");
                handler(found);
            }
        });
        let subscription = notifier.subscribe_changes(callback)?;
        debug!(watch = %target, subscriber = subscription.id(), "change filter subscribed");
        Ok(Self {
            target,
            subscription,
        })
    }

    /// Find the record `target` picks out of `batch`, inspecting the sets in
    /// `order`.
    pub fn evaluate(
        target: &WatchTarget,
        batch: &ChangeBatch,
        order: &[ChangeKind],
    ) -> Option<FilterMatch> {
        order.iter().find_map(|&kind| {
            batch
                .records(kind)
                .iter()
                .find(|record| target.matches(record))
                .map(|record| FilterMatch::new(kind, record.clone()))
        })
    }

    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stop receiving batches. Returns `true` if this call did the removal.
    pub fn unsubscribe(&self) -> bool {
        let removed = self.subscription.unsubscribe();
        if removed {
            debug!(watch = %self.target, "change filter unsubscribed");
        }
        removed
    }
}
