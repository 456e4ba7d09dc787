//! The per-context change feed.
//!
//! A [`ChangeFeed`] is an explicit list of subscribers. Publishing a
//! [`ChangeBatch`] invokes every active subscriber synchronously, in
//! registration order, on the publishing thread.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use sm_types::ContextId;
use tracing::{debug, trace};

use crate::change::ChangeBatch;
use crate::error::{ContextError, Result};

/// A subscriber callback. Invoked once per published batch.
pub type ChangeCallback = Arc<dyn Fn(&ChangeBatch) + Send + Sync>;

/// Anything that can hand out change subscriptions.
///
/// Implemented by [`ChangeFeed`] and [`Context`](crate::Context); observers
/// are generic over it.
pub trait ChangeNotifier: Send + Sync {
    /// Register `callback` for every future batch.
    ///
    /// Fails if the underlying context has been invalidated.
    fn subscribe_changes(&self, callback: ChangeCallback) -> Result<Subscription>;
}

/// Internal subscriber: an activity flag paired with its callback.
struct Subscriber {
    id: u64,
    active: Arc<AtomicBool>,
    callback: ChangeCallback,
}

struct FeedShared {
    context: ContextId,
    subscribers: RwLock<Vec<Subscriber>>,
    next_id: AtomicU64,
    /// Held for the whole of one dispatch.
    delivery: ReentrantMutex<()>,
    queue: Mutex<DeliveryQueue>,
    invalidated: AtomicBool,
}

/// Batches waiting behind the one being delivered.
#[derive(Default)]
struct DeliveryQueue {
    pending: VecDeque<ChangeBatch>,
    draining: bool,
}

/// Pops queued batches for the draining dispatch. Ends the drain on drop,
/// including when a callback panics.
struct DrainGuard<'a>(&'a Mutex<DeliveryQueue>);

impl DrainGuard<'_> {
    fn pop(&self) -> Option<ChangeBatch> {
        self.0.lock().pending.pop_front()
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        let mut queue = self.0.lock();
        queue.pending.clear();
        queue.draining = false;
    }
}

impl FeedShared {
    fn remove(&self, id: u64) {
        let removed = {
            let mut subs = self.subscribers.write();
            subs.iter()
                .position(|sub| sub.id == id)
                .map(|idx| subs.remove(idx))
        };
        // The callback may own other subscriptions; drop it outside the lock.
        drop(removed);
    }
}

/// Fan-out list of change subscribers for one context.
///
/// Cloning a feed yields another handle to the same subscriber list.
#[derive(Clone)]
pub struct ChangeFeed {
    shared: Arc<FeedShared>,
}

impl ChangeFeed {
    pub fn new(context: ContextId) -> Self {
        Self {
            shared: Arc::new(FeedShared {
                context,
                subscribers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                delivery: ReentrantMutex::new(()),
                queue: Mutex::new(DeliveryQueue::default()),
                invalidated: AtomicBool::new(false),
            }),
        }
    }

    /// The context this feed belongs to.
    pub fn context_id(&self) -> ContextId {
        self.shared.context
    }

    /// Register a callback for every future batch.
    pub fn subscribe<F>(&self, callback: F) -> Result<Subscription>
    where
        F: Fn(&ChangeBatch) + Send + Sync + 'static,
    {
        self.subscribe_changes(Arc::new(callback))
    }

    /// Deliver `batch` to every active subscriber. Returns the number of
    /// callbacks invoked.
    ///
    /// The subscriber list is snapshotted before dispatch, so subscribers
    /// added during dispatch first see the next batch. A subscriber removed
    /// during dispatch is skipped if it has not been reached yet.
    ///
    /// A batch published from inside a callback is queued and delivered once
    /// the current batch has reached every subscriber; that call returns 0.
    pub fn publish(&self, batch: &ChangeBatch) -> usize {
        if self.is_invalidated() {
            return 0;
        }
        let _delivery = self.shared.delivery.lock();
        self.dispatch(batch.clone())
    }

    /// Produce a batch with `take` and publish it, both under the delivery
    /// lock, so batches reach subscribers in the order they were taken.
    /// Empty batches are returned without being published.
    pub(crate) fn publish_with(
        &self,
        take: impl FnOnce() -> Result<ChangeBatch>,
    ) -> Result<ChangeBatch> {
        let _delivery = self.shared.delivery.lock();
        let batch = take()?;
        if !batch.is_empty() && !self.is_invalidated() {
            self.dispatch(batch.clone());
        }
        Ok(batch)
    }

    /// Queue `batch` and, unless this thread is already dispatching, drain
    /// the queue in FIFO order. Callers hold the delivery lock.
    fn dispatch(&self, batch: ChangeBatch) -> usize {
        {
            let mut queue = self.shared.queue.lock();
            queue.pending.push_back(batch);
            if queue.draining {
                trace!(context = %self.shared.context, queued = queue.pending.len(), "nested batch queued");
                return 0;
            }
            queue.draining = true;
        }

        let drain = DrainGuard(&self.shared.queue);
        let mut delivered = 0;
        while let Some(next) = drain.pop() {
            delivered += self.deliver(&next);
        }
        delivered
    }

    fn deliver(&self, batch: &ChangeBatch) -> usize {
        let snapshot: Vec<(u64, Arc<AtomicBool>, ChangeCallback)> = self
            .shared
            .subscribers
            .read()
            .iter()
            .map(|sub| (sub.id, Arc::clone(&sub.active), Arc::clone(&sub.callback)))
            .collect();

        let mut delivered = 0;
        for (id, active, callback) in snapshot {
            if !active.load(Ordering::Acquire) {
                continue;
            }
            trace!(subscriber = id, "delivering change batch");
            callback(batch);
            delivered += 1;
        }

        debug!(
            context = %self.shared.context,
            inserted = batch.inserted.len(),
            updated = batch.updated.len(),
            deleted = batch.deleted.len(),
            delivered,
            "change batch published"
        );
        delivered
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.read().len()
    }

    /// Drop every subscriber and refuse new ones.
    pub fn invalidate(&self) {
        if self.shared.invalidated.swap(true, Ordering::AcqRel) {
            return;
        }
        let removed: Vec<Subscriber> = std::mem::take(&mut *self.shared.subscribers.write());
        for sub in &removed {
            sub.active.store(false, Ordering::Release);
        }
        debug!(context = %self.shared.context, removed = removed.len(), "change feed invalidated");
    }

    pub fn is_invalidated(&self) -> bool {
        self.shared.invalidated.load(Ordering::Acquire)
    }
}

impl ChangeNotifier for ChangeFeed {
    fn subscribe_changes(&self, callback: ChangeCallback) -> Result<Subscription> {
        if self.is_invalidated() {
            return Err(ContextError::Invalidated(self.shared.context));
        }
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));
        self.shared.subscribers.write().push(Subscriber {
            id,
            active: Arc::clone(&active),
            callback,
        });
        debug!(context = %self.shared.context, subscriber = id, "subscribed to changes");
        Ok(Subscription {
            id,
            active,
            feed: Arc::downgrade(&self.shared),
        })
    }
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("context", &self.shared.context)
            .field("subscribers", &self.subscriber_count())
            .field("invalidated", &self.is_invalidated())
            .finish()
    }
}

/// Handle for one registered subscriber.
///
/// The subscriber is removed by the first call to [`unsubscribe`] or when the
/// handle is dropped, whichever comes first. Later calls do nothing.
///
/// [`unsubscribe`]: Subscription::unsubscribe
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    active: Arc<AtomicBool>,
    feed: Weak<FeedShared>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stop delivery to this subscriber. Returns `true` if this call removed
    /// it.
    ///
    /// Safe to call from inside the subscriber's own callback: the batch being
    /// delivered completes, and nothing further is delivered.
    pub fn unsubscribe(&self) -> bool {
        if !self.active.swap(false, Ordering::AcqRel) {
            return false;
        }
        if let Some(feed) = self.feed.upgrade() {
            feed.remove(self.id);
            debug!(context = %feed.context, subscriber = self.id, "unsubscribed from changes");
        }
        true
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
