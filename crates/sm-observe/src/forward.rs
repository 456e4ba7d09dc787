//! Forwarding observer events into a tokio channel.
//!
//! Callbacks run on the publishing thread. A consumer that lives in an
//! async task can take a forwarding sink instead and read events from the
//! receiver at its own pace.

use sm_codec::DecodeError;
use tokio::sync::mpsc;
use tracing::trace;

use crate::sink::EventSink;

/// One observer callback, as an owned value.
#[derive(Clone, Debug, PartialEq)]
pub enum ObserverEvent<T> {
    Inserted(T),
    Updated(T),
    Deleted,
    DecodeFailed(DecodeError),
}

impl<T> ObserverEvent<T> {
    /// The decoded value carried by the event, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Inserted(v) | Self::Updated(v) => Some(v),
            Self::Deleted | Self::DecodeFailed(_) => None,
        }
    }
}

impl<T> EventSink<T>
where
    T: Clone + Send + 'static,
{
    /// A sink that sends every event to `tx`.
    ///
    /// Events sent after the receiver is dropped are discarded.
    pub fn forwarding(tx: mpsc::UnboundedSender<ObserverEvent<T>>) -> Self {
        let (inserted, updated, deleted, failed) = (tx.clone(), tx.clone(), tx.clone(), tx);
        Self::new()
            .on_inserted(move |value: &T| send(&inserted, ObserverEvent::Inserted(value.clone())))
            .on_updated(move |value: &T| send(&updated, ObserverEvent::Updated(value.clone())))
            .on_deleted(move || send(&deleted, ObserverEvent::Deleted))
            .on_decode_error(move |err: &DecodeError| {
                send(&failed, ObserverEvent::DecodeFailed(err.clone()))
            })
    }

    /// A forwarding sink together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ObserverEvent<T>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::forwarding(tx), rx)
    }
}

fn send<T>(tx: &mpsc::UnboundedSender<ObserverEvent<T>>, event: ObserverEvent<T>) {
    if tx.send(event).is_err() {
        trace!("observer event receiver dropped");
    }
}
