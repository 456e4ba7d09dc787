//! In-memory persistence context for structmirror.
//!
//! A [`Context`] is a unit of work over a set of records described by a
//! [`Model`]. Mutations accumulate as pending changes; processing them emits
//! exactly one [`ChangeBatch`] through the context's [`ChangeFeed`], which is
//! what observers subscribe to.
//!
//! # Modules
//!
//! - [`error`]: Error types for context operations
//! - [`model`]: Entity descriptions: [`Model`], [`EntityDescription`], [`FieldKind`]
//! - [`record`]: [`RecordHandle`], a shared reference to one live record
//! - [`change`]: [`ChangeBatch`], the payload of one change notification
//! - [`feed`]: [`ChangeFeed`], [`Subscription`] and the [`ChangeNotifier`] trait
//! - [`context`]: The in-memory [`Context`]
//! - [`config`]: [`ContextConfig`]
//!
//! # Design Rules
//!
//! 1. One notification per processed batch, delivered synchronously on the
//!    calling thread.
//! 2. Delivery is serialized per feed. A callback may publish again from the
//!    same thread; other threads wait.
//! 3. No lock is held while subscriber callbacks run, so callbacks may read
//!    records, mutate the context, or unsubscribe.
//! 4. Subscriptions are removed exactly once, explicitly or on drop.

pub mod change;
pub mod config;
pub mod context;
pub mod error;
pub mod feed;
pub mod model;
pub mod record;

pub use change::{ChangeBatch, ChangeKind};
pub use config::ContextConfig;
pub use context::Context;
pub use error::{ContextError, Result};
pub use feed::{ChangeCallback, ChangeFeed, ChangeNotifier, Subscription};
pub use model::{EntityDescription, FieldKind, Model};
pub use record::RecordHandle;
