//! Typed mirrors of persistence-context records.
//!
//! This is the main entry point for applications. [`Mirror`] bundles an
//! in-memory [`Context`] with the observer configuration, and the crate
//! re-exports the types most callers need from the `sm-*` crates.

pub mod config;
pub mod error;
pub mod mirror;

pub use config::MirrorConfig;
pub use error::{MirrorError, MirrorResult};
pub use mirror::Mirror;

// Re-export key types
pub use sm_codec::{
    decode_all, encode_all, string_list, upsert, Decode, DecodeError, DecodeResult, Encode,
    EncodeError, EncodeResult, FieldReader,
};
pub use sm_context::{
    ChangeBatch, ChangeFeed, ChangeKind, ChangeNotifier, Context, ContextConfig, ContextError,
    EntityDescription, FieldKind, Model, RecordHandle, Subscription,
};
pub use sm_observe::{
    ChangeFilter, EntityObserver, EventSink, FilterMatch, ObserveError, ObserverConfig,
    ObserverEvent, ObserverState, RecordObserver, WatchTarget,
};
pub use sm_types::{ContextId, FieldMap, RecordId, RelationshipValue, ScalarKind, ScalarValue, Value};
