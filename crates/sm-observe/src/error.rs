use sm_codec::DecodeError;
use sm_context::ContextError;
use thiserror::Error;

/// Errors surfaced when constructing an observer.
///
/// Failures during dispatch are never returned; see
/// [`EventSink::on_decode_error`](crate::EventSink::on_decode_error).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObserveError {
    /// The context refused the subscription (for example, it was invalidated).
    #[error("subscription failed: {0}")]
    Context(#[from] ContextError),

    /// The watched record could not be decoded at construction time.
    #[error("initial decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// Observer configuration could not be parsed.
    #[error("invalid observer configuration: {0}")]
    Config(String),
}

/// Convenience alias used throughout the observe crate.
pub type Result<T> = std::result::Result<T, ObserveError>;
