use thiserror::Error;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("context error: {0}")]
    Context(#[from] sm_context::ContextError),

    #[error("decode error: {0}")]
    Decode(#[from] sm_codec::DecodeError),

    #[error("encode error: {0}")]
    Encode(#[from] sm_codec::EncodeError),

    #[error("observe error: {0}")]
    Observe(#[from] sm_observe::ObserveError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type MirrorResult<T> = Result<T, MirrorError>;
