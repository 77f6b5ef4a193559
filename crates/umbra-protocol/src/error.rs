//! Protocol error types.

use thiserror::Error;

/// Errors from encoding or decoding frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[cfg(feature = "json")]
    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),

    #[cfg(feature = "json")]
    #[error("failed to decode frame: {0}")]
    Decode(#[source] serde_json::Error),

    /// A frame was structurally valid but carried an unusable value,
    /// such as a slot index outside `0..4`.
    #[error("invalid frame: {0}")]
    Invalid(String),
}
