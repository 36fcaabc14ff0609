//! Error types for the protocol layer.
//!
//! Decoding a *request* never fails (unrecognised input becomes
//! [`Request::Unknown`](crate::Request::Unknown)), so these errors only
//! come from encoding, or from a client parsing a server payload.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// A player-details payload did not have the form
    /// `row col height width`.
    #[error("malformed player details: {0:?}")]
    MalformedDetails(String),
}
