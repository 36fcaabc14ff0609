//! Error types for the session layer.

use mazerunner_transport::ConnectionId;

/// Errors that can occur while tracking sessions.
///
/// Game-level failures (a bad request, a failed `START`) never show up
/// here: the state machine turns those into an `ERROR` reply and the
/// session carries on.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The registry is at its connection limit.
    #[error("session limit reached ({limit} live sessions)")]
    LimitReached { limit: usize },

    /// A session with this connection id is already registered.
    /// Connection ids are unique per process, so this is a bug upstream.
    #[error("connection {0} is already registered")]
    AlreadyRegistered(ConnectionId),
}
