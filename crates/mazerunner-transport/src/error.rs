/// Errors that can occur while moving bytes between a client and a session.
///
/// A peer that hangs up cleanly is not an error: `recv` returns `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// A send was attempted on a connection that is already shut.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Writing a reply failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading a request failed mid-stream (reset, bad frame).
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// The peer sent a message longer than the transport accepts.
    #[error("frame exceeds {limit} bytes")]
    FrameTooLarge { limit: usize },

    /// Binding the listener, accepting a socket, or completing a
    /// WebSocket handshake failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_source_message() {
        let err = TransportError::SendFailed(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "pipe gone",
        ));
        assert_eq!(err.to_string(), "send failed: pipe gone");
    }
}
