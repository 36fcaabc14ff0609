//! Unified error type for the maze runner server.

use mazerunner_maze::MazeError;
use mazerunner_protocol::ProtocolError;
use mazerunner_session::SessionError;
use mazerunner_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum MazeServerError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encoding a reply).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A maze error; at server level, a template that failed to load.
    #[error(transparent)]
    Maze(#[from] MazeError),

    /// A session-level error (registry full, duplicate id).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
