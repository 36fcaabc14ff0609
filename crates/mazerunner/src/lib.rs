//! # Mazerunner
//!
//! A multi-client maze game server.
//!
//! Every connected client plays its own maze: `START` generates one from a
//! random template, the four direction commands move the player, and the
//! game ends on the exit (`GAME_WON`) or the monster (`GAME_OVER`). The
//! server keeps a registry of live sessions, enforces a connection limit,
//! and disposes of a session exactly once when its client stops or leaves.
//!
//! ## Layers
//!
//! ```text
//! mazerunner            ← builder, accept loop, per-connection handler
//!   ├─ mazerunner-session    ← game state machine, session registry
//!   ├─ mazerunner-maze       ← grid, BFS, template loading, generation
//!   ├─ mazerunner-protocol   ← request/response tokens, codecs
//!   └─ mazerunner-transport  ← newline TCP and WebSocket connections
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mazerunner::prelude::*;
//!
//! # async fn run() -> Result<(), MazeServerError> {
//! let server = MazeServerBuilder::new()
//!     .bind("127.0.0.1:8889")
//!     .maps_dir("assets/maps")
//!     .build_tcp(TextCodec)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{ConfigError, ServerConfig, TransportKind, WireFormat};
pub use error::MazeServerError;
pub use server::{MazeServer, MazeServerBuilder, RegistryHandle};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{
        ConfigError, MazeServer, MazeServerBuilder, MazeServerError, RegistryHandle,
        ServerConfig, TransportKind, WireFormat,
    };
    pub use mazerunner_maze::{Template, TemplateCatalog};
    pub use mazerunner_protocol::{
        Codec, JsonCodec, Request, Response, ServerReply, TextCodec,
    };
    pub use mazerunner_transport::{
        ConnectionId, TcpLineTransport, Transport, WebSocketTransport,
    };
}
