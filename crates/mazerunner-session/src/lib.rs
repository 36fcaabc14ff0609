//! Session handling for the maze runner server.
//!
//! This crate holds the two pieces of per-connection logic that do not
//! touch a socket:
//!
//! 1. **The game state machine** ([`GameSession`]): turns one request
//!    into one reply, owning the connection's maze.
//! 2. **The registry** ([`SessionRegistry`]): knows which connections are
//!    live, and enforces the connection limit.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)  ← owns the socket, runs one task per connection
//!     ↕
//! Session Layer (this crate)  ← game state and live-session bookkeeping
//!     ↕
//! Maze + Protocol (below)  ← grid logic, request/response vocabulary
//! ```

mod error;
mod game;
mod registry;

pub use error::SessionError;
pub use game::{GameSession, Reply, SessionPhase};
pub use registry::{SessionEntry, SessionRegistry};
