//! Wire protocol for the maze runner server.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`Request`], [`Response`], [`PlayerDetails`],
//!   [`ServerReply`]): the closed token vocabulary.
//! - **Codec** ([`Codec`] trait, [`TextCodec`], [`JsonCodec`]): how
//!   those tokens are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while encoding,
//!   or while a client parses a details payload.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (Request) → Session (game state)
//! ```
//!
//! One request always produces at most one reply. `STOP` produces none.

mod codec;
mod error;
mod types;

pub use codec::{Codec, TextCodec};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{PlayerDetails, Request, Response, ServerReply};
