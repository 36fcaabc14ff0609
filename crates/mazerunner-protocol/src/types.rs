//! The closed vocabulary clients and the server speak.
//!
//! Both directions use bare uppercase tokens (`START`, `GAME_WON`, ...).
//! Parsing is deliberately permissive: anything that is not an exact,
//! case-sensitive match decodes to the `Unknown` variant instead of
//! failing, so a garbled request costs the client one `ERROR` reply and
//! never the connection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Request: client → server
// ---------------------------------------------------------------------------

/// A request sent by a client.
///
/// The serde attributes mirror the text encoding, so the JSON codec carries
/// the same tokens as JSON strings. `#[serde(other)]` routes every
/// unrecognised string to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// Generate a fresh maze and start (or restart) a game.
    Start,
    /// End the session and close the connection.
    Stop,
    /// Move the player one row up.
    Up,
    /// Move the player one row down.
    Down,
    /// Move the player one column left.
    Left,
    /// Move the player one column right.
    Right,
    /// Ask for the player's position and the maze dimensions.
    #[serde(rename = "SEND_PLAYER_DETAILS")]
    QueryPlayerDetails,
    /// Anything the server did not recognise.
    #[serde(other)]
    Unknown,
}

impl Request {
    /// Every request a client can deliberately send.
    pub const KNOWN: [Request; 7] = [
        Request::Start,
        Request::Stop,
        Request::Up,
        Request::Down,
        Request::Left,
        Request::Right,
        Request::QueryPlayerDetails,
    ];

    /// The wire token for this request.
    pub fn as_str(self) -> &'static str {
        match self {
            Request::Start => "START",
            Request::Stop => "STOP",
            Request::Up => "UP",
            Request::Down => "DOWN",
            Request::Left => "LEFT",
            Request::Right => "RIGHT",
            Request::QueryPlayerDetails => "SEND_PLAYER_DETAILS",
            Request::Unknown => "UNKNOWN",
        }
    }

    /// Decodes a wire token. Never fails.
    pub fn parse(token: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|r| r.as_str() == token)
            .unwrap_or(Request::Unknown)
    }
}

impl From<&str> for Request {
    fn from(token: &str) -> Self {
        Self::parse(token)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Response: server → client status tokens
// ---------------------------------------------------------------------------

/// A status token sent by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    /// The move was made.
    Ok,
    /// The move was blocked by a wall; the player did not move.
    WallCollision,
    /// A new maze was generated.
    GameStarted,
    /// The player stepped onto an exit.
    GameWon,
    /// The player walked into the monster.
    GameOver,
    /// The request could not be served.
    Error,
    /// A client received a token it did not recognise.
    #[serde(other)]
    Unknown,
}

impl Response {
    /// Every token the server can emit.
    pub const KNOWN: [Response; 6] = [
        Response::Ok,
        Response::WallCollision,
        Response::GameStarted,
        Response::GameWon,
        Response::GameOver,
        Response::Error,
    ];

    /// The wire token for this response.
    pub fn as_str(self) -> &'static str {
        match self {
            Response::Ok => "OK",
            Response::WallCollision => "WALL_COLLISION",
            Response::GameStarted => "GAME_STARTED",
            Response::GameWon => "GAME_WON",
            Response::GameOver => "GAME_OVER",
            Response::Error => "ERROR",
            Response::Unknown => "UNKNOWN",
        }
    }

    /// Decodes a wire token. Never fails.
    pub fn parse(token: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|r| r.as_str() == token)
            .unwrap_or(Response::Unknown)
    }

    /// `true` for the two outcomes that end a game.
    pub fn is_game_end(self) -> bool {
        matches!(self, Response::GameWon | Response::GameOver)
    }
}

impl From<&str> for Response {
    fn from(token: &str) -> Self {
        Self::parse(token)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PlayerDetails: the one structured payload
// ---------------------------------------------------------------------------

/// Reply to `SEND_PLAYER_DETAILS`: the player's position and the maze size.
///
/// On the text wire this is four space-separated integers,
/// `playerRow playerCol mazeHeight mazeWidth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerDetails {
    /// Player row, 0-based from the top.
    pub row: usize,
    /// Player column, 0-based from the left.
    pub col: usize,
    /// Number of rows in the maze.
    pub height: usize,
    /// Number of columns in the maze.
    pub width: usize,
}

impl fmt::Display for PlayerDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.row, self.col, self.height, self.width)
    }
}

impl FromStr for PlayerDetails {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ProtocolError::MalformedDetails(s.to_string());
        let mut fields = s.split(' ').map(|f| f.parse::<usize>());
        let mut next = || fields.next().and_then(Result::ok).ok_or_else(malformed);
        let details = PlayerDetails {
            row: next()?,
            col: next()?,
            height: next()?,
            width: next()?,
        };
        if fields.next().is_some() {
            return Err(malformed());
        }
        Ok(details)
    }
}

// ---------------------------------------------------------------------------
// ServerReply: everything the server can write back
// ---------------------------------------------------------------------------

/// One reply from the server: a status token or the details payload.
///
/// `#[serde(untagged)]` makes the JSON form either `"OK"` or
/// `{"row":3,"col":3,"height":7,"width":7}` with no wrapper object.
/// Untagged variants are tried in order, and `Response` accepts any
/// string through `#[serde(other)]`, so `Details` has to come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerReply {
    /// The answer to `SEND_PLAYER_DETAILS`.
    Details(PlayerDetails),
    /// A bare status token.
    Status(Response),
}

impl ServerReply {
    /// Parses reply text the way a client would: four integers are
    /// details, anything else is a (possibly `Unknown`) status token.
    pub fn parse(text: &str) -> Self {
        match text.parse::<PlayerDetails>() {
            Ok(details) => ServerReply::Details(details),
            Err(_) => ServerReply::Status(Response::parse(text)),
        }
    }

    /// Returns the status token, if this reply is one.
    pub fn status(&self) -> Option<Response> {
        match self {
            ServerReply::Status(r) => Some(*r),
            ServerReply::Details(_) => None,
        }
    }
}

impl From<Response> for ServerReply {
    fn from(r: Response) -> Self {
        ServerReply::Status(r)
    }
}

impl From<PlayerDetails> for ServerReply {
    fn from(d: PlayerDetails) -> Self {
        ServerReply::Details(d)
    }
}

impl fmt::Display for ServerReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerReply::Status(r) => r.fmt(f),
            ServerReply::Details(d) => d.fmt(f),
        }
    }
}
