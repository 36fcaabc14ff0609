//! The per-connection game state machine.
//!
//! ```text
//!            START ok                 STOP / connection lost
//!   NoGame ───────────→ InGame ───────────────────────────→ Closed
//!     │  ↑                │ ↑
//!     │  └ START failed   │ └ START (new maze), moves, queries
//!     │                   │
//!     └───────────── STOP / connection lost ───────────────→ Closed
//! ```
//!
//! The machine is synchronous and transport-agnostic: the server feeds it
//! one decoded [`Request`] at a time and writes back whatever [`Reply`]
//! comes out. Every request yields exactly one reply; `STOP` yields
//! [`Reply::Close`] instead of a token.

use mazerunner_maze::{Direction, MapEntity, Maze, MoveOutcome, TemplateCatalog};
use mazerunner_protocol::{PlayerDetails, Request, Response, ServerReply};
use mazerunner_transport::ConnectionId;
use rand::Rng;

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Connected, no maze yet.
    NoGame,
    /// A maze has been generated. Winning or losing does not leave this
    /// phase; only `STOP` or a new `START` changes the maze.
    InGame,
    /// The client sent `STOP` or went away. Terminal.
    Closed,
}

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// What the connection task should do after one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Encode and send this reply, then wait for the next request.
    Send(ServerReply),
    /// Send nothing. Dispose of the session and close the connection.
    Close,
}

impl From<Response> for Reply {
    fn from(r: Response) -> Self {
        Reply::Send(ServerReply::Status(r))
    }
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

/// One connection's game: its phase and the maze it exclusively owns.
#[derive(Debug)]
pub struct GameSession {
    id: ConnectionId,
    phase: SessionPhase,
    maze: Option<Maze>,
}

impl GameSession {
    /// A fresh session in [`SessionPhase::NoGame`].
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            phase: SessionPhase::NoGame,
            maze: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The current maze, if a game has started.
    pub fn maze(&self) -> Option<&Maze> {
        self.maze.as_ref()
    }

    /// Marks the session closed and drops its maze. Idempotent.
    pub fn close(&mut self) {
        self.phase = SessionPhase::Closed;
        self.maze = None;
    }

    /// Processes one request.
    ///
    /// `catalog` and `rng` are only used by `START`. A closed session
    /// answers every request with [`Reply::Close`].
    pub fn handle<R: Rng + ?Sized>(
        &mut self,
        request: Request,
        catalog: &TemplateCatalog,
        rng: &mut R,
    ) -> Reply {
        if self.phase == SessionPhase::Closed {
            return Reply::Close;
        }

        match request {
            Request::Start => self.start(catalog, rng).into(),
            Request::Stop => {
                self.close();
                Reply::Close
            }
            Request::Up => self.move_player(Direction::Up).into(),
            Request::Down => self.move_player(Direction::Down).into(),
            Request::Left => self.move_player(Direction::Left).into(),
            Request::Right => self.move_player(Direction::Right).into(),
            Request::QueryPlayerDetails => self.player_details(),
            Request::Unknown => {
                tracing::debug!(id = %self.id, "unrecognised request");
                Response::Error.into()
            }
        }
    }

    /// Generates a new maze, replacing any current one.
    fn start<R: Rng + ?Sized>(&mut self, catalog: &TemplateCatalog, rng: &mut R) -> Response {
        match catalog.build(rng) {
            Ok(maze) => {
                tracing::info!(
                    id = %self.id,
                    height = maze.height(),
                    width = maze.width(),
                    "game started"
                );
                tracing::debug!(id = %self.id, "maze:\n{maze}");
                self.maze = Some(maze);
                self.phase = SessionPhase::InGame;
                Response::GameStarted
            }
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "could not generate a maze");
                Response::Error
            }
        }
    }

    fn move_player(&mut self, direction: Direction) -> Response {
        let Some(maze) = self.maze.as_mut() else {
            return Response::Error;
        };

        match maze.try_move(direction) {
            Ok(MoveOutcome::Moved(_)) => Response::Ok,
            Ok(MoveOutcome::Blocked(MapEntity::Wall)) => Response::WallCollision,
            Ok(MoveOutcome::Blocked(MapEntity::Exit)) => {
                tracing::info!(id = %self.id, "player reached an exit");
                Response::GameWon
            }
            Ok(MoveOutcome::Blocked(MapEntity::Monster)) => {
                tracing::info!(id = %self.id, "player ran into the monster");
                Response::GameOver
            }
            Ok(MoveOutcome::Blocked(entity)) => {
                tracing::error!(id = %self.id, ?direction, ?entity, "move blocked by unexpected cell");
                Response::Error
            }
            Ok(MoveOutcome::OutOfBounds) => {
                tracing::error!(id = %self.id, ?direction, "move left the grid");
                Response::Error
            }
            Err(e) => {
                tracing::error!(id = %self.id, error = %e, "move failed");
                Response::Error
            }
        }
    }

    fn player_details(&self) -> Reply {
        let details = self.maze.as_ref().and_then(|maze| {
            maze.player_position().map(|p| PlayerDetails {
                row: p.row,
                col: p.col,
                height: maze.height(),
                width: maze.width(),
            })
        });
        match details {
            Some(d) => Reply::Send(ServerReply::Details(d)),
            None => Response::Error.into(),
        }
    }
}
