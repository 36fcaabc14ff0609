//! The session registry: which connections are live right now.
//!
//! # Concurrency note
//!
//! `SessionRegistry` is NOT thread-safe by itself; it is a plain
//! `HashMap`. The server wraps it in a `tokio::sync::Mutex` shared by the
//! accept loop (which inserts) and every connection task (which removes
//! its own entry).
//!
//! The registry only records *that* a session exists. Each connection
//! task owns its [`GameSession`](crate::GameSession) and maze outright,
//! so nothing in here is ever needed to play a move.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use mazerunner_transport::ConnectionId;

use crate::SessionError;

// ---------------------------------------------------------------------------
// SessionEntry
// ---------------------------------------------------------------------------

/// The registry's record of one live connection.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    /// The transport-assigned connection id; also the registry key.
    pub id: ConnectionId,
    /// The remote address, when the transport knows it.
    pub peer: Option<SocketAddr>,
    /// When the connection was accepted.
    pub connected_at: Instant,
}

impl SessionEntry {
    /// An entry stamped with the current time.
    pub fn new(id: ConnectionId, peer: Option<SocketAddr>) -> Self {
        Self {
            id,
            peer,
            connected_at: Instant::now(),
        }
    }

    /// How long this connection has been open.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

// ---------------------------------------------------------------------------
// SessionRegistry
// ---------------------------------------------------------------------------

/// All live sessions, keyed by connection id.
///
/// ## Lifecycle
///
/// ```text
/// accept ──→ insert() ──→ [live] ──→ remove() ──→ gone
///               │                       ↑
///               └─ LimitReached         └─ STOP, EOF or transport error,
///                  (connection closed)     exactly once per session
/// ```
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<ConnectionId, SessionEntry>,

    /// Maximum number of live sessions. `None` means unbounded.
    limit: Option<usize>,
}

impl SessionRegistry {
    /// An unbounded registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that refuses new sessions once `limit` are live.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            limit: Some(limit),
        }
    }

    /// Registers a new session.
    ///
    /// # Errors
    /// - [`SessionError::LimitReached`] if the registry is full
    /// - [`SessionError::AlreadyRegistered`] if the id is already present
    pub fn insert(&mut self, entry: SessionEntry) -> Result<(), SessionError> {
        if self.sessions.contains_key(&entry.id) {
            return Err(SessionError::AlreadyRegistered(entry.id));
        }
        if let Some(limit) = self.limit {
            if self.sessions.len() >= limit {
                return Err(SessionError::LimitReached { limit });
            }
        }

        tracing::debug!(id = %entry.id, peer = ?entry.peer, "session registered");
        self.sessions.insert(entry.id, entry);
        Ok(())
    }

    /// Removes a session and returns its entry, or `None` if it was not
    /// registered (already removed, or never admitted).
    pub fn remove(&mut self, id: ConnectionId) -> Option<SessionEntry> {
        let entry = self.sessions.remove(&id);
        if let Some(entry) = &entry {
            tracing::debug!(%id, age_ms = entry.age().as_millis() as u64, "session removed");
        }
        entry
    }

    pub fn get(&self, id: ConnectionId) -> Option<&SessionEntry> {
        self.sessions.get(&id)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Returns the number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no live sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// The configured limit, if any.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Ids of every live session, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.sessions.keys().copied()
    }
}
