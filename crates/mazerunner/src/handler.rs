//! Per-connection handler: request loop and session disposal.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Create a `GameSession` for the (already registered) connection
//!   2. Loop: receive a message → decode a request → let the session
//!      answer → encode and send the reply
//!   3. On `STOP`, end-of-stream or a transport error: remove the registry
//!      entry, then close the connection

use std::sync::Arc;

use mazerunner_protocol::{Codec, Response, ServerReply};
use mazerunner_session::{GameSession, Reply, SessionRegistry};
use mazerunner_transport::{Connection, ConnectionId};
use tokio::sync::Mutex;

use crate::MazeServerError;
use crate::server::ServerState;

/// Removes a session from the registry exactly once.
///
/// The normal path calls [`dispose`](Self::dispose). If the handler task
/// panics or is cancelled first, `Drop` spawns the removal instead. Since
/// `Drop` is synchronous, that removal is a fire-and-forget task.
struct SessionGuard {
    id: ConnectionId,
    sessions: Arc<Mutex<SessionRegistry>>,
    disposed: bool,
}

impl SessionGuard {
    fn new(id: ConnectionId, sessions: Arc<Mutex<SessionRegistry>>) -> Self {
        Self {
            id,
            sessions,
            disposed: false,
        }
    }

    async fn dispose(mut self) {
        self.disposed = true;
        if self.sessions.lock().await.remove(self.id).is_none() {
            tracing::warn!(id = %self.id, "session was not registered at disposal");
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.disposed {
            return;
        }
        let id = self.id;
        let sessions = Arc::clone(&self.sessions);
        // No runtime means the process is shutting down and the registry
        // goes with it.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                sessions.lock().await.remove(id);
            });
        }
    }
}

/// Handles a single registered connection from accept to close.
///
/// The registry entry is always removed before the connection is closed,
/// so a client that sees end-of-stream is already gone from the registry.
pub(crate) async fn handle_connection<Conn, C>(
    conn: Conn,
    state: Arc<ServerState<C>>,
) -> Result<(), MazeServerError>
where
    Conn: Connection,
    C: Codec,
{
    let id = conn.id();
    let guard = SessionGuard::new(id, Arc::clone(&state.sessions));
    let mut session = GameSession::new(id);

    let result = serve(&conn, &state, &mut session).await;

    session.close();
    guard.dispose().await;
    if let Err(e) = conn.close().await {
        tracing::debug!(%id, error = %e, "close failed");
    }
    tracing::info!(%id, "session disposed");

    result
}

/// The request loop. Returns when the session asks to close, the peer
/// hangs up, or the transport fails.
async fn serve<Conn, C>(
    conn: &Conn,
    state: &ServerState<C>,
    session: &mut GameSession,
) -> Result<(), MazeServerError>
where
    Conn: Connection,
    C: Codec,
{
    let id = conn.id();

    loop {
        let data = match conn.recv().await? {
            Some(data) => data,
            None => {
                tracing::info!(%id, "connection closed by peer");
                return Ok(());
            }
        };

        let request = state.codec.decode_request(&data);
        tracing::debug!(%id, %request, "request received");

        let reply = session.handle(request, &state.catalog, &mut rand::rng());
        match reply {
            Reply::Send(reply) => send_reply(conn, &state.codec, reply).await?,
            Reply::Close => {
                tracing::info!(%id, "client stopped the session");
                return Ok(());
            }
        }
    }
}

/// Encodes and sends one reply. A reply that cannot be encoded is logged
/// and replaced by `ERROR`.
async fn send_reply<Conn, C>(
    conn: &Conn,
    codec: &C,
    reply: ServerReply,
) -> Result<(), MazeServerError>
where
    Conn: Connection,
    C: Codec,
{
    let bytes = match codec.encode_reply(&reply) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(id = %conn.id(), %reply, error = %e, "failed to encode reply");
            codec.encode_reply(&ServerReply::Status(Response::Error))?
        }
    };
    conn.send(&bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazerunner_session::SessionEntry;
    use std::time::Duration;

    fn registry_with(id: ConnectionId) -> Arc<Mutex<SessionRegistry>> {
        let mut registry = SessionRegistry::new();
        registry.insert(SessionEntry::new(id, None)).unwrap();
        Arc::new(Mutex::new(registry))
    }

    /// Waits for the removal task spawned by `Drop`.
    async fn wait_until_removed(sessions: &Mutex<SessionRegistry>, id: ConnectionId) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while sessions.lock().await.contains(id) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("entry should be removed");
    }

    #[tokio::test]
    async fn test_guard_dispose_removes_entry_immediately() {
        let id = ConnectionId::new(1);
        let sessions = registry_with(id);

        SessionGuard::new(id, Arc::clone(&sessions)).dispose().await;

        assert!(sessions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_guard_dispose_does_not_remove_twice() {
        let id = ConnectionId::new(2);
        let sessions = registry_with(id);

        SessionGuard::new(id, Arc::clone(&sessions)).dispose().await;
        // Same id registered again: a second removal would wrongly drop it.
        sessions
            .lock()
            .await
            .insert(SessionEntry::new(id, None))
            .unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert!(sessions.lock().await.contains(id));
    }

    #[tokio::test]
    async fn test_guard_drop_without_dispose_removes_entry() {
        let id = ConnectionId::new(3);
        let sessions = registry_with(id);

        drop(SessionGuard::new(id, Arc::clone(&sessions)));

        wait_until_removed(&sessions, id).await;
    }

    #[tokio::test]
    async fn test_guard_removes_entry_when_task_panics() {
        let id = ConnectionId::new(4);
        let sessions = registry_with(id);

        let guard_sessions = Arc::clone(&sessions);
        let task = tokio::spawn(async move {
            let _guard = SessionGuard::new(id, guard_sessions);
            panic!("handler failed mid-request");
        });
        assert!(task.await.unwrap_err().is_panic());

        wait_until_removed(&sessions, id).await;
    }

    #[tokio::test]
    async fn test_guard_removes_entry_when_task_is_cancelled() {
        let id = ConnectionId::new(5);
        let sessions = registry_with(id);

        let guard_sessions = Arc::clone(&sessions);
        let task = tokio::spawn(async move {
            let _guard = SessionGuard::new(id, guard_sessions);
            std::future::pending::<()>().await;
        });
        tokio::task::yield_now().await;
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        wait_until_removed(&sessions, id).await;
    }
}
