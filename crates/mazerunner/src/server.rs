//! `MazeServer` builder and accept loop.
//!
//! This is the entry point for running a maze server. It ties together
//! all the layers: transport → protocol → session → maze.

use std::path::PathBuf;
use std::sync::Arc;

use mazerunner_maze::TemplateCatalog;
use mazerunner_protocol::Codec;
use mazerunner_session::{SessionEntry, SessionRegistry};
use mazerunner_transport::{
    Connection, ConnectionId, TcpLineTransport, Transport, TransportError,
    WebSocketTransport,
};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{MazeServerError, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. Only the
/// registry is mutable; the catalog and codec are read-only.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) sessions: Arc<Mutex<SessionRegistry>>,
    pub(crate) catalog: TemplateCatalog,
    pub(crate) codec: C,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a maze server.
///
/// # Example
///
/// ```rust,no_run
/// use mazerunner::MazeServerBuilder;
/// use mazerunner_protocol::TextCodec;
///
/// # async fn run() -> Result<(), mazerunner::MazeServerError> {
/// let server = MazeServerBuilder::new()
///     .bind("0.0.0.0:8889")
///     .max_sessions(16)
///     .build_tcp(TextCodec)
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct MazeServerBuilder {
    bind_addr: String,
    max_sessions: usize,
    maps_dir: PathBuf,
    catalog: Option<TemplateCatalog>,
}

impl MazeServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::from_config(&ServerConfig::default())
    }

    /// A builder carrying the address, limit and maps directory of
    /// `config`. Transport and wire format are chosen by which `build_*`
    /// method is called.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            bind_addr: config.bind_addr(),
            max_sessions: config.max_connections,
            maps_dir: config.maps_dir.clone(),
            catalog: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the maximum number of live sessions.
    pub fn max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    /// Sets the directory templates are loaded from at build time.
    /// Ignored if a catalog is given with [`catalog`](Self::catalog).
    pub fn maps_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.maps_dir = dir.into();
        self
    }

    /// Uses an already loaded template catalog.
    pub fn catalog(mut self, catalog: TemplateCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Binds a newline-delimited TCP listener and builds the server.
    pub async fn build_tcp<C: Codec>(
        self,
        codec: C,
    ) -> Result<MazeServer<TcpLineTransport, C>, MazeServerError> {
        let transport = TcpLineTransport::bind(&self.bind_addr).await?;
        self.build_with(transport, codec)
    }

    /// Binds a WebSocket listener and builds the server.
    pub async fn build_websocket<C: Codec>(
        self,
        codec: C,
    ) -> Result<MazeServer<WebSocketTransport, C>, MazeServerError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        self.build_with(transport, codec)
    }

    /// Builds the server on an already bound transport.
    ///
    /// # Errors
    /// [`MazeServerError::Maze`] if no catalog was given and the maps
    /// directory cannot be loaded.
    pub fn build_with<T: Transport, C: Codec>(
        self,
        transport: T,
        codec: C,
    ) -> Result<MazeServer<T, C>, MazeServerError> {
        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => TemplateCatalog::load_dir(&self.maps_dir)?,
        };

        let state = Arc::new(ServerState {
            sessions: Arc::new(Mutex::new(SessionRegistry::with_limit(
                self.max_sessions,
            ))),
            catalog,
            codec,
        });

        Ok(MazeServer { transport, state })
    }
}

impl Default for MazeServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// A maze server bound to a transport.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct MazeServer<T: Transport, C: Codec> {
    transport: T,
    state: Arc<ServerState<C>>,
}

impl<T: Transport, C: Codec> MazeServer<T, C> {
    /// Creates a new builder.
    pub fn builder() -> MazeServerBuilder {
        MazeServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// A read-only view of the live sessions that stays valid after
    /// [`run()`](Self::run) has taken the server.
    pub fn registry(&self) -> RegistryHandle {
        RegistryHandle {
            sessions: Arc::clone(&self.state.sessions),
        }
    }

    /// Runs the server accept loop.
    ///
    /// Each accepted connection is registered and gets its own Tokio task.
    /// A connection over the session limit is closed without being
    /// registered. Runs until the process is terminated, or returns an
    /// error if the transport's listener stops.
    pub async fn run(mut self) -> Result<(), MazeServerError> {
        tracing::info!(
            templates = self.state.catalog.len(),
            "maze server running"
        );

        loop {
            let conn = match self.transport.accept().await {
                Ok(conn) => conn,
                Err(e @ TransportError::ConnectionClosed(_)) => {
                    tracing::error!(error = %e, "listener stopped");
                    return Err(e.into());
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                    continue;
                }
            };

            let id = conn.id();
            let peer = conn.peer_addr();
            let admitted = self
                .state
                .sessions
                .lock()
                .await
                .insert(SessionEntry::new(id, peer));

            if let Err(e) = admitted {
                tracing::warn!(%id, ?peer, error = %e, "rejecting connection");
                tokio::spawn(async move {
                    if let Err(e) = conn.close().await {
                        tracing::debug!(%id, error = %e, "close of rejected connection failed");
                    }
                });
                continue;
            }

            tracing::info!(%id, ?peer, "connection accepted");
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                if let Err(e) = handle_connection(conn, state).await {
                    tracing::debug!(%id, error = %e, "connection ended with error");
                }
            });
        }
    }
}

// ---------------------------------------------------------------------------
// RegistryHandle
// ---------------------------------------------------------------------------

/// A cloneable, read-only view of a server's session registry.
#[derive(Clone)]
pub struct RegistryHandle {
    sessions: Arc<Mutex<SessionRegistry>>,
}

impl RegistryHandle {
    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Returns `true` if no session is live.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Returns `true` if `id` is registered.
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.sessions.lock().await.contains(id)
    }

    /// Ids of every live session.
    pub async fn ids(&self) -> Vec<ConnectionId> {
        self.sessions.lock().await.ids().collect()
    }
}
