//! WebSocket transport using `tokio-tungstenite`.
//!
//! Every message is one WebSocket frame. Ping, pong and raw frames are
//! handled by tungstenite and never reach the caller.
//!
//! Opening handshakes run on their own tasks, off the accept path: a
//! background task accepts TCP streams, upgrades each one concurrently,
//! and queues the upgraded connections for [`Transport::accept`]. A peer
//! that connects and never upgrades only holds up its own handshake task.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::{Connection, ConnectionId, Transport, TransportError};

/// How long a client gets to finish the opening handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Upgraded connections waiting for `accept`.
const ACCEPT_QUEUE: usize = 64;

/// A WebSocket [`Transport`] that upgrades every accepted TCP stream.
///
/// Dropping the transport stops the listener.
pub struct WebSocketTransport {
    local_addr: SocketAddr,
    upgraded: mpsc::Receiver<WebSocketConnection>,
    listener_task: JoinHandle<()>,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address and starts
    /// accepting in the background.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        let local_addr = listener.local_addr().map_err(TransportError::AcceptFailed)?;
        let (tx, upgraded) = mpsc::channel(ACCEPT_QUEUE);
        let listener_task = tokio::spawn(listen(listener, tx));
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self {
            local_addr,
            upgraded,
            listener_task,
        })
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.listener_task.abort();
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;

    async fn accept(&mut self) -> Result<Self::Connection, TransportError> {
        self.upgraded
            .recv()
            .await
            .ok_or_else(|| TransportError::ConnectionClosed("WebSocket listener stopped".into()))
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        Ok(self.local_addr)
    }
}

/// Accepts TCP streams forever, spawning one handshake task per stream.
async fn listen(listener: TcpListener, upgraded: mpsc::Sender<WebSocketConnection>) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::error!(error = %e, "TCP accept failed");
                // Out of file descriptors and the like; let some close.
                tokio::time::sleep(Duration::from_millis(50)).await;
                continue;
            }
        };

        let upgraded = upgraded.clone();
        tokio::spawn(async move {
            match upgrade(stream, addr).await {
                Ok(conn) => {
                    if upgraded.send(conn).await.is_err() {
                        tracing::debug!(%addr, "transport dropped before connection was accepted");
                    }
                }
                Err(e) => tracing::debug!(%addr, error = %e, "WebSocket handshake failed"),
            }
        });
    }
}

/// Runs the opening handshake on one stream, bounded by
/// [`HANDSHAKE_TIMEOUT`].
async fn upgrade(stream: TcpStream, addr: SocketAddr) -> Result<WebSocketConnection, TransportError> {
    stream.set_nodelay(true).map_err(TransportError::AcceptFailed)?;

    let ws = match tokio::time::timeout(HANDSHAKE_TIMEOUT, tokio_tungstenite::accept_async(stream)).await {
        Ok(Ok(ws)) => ws,
        Ok(Err(e)) => {
            return Err(TransportError::AcceptFailed(io_error(
                std::io::ErrorKind::ConnectionRefused,
                e,
            )));
        }
        Err(_) => {
            return Err(TransportError::AcceptFailed(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("{addr} did not finish the WebSocket handshake"),
            )));
        }
    };

    let id = ConnectionId::next();
    tracing::debug!(%id, %addr, "accepted WebSocket connection");

    let (sink, stream) = ws.split();
    Ok(WebSocketConnection {
        id,
        peer: addr,
        sink: Mutex::new(sink),
        stream: Mutex::new(stream),
    })
}

/// A single WebSocket connection.
///
/// UTF-8 payloads go out as text frames so browser clients can read them
/// directly; anything else goes out as a binary frame. Like the TCP
/// connection, the two directions sit behind separate locks.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    sink: Mutex<SplitSink<WebSocketStream<TcpStream>, Message>>,
    stream: Mutex<SplitStream<WebSocketStream<TcpStream>>>,
}

impl Connection for WebSocketConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let msg = match std::str::from_utf8(data) {
            Ok(text) => Message::text(text),
            Err(_) => Message::binary(data.to_vec()),
        };
        self.sink.lock().await.send(msg).await.map_err(|e| match e {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                TransportError::ConnectionClosed(format!("{} is closed", self.id))
            }
            e => TransportError::SendFailed(io_error(std::io::ErrorKind::BrokenPipe, e)),
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut stream = self.stream.lock().await;
        while let Some(msg) = stream.next().await {
            match msg {
                Ok(Message::Text(text)) => return Ok(Some(text.as_bytes().to_vec())),
                Ok(Message::Binary(data)) => return Ok(Some(data.to_vec())),
                Ok(Message::Close(_)) => return Ok(None),
                Ok(_) => continue,
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return Ok(None);
                }
                Err(e) => {
                    return Err(TransportError::ReceiveFailed(io_error(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
        Ok(None)
    }

    async fn close(&self) -> Result<(), TransportError> {
        match self.sink.lock().await.close().await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(TransportError::SendFailed(io_error(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))),
        }
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        Some(self.peer)
    }
}

fn io_error(kind: std::io::ErrorKind, e: tungstenite::Error) -> std::io::Error {
    std::io::Error::new(kind, e)
}
