//! Plain TCP transport with newline framing.
//!
//! Every message is one line: the sender appends `\n`, the receiver strips
//! the trailing `\n` (and a `\r` before it, so `telnet`/`nc` clients work).
//! A line longer than [`MAX_LINE_LEN`] bytes is a
//! [`TransportError::FrameTooLarge`]; nothing past the limit is buffered.

use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Longest accepted line, terminator excluded.
pub const MAX_LINE_LEN: usize = 1024;

/// A TCP [`Transport`] whose connections exchange `\n`-terminated lines.
pub struct TcpLineTransport {
    listener: TcpListener,
}

impl TcpLineTransport {
    /// Binds a new line-framed TCP transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TCP line transport listening");
        Ok(Self { listener })
    }
}

impl Transport for TcpLineTransport {
    type Connection = TcpLineConnection;

    async fn accept(&mut self) -> Result<Self::Connection, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        stream.set_nodelay(true).map_err(TransportError::AcceptFailed)?;

        let id = ConnectionId::next();
        tracing::debug!(%id, %addr, "accepted TCP connection");

        let (reader, writer) = stream.into_split();
        Ok(TcpLineConnection {
            id,
            peer: addr,
            reader: Mutex::new(BufReader::new(reader)),
            writer: Mutex::new(writer),
        })
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// A single line-framed TCP connection.
///
/// The read and write halves sit behind separate locks, so a pending
/// `recv` never blocks a `send` on the same connection.
pub struct TcpLineConnection {
    id: ConnectionId,
    peer: SocketAddr,
    reader: Mutex<BufReader<OwnedReadHalf>>,
    writer: Mutex<OwnedWriteHalf>,
}

impl Connection for TcpLineConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        writer
            .write_all(data)
            .await
            .map_err(TransportError::SendFailed)?;
        writer
            .write_all(b"\n")
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut line = Vec::new();
        let mut reader = self.reader.lock().await;
        // Room for the longest line plus `\r\n`, and no more.
        let read = (&mut *reader)
            .take(MAX_LINE_LEN as u64 + 2)
            .read_until(b'\n', &mut line)
            .await
            .map_err(TransportError::ReceiveFailed)?;

        if read == 0 {
            return Ok(None);
        }
        let line = strip_line_ending(line);
        if line.len() > MAX_LINE_LEN {
            tracing::warn!(id = %self.id, limit = MAX_LINE_LEN, "line too long");
            return Err(TransportError::FrameTooLarge {
                limit: MAX_LINE_LEN,
            });
        }
        Ok(Some(line))
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        Some(self.peer)
    }
}

/// Drops a trailing `\n` or `\r\n`. A final line without a terminator
/// (peer closed mid-line) is returned as-is.
fn strip_line_ending(mut line: Vec<u8>) -> Vec<u8> {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
    line
}
