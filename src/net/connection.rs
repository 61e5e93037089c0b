//! One client's outbound half, shared by its session and the monitor.
//!
//! Every line written to a client goes through [`ClientConnection::send_line`],
//! which holds the connection's write lock for the whole encoded line. A
//! command reply and a sensor push may therefore race for the socket, but
//! never interleave within a line.

use std::fmt;
use std::io;
use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use futures_util::SinkExt;
use tokio::io::AsyncWrite;
use tokio::sync::Mutex;
use tokio_util::codec::{FramedWrite, LinesCodec, LinesCodecError};

/// Unique identifier for an accepted connection.
///
/// Wraps a UUID v4 generated at accept time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Creates a new random `ConnectionId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type LineSink = FramedWrite<Box<dyn AsyncWrite + Send + Unpin>, LinesCodec>;

/// Converts a line codec failure into an I/O error.
pub(crate) fn codec_to_io(err: LinesCodecError) -> io::Error {
    match err {
        LinesCodecError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}

/// Write side of an accepted client socket.
pub struct ClientConnection {
    id: ConnectionId,
    peer: SocketAddr,
    connected_at: DateTime<Utc>,
    writer: Mutex<LineSink>,
}

impl ClientConnection {
    /// Wraps the write half of a client socket.
    pub fn new<W>(peer: SocketAddr, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let writer: Box<dyn AsyncWrite + Send + Unpin> = Box::new(writer);
        Self {
            id: ConnectionId::new(),
            peer,
            connected_at: Utc::now(),
            writer: Mutex::new(FramedWrite::new(writer, LinesCodec::new())),
        }
    }

    /// Returns the connection's identifier.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the remote address.
    #[must_use]
    pub const fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Returns when the connection was accepted.
    #[must_use]
    pub const fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Writes `line` followed by `\n` and flushes it.
    ///
    /// # Errors
    ///
    /// Returns the socket's I/O error if the write or flush fails.
    pub async fn send_line(&self, line: &str) -> io::Result<()> {
        let mut sink = self.writer.lock().await;
        sink.send(line).await.map_err(codec_to_io)
    }

    /// Writes the line produced by `render`, evaluated only once the write
    /// lock is held.
    ///
    /// A line that reflects shared state must be rendered under the lock,
    /// or a concurrent writer holding a newer value may get ahead of it.
    ///
    /// # Errors
    ///
    /// Returns the socket's I/O error if the write or flush fails.
    pub async fn send_line_with<F, S>(&self, render: F) -> io::Result<S>
    where
        F: FnOnce() -> S,
        S: AsRef<str> + Clone,
    {
        let mut sink = self.writer.lock().await;
        let line = render();
        sink.send(line.clone()).await.map_err(codec_to_io)?;
        Ok(line)
    }

    /// Flushes and shuts down the write half.
    ///
    /// # Errors
    ///
    /// Returns the socket's I/O error if the shutdown fails.
    pub async fn close(&self) -> io::Result<()> {
        let mut sink = self.writer.lock().await;
        SinkExt::<&str>::close(&mut *sink).await.map_err(codec_to_io)
    }
}

impl fmt::Debug for ClientConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConnection")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("connected_at", &self.connected_at)
            .finish_non_exhaustive()
    }
}
