//! Per-connection session: one client, end to end.
//!
//! A session registers itself as the active connection, sends the current
//! seed status, then answers commands one at a time until the client
//! disconnects or sends `EXIT`. It never touches another session's socket.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, LinesCodec};

use super::connection::{ClientConnection, codec_to_io};
use crate::app_state::AppState;
use crate::domain::{Command, Reply};

/// Longest accepted command line, in bytes.
pub const MAX_LINE_LENGTH: usize = 1024;

/// Why a session ended without a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client closed its side of the socket.
    PeerClosed,
    /// The client sent `EXIT`.
    Exit,
}

/// Runs a session over any byte stream until it ends.
///
/// On return the session has unregistered itself (if still active) and
/// shut down its socket.
pub async fn run_session<S>(stream: S, peer: SocketAddr, state: AppState)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let conn = Arc::new(ClientConnection::new(peer, writer));
    let conn_id = conn.id();

    if let Some(previous) = state.connections.set_active(Arc::clone(&conn)) {
        tracing::info!(%conn_id, previous = %previous.id(), "took over seed status pushes");
    }
    tracing::info!(%conn_id, %peer, "client connected");

    match serve(&conn, reader, &state).await {
        Ok(SessionEnd::PeerClosed) => tracing::info!(%conn_id, "client closed connection"),
        Ok(SessionEnd::Exit) => tracing::info!(%conn_id, "client requested exit"),
        Err(e) if is_disconnect(&e) => {
            tracing::info!(%conn_id, error = %e, "client disconnected unexpectedly");
        }
        Err(e) => tracing::warn!(%conn_id, error = %e, "client handling error"),
    }

    state.connections.clear_if_active(conn_id);
    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "socket shutdown failed");
    }
    let duration_ms = (chrono::Utc::now() - conn.connected_at()).num_milliseconds();
    tracing::info!(%conn_id, duration_ms, "connection closed");
}

async fn serve<R>(
    conn: &ClientConnection,
    reader: R,
    state: &AppState,
) -> io::Result<SessionEnd>
where
    R: AsyncRead + Unpin,
{
    let conn_id = conn.id();
    // Rendered under the write lock so a concurrent push cannot overtake it.
    let status = conn
        .send_line_with(|| state.seed_level.status().wire_line())
        .await?;
    tracing::debug!(%conn_id, status, "sent initial seed status");

    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
    while let Some(line) = lines.next().await {
        let line = line.map_err(codec_to_io)?;
        let reply = match line.trim().parse::<Command>() {
            Ok(command) => {
                tracing::info!(%conn_id, %command, "received command");
                state.controller.execute(command)
            }
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "unknown command");
                Reply::Error
            }
        };

        let Some(text) = reply.wire_line() else {
            return Ok(SessionEnd::Exit);
        };
        conn.send_line(text).await?;
    }
    Ok(SessionEnd::PeerClosed)
}

fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;
    use crate::domain::Direction;
    use crate::hardware::{MotorProbe, SimulatedMotor};

    fn peer() -> SocketAddr {
        SocketAddr::from(([10, 0, 0, 2], 51000))
    }

    fn make_state() -> (AppState, MotorProbe) {
        let motor = SimulatedMotor::new();
        let probe = motor.probe();
        let Ok(state) = AppState::new(Box::new(motor), 12) else {
            panic!("state init");
        };
        (state, probe)
    }

    #[tokio::test]
    async fn initial_status_then_replies_in_order() {
        let (state, probe) = make_state();
        let stream = Builder::new()
            .write(b"SEED_STATUS:NORMAL\n")
            .read(b"FORWARD\n")
            .write(b"OK\n")
            .read(b"START\r\n")
            .write(b"OK\n")
            .read(b"spin\n")
            .write(b"ERROR\n")
            .build();

        run_session(stream, peer(), state.clone()).await;

        let out = probe.outputs();
        assert_eq!(out.direction, Direction::Forward);
        assert_eq!(out.duty_cycle, 100);
        assert_eq!(state.connections.active_id(), None);
    }

    #[tokio::test]
    async fn start_refused_when_hopper_empty() {
        let (state, probe) = make_state();
        let _ = state.seed_level.record(true);
        let stream = Builder::new()
            .write(b"SEED_STATUS:EMPTY\n")
            .read(b"START\n")
            .write(b"ERROR:NO_SEEDS\n")
            .build();

        run_session(stream, peer(), state).await;
        assert_eq!(probe.outputs().direction, Direction::Stopped);
    }

    #[tokio::test]
    async fn exit_closes_without_reply() {
        let (state, probe) = make_state();
        // Anything after EXIT is never read.
        let stream = Builder::new()
            .write(b"SEED_STATUS:NORMAL\n")
            .read(b"EXIT\n")
            .build();

        run_session(stream, peer(), state).await;
        assert_eq!(probe.outputs().shutdowns, 1);
    }

    #[tokio::test]
    async fn unknown_command_leaves_motor_untouched() {
        let (state, _) = make_state();
        let before = state.controller.state();
        let stream = Builder::new()
            .write(b"SEED_STATUS:NORMAL\n")
            .read(b"start\n")
            .write(b"ERROR\n")
            .read(b"\n")
            .write(b"ERROR\n")
            .build();

        run_session(stream, peer(), state.clone()).await;
        assert_eq!(state.controller.state(), before);
    }

    #[tokio::test]
    async fn reset_ends_session() {
        let (state, _) = make_state();
        let stream = Builder::new()
            .write(b"SEED_STATUS:NORMAL\n")
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();

        run_session(stream, peer(), state.clone()).await;
        assert_eq!(state.connections.active_id(), None);
    }
}
