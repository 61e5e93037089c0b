//! TCP accept loop and shutdown handling.

use std::future::Future;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinSet;

use super::session::run_session;
use crate::app_state::AppState;
use crate::error::ControlError;

/// Pause after a failed `accept` (e.g. file descriptor exhaustion).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accepts clients until `shutdown` resolves, one task per session.
///
/// On shutdown the actuator is released before the remaining sessions
/// are aborted.
///
/// # Errors
///
/// Returns [`ControlError::Io`] if the listener's local address cannot
/// be read.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), ControlError>
where
    F: Future<Output = ()>,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "listening for clients");

    let mut sessions = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        tracing::debug!(%peer, error = %e, "failed to set TCP_NODELAY");
                    }
                    sessions.spawn(run_session(stream, peer, state.clone()));
                    tracing::info!(%peer, active_sessions = sessions.len(), "accepted connection");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },
            Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                if let Err(e) = joined
                    && e.is_panic()
                {
                    tracing::error!(error = %e, "session task panicked");
                }
            }
            () = &mut shutdown => {
                tracing::info!("server shutting down");
                break;
            }
        }
    }

    if state.controller.shutdown() {
        tracing::info!("motor outputs released");
    }
    sessions.shutdown().await;

    // Aborted sessions never unregister, so the slot may still hold a socket.
    if let Some(conn) = state.connections.take_active()
        && let Err(e) = conn.close().await
    {
        tracing::debug!(conn_id = %conn.id(), error = %e, "socket shutdown failed");
    }
    Ok(())
}

/// Resolves on SIGINT (Ctrl-C) or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
