//! The single active connection eligible for seed status pushes.
//!
//! The most recent session to connect takes over push notifications
//! ("last connection wins"). Older sessions stay open and keep receiving
//! their own command replies; they are simply no longer referenced here.
//!
//! The reference is guarded by a `std::sync::Mutex` that is held only to
//! swap or clone the `Arc`, never across a socket write. Writes go through
//! the connection's own write lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::connection::{ClientConnection, ConnectionId};
use crate::error::DeliveryError;

/// Holds the active client connection.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    active: Mutex<Option<Arc<ClientConnection>>>,
}

impl ConnectionManager {
    /// Creates a manager with no active connection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<ClientConnection>>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes `conn` the active connection.
    ///
    /// Returns the displaced connection, which is not closed: its own
    /// session remains responsible for it.
    pub fn set_active(&self, conn: Arc<ClientConnection>) -> Option<Arc<ClientConnection>> {
        self.slot().replace(conn)
    }

    /// Clears the active connection if it is still `id`.
    ///
    /// Returns `true` if the reference was cleared. A session that has
    /// already been displaced leaves the newer connection in place.
    pub fn clear_if_active(&self, id: ConnectionId) -> bool {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|conn| conn.id() == id) {
            *slot = None;
            true
        } else {
            false
        }
    }

    /// Removes and returns the active connection.
    pub fn take_active(&self) -> Option<Arc<ClientConnection>> {
        self.slot().take()
    }

    /// Returns a handle to the active connection, if any.
    #[must_use]
    pub fn active(&self) -> Option<Arc<ClientConnection>> {
        self.slot().clone()
    }

    /// Returns the active connection's identifier, if any.
    #[must_use]
    pub fn active_id(&self) -> Option<ConnectionId> {
        self.slot().as_ref().map(|conn| conn.id())
    }

    /// Writes one line to the active connection.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::NoActiveConnection`] if nobody is
    /// connected, or [`DeliveryError::Write`] if the socket write fails.
    pub async fn send_to_active(&self, line: &str) -> Result<(), DeliveryError> {
        let conn = self.active().ok_or(DeliveryError::NoActiveConnection)?;
        conn.send_line(line).await.map_err(DeliveryError::Write)
    }
}
