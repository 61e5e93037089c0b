//! Network layer: listener, sessions and the active-connection registry.
//!
//! The TCP endpoint speaks a newline-delimited ASCII protocol: command
//! lines in, reply lines and unsolicited `SEED_STATUS:*` lines out.

pub mod connection;
pub mod listener;
pub mod manager;
pub mod session;

pub use connection::{ClientConnection, ConnectionId};
pub use listener::{serve, shutdown_signal};
pub use manager::ConnectionManager;
pub use session::run_session;
