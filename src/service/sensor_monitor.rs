//! Seed sensor polling with edge-triggered client notifications.
//!
//! [`SensorMonitor`] samples the sensor on a fixed interval, records each
//! reading in the shared [`SeedLevel`], and pushes a status line to the
//! active connection only when the level changes. Pushes are best-effort:
//! a failed delivery is logged and dropped, since a client that attaches
//! later receives the current level in its initial status line.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::domain::{SeedLevel, SeedStatus};
use crate::error::{DeliveryError, HardwareError};
use crate::hardware::SeedSensor;
use crate::net::ConnectionManager;

/// Upper bound on a single push so a stalled client cannot stall polling.
const PUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Polls the seed sensor and reports level transitions.
///
/// Cheap to clone: all state is shared behind `Arc`s, so the supervisor
/// can restart a fresh polling loop over the same sensor.
#[derive(Debug, Clone)]
pub struct SensorMonitor {
    sensor: Arc<Mutex<Box<dyn SeedSensor>>>,
    seed_level: Arc<SeedLevel>,
    connections: Arc<ConnectionManager>,
    poll_interval: Duration,
    error_backoff: Duration,
}

impl SensorMonitor {
    /// Creates a monitor over the given sensor.
    #[must_use]
    pub fn new(
        sensor: Box<dyn SeedSensor>,
        seed_level: Arc<SeedLevel>,
        connections: Arc<ConnectionManager>,
        poll_interval: Duration,
        error_backoff: Duration,
    ) -> Self {
        Self {
            sensor: Arc::new(Mutex::new(sensor)),
            seed_level,
            connections,
            poll_interval,
            error_backoff,
        }
    }

    /// Reads the sensor once and records the level.
    ///
    /// Returns the new status on a transition, `None` when the level is
    /// unchanged. Nothing is sent to clients.
    ///
    /// # Errors
    ///
    /// Returns the sensor's [`HardwareError`] if the read fails; the seed
    /// level is left untouched.
    pub fn poll(&self) -> Result<Option<SeedStatus>, HardwareError> {
        let level = self
            .sensor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .read_level()?;
        let transition = self.seed_level.record(level);
        if let Some(status) = transition {
            let detail = match status {
                SeedStatus::Empty => "hopper empty, sensor blocked",
                SeedStatus::Normal => "seeds available, sensor uncovered",
            };
            tracing::info!(%status, detail, "seed level changed");
        }
        Ok(transition)
    }

    /// Runs one monitor tick: poll, then push any transition to the
    /// active connection.
    ///
    /// # Errors
    ///
    /// Returns the sensor's [`HardwareError`]. Delivery failures are
    /// logged, never returned.
    pub async fn tick(&self) -> Result<Option<SeedStatus>, HardwareError> {
        let transition = self.poll()?;
        if let Some(status) = transition {
            self.deliver(status).await;
        }
        Ok(transition)
    }

    async fn deliver(&self, status: SeedStatus) {
        let send = self.connections.send_to_active(status.wire_line());
        match tokio::time::timeout(PUSH_TIMEOUT, send).await {
            Ok(Ok(())) => tracing::info!(%status, "sent seed status"),
            Ok(Err(DeliveryError::NoActiveConnection)) => {
                tracing::debug!(%status, "no active connection for seed status");
            }
            Ok(Err(e)) => tracing::warn!(%status, error = %e, "failed to send status update"),
            Err(_) => tracing::warn!(%status, "status update timed out"),
        }
    }

    /// Polls forever, sleeping `poll_interval` between ticks and
    /// `error_backoff` after a failed read.
    pub async fn run(self) {
        loop {
            let pause = match self.tick().await {
                Ok(_) => self.poll_interval,
                Err(e) => {
                    tracing::warn!(error = %e, "seed monitor error");
                    self.error_backoff
                }
            };
            tokio::time::sleep(pause).await;
        }
    }

    /// Spawns the polling loop under a supervisor that restarts it after
    /// `error_backoff` if it panics.
    ///
    /// The returned handle completes only if the supervisor itself is
    /// cancelled.
    pub fn spawn_supervised(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let worker = tokio::spawn(self.clone().run());
                match worker.await {
                    Ok(()) => tracing::warn!("seed monitor exited; restarting"),
                    Err(e) if e.is_panic() => {
                        tracing::error!(error = %e, "seed monitor panicked; restarting");
                    }
                    Err(_) => {
                        tracing::info!("seed monitor cancelled");
                        return;
                    }
                }
                tokio::time::sleep(self.error_backoff).await;
            }
        })
    }
}
