//! Shared application state handed to every session.

use std::sync::Arc;

use crate::domain::SeedLevel;
use crate::error::HardwareError;
use crate::hardware::Actuator;
use crate::net::ConnectionManager;
use crate::service::MotorController;

/// State shared by the listener, every session and the sensor monitor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Command processor owning the motor.
    pub controller: Arc<MotorController>,
    /// Last observed seed level.
    pub seed_level: Arc<SeedLevel>,
    /// Active connection for status pushes.
    pub connections: Arc<ConnectionManager>,
}

impl AppState {
    /// Builds the state around an actuator, applying the initial duty.
    ///
    /// # Errors
    ///
    /// Returns a [`HardwareError`] if the actuator rejects its initial
    /// outputs.
    pub fn new(actuator: Box<dyn Actuator>, initial_duty: u8) -> Result<Self, HardwareError> {
        let seed_level = Arc::new(SeedLevel::new());
        let controller = MotorController::new(actuator, Arc::clone(&seed_level), initial_duty)?;
        Ok(Self {
            controller: Arc::new(controller),
            seed_level,
            connections: Arc::new(ConnectionManager::new()),
        })
    }
}
