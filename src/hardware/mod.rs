//! Hardware abstraction: the motor actuator and the seed sensor.
//!
//! ```text
//!   MotorController ──▶ Actuator   ──▶ SimulatedMotor | SysfsMotor
//!   SensorMonitor   ──▶ SeedSensor ──▶ SimulatedSensor | SysfsSensor
//! ```
//!
//! The service layer only ever talks to the traits, so the simulated
//! backend used in tests and the sysfs backend used on the board are
//! interchangeable. Both traits are synchronous: every operation is a
//! single short register or sysfs attribute access.

pub mod simulated;
pub mod sysfs;

use std::fmt;

use crate::config::{HardwareBackend, PinConfig};
use crate::domain::Direction;
use crate::error::HardwareError;

pub use simulated::{MotorProbe, SensorProbe, SimulatedMotor, SimulatedSensor};
pub use sysfs::{SysfsMotor, SysfsSensor};

/// Write-side port: drives the motor's H-bridge and PWM enable line.
///
/// Calls block the calling thread. They are made directly from session
/// tasks while the controller lock is held, so an implementation must keep
/// each call to a few attribute writes and never wait on the device.
pub trait Actuator: Send + fmt::Debug {
    /// Applies a direction to the H-bridge inputs.
    ///
    /// # Errors
    ///
    /// Returns a [`HardwareError`] if the outputs cannot be written.
    fn set_direction(&mut self, direction: Direction) -> Result<(), HardwareError>;

    /// Sets the PWM duty cycle in percent.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InvalidDutyCycle`] above 100, or an I/O
    /// error from the backend.
    fn set_duty_cycle(&mut self, percent: u8) -> Result<(), HardwareError>;

    /// Drives every output low and releases the underlying resources.
    ///
    /// A later `set_*` call re-acquires them.
    ///
    /// # Errors
    ///
    /// Returns a [`HardwareError`] if any output could not be released.
    fn shutdown(&mut self) -> Result<(), HardwareError>;
}

/// Read-side port: the seed-presence sensor.
pub trait SeedSensor: Send + fmt::Debug {
    /// Reads the raw digital level. `true` means the beam is blocked.
    ///
    /// # Errors
    ///
    /// Returns a [`HardwareError`] if the input cannot be read.
    fn read_level(&mut self) -> Result<bool, HardwareError>;
}

/// Actuator and sensor built for the configured backend.
#[derive(Debug)]
pub struct HardwareSet {
    /// Motor driver.
    pub actuator: Box<dyn Actuator>,
    /// Seed sensor.
    pub sensor: Box<dyn SeedSensor>,
}

/// Opens the configured backend.
///
/// # Errors
///
/// Returns a [`HardwareError`] if the sysfs backend cannot export or
/// configure its pins.
pub fn open(backend: HardwareBackend, pins: &PinConfig) -> Result<HardwareSet, HardwareError> {
    match backend {
        HardwareBackend::Simulated => Ok(HardwareSet {
            actuator: Box::new(SimulatedMotor::new()),
            sensor: Box::new(SimulatedSensor::new()),
        }),
        HardwareBackend::Sysfs => Ok(HardwareSet {
            actuator: Box::new(SysfsMotor::open(pins)?),
            sensor: Box::new(SysfsSensor::open(pins.seed_sensor)?),
        }),
    }
}

/// Checks that a duty cycle is a valid percentage.
pub(crate) fn check_duty(percent: u8) -> Result<u8, HardwareError> {
    if percent > 100 {
        Err(HardwareError::InvalidDutyCycle(percent))
    } else {
        Ok(percent)
    }
}
