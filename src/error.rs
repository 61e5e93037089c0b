//! Error types for the control service.
//!
//! [`ControlError`] is the crate-level error surfaced at startup.
//! [`HardwareError`] covers every failure of the actuator and sensor
//! backends; it never reaches a client directly. Command-level failures are
//! expressed as protocol replies (see [`crate::domain::Reply`]) rather than
//! errors.

use std::io;
use std::path::PathBuf;

/// Failure reported by an actuator or sensor backend.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// A sysfs attribute could not be read or written.
    #[error("gpio i/o failed at {path}: {source}")]
    Io {
        /// Sysfs attribute that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A sysfs attribute contained something other than the expected value.
    #[error("unexpected value {value:?} read from {path}")]
    UnexpectedValue {
        /// Sysfs attribute that was read.
        path: PathBuf,
        /// Raw trimmed contents.
        value: String,
    },

    /// Requested duty cycle is outside `0..=100`.
    #[error("duty cycle {0}% out of range (0-100)")]
    InvalidDutyCycle(u8),

    /// Fault injected by the simulated backend.
    #[error("simulated fault: {0}")]
    Simulated(String),
}

/// Crate-level error used during startup and wiring.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Hardware backend failed to initialise.
    #[error("hardware error: {0}")]
    Hardware(#[from] HardwareError),

    /// Socket or runtime I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Outcome of a failed push to the active connection.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// No client is currently registered as active.
    #[error("no active connection")]
    NoActiveConnection,

    /// The write to the active client's socket failed.
    #[error("write to active connection failed: {0}")]
    Write(#[source] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardware_error_display_includes_path() {
        let err = HardwareError::Io {
            path: PathBuf::from("/sys/class/gpio/gpio24/value"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let text = err.to_string();
        assert!(text.contains("gpio24"));
        assert!(text.contains("denied"));
    }

    #[test]
    fn control_error_wraps_hardware_error() {
        let err: ControlError = HardwareError::InvalidDutyCycle(120).into();
        assert_eq!(
            err.to_string(),
            "hardware error: duty cycle 120% out of range (0-100)"
        );
    }
}
