//! Server configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Every variable is optional; unset or
//! unparsable numeric values fall back to their defaults.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ControlError;

/// Default TCP port the mobile client connects to.
pub const DEFAULT_PORT: u16 = 65432;

/// Which hardware backend drives the motor and reads the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareBackend {
    /// In-memory motor and sensor; no hardware access.
    Simulated,
    /// Linux sysfs GPIO and PWM.
    Sysfs,
}

impl FromStr for HardwareBackend {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simulated" | "sim" => Ok(Self::Simulated),
            "sysfs" => Ok(Self::Sysfs),
            other => Err(ControlError::Config(format!(
                "unknown hardware backend {other:?} (expected \"simulated\" or \"sysfs\")"
            ))),
        }
    }
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line output.
    Text,
    /// One JSON object per event.
    Json,
}

/// GPIO and PWM assignments used by the sysfs backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinConfig {
    /// GPIO driven high for forward rotation.
    pub motor_in1: u32,
    /// GPIO driven high for backward rotation.
    pub motor_in2: u32,
    /// GPIO the seed sensor is wired to (high = blocked = empty).
    pub seed_sensor: u32,
    /// Index of the sysfs PWM chip driving the enable line.
    pub pwm_chip: u32,
    /// Channel on the PWM chip.
    pub pwm_channel: u32,
    /// PWM frequency in hertz.
    pub pwm_frequency_hz: u32,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            motor_in1: 24,
            motor_in2: 23,
            seed_sensor: 17,
            pwm_chip: 0,
            pwm_channel: 0,
            pwm_frequency_hz: 1000,
        }
    }
}

/// Top-level server configuration.
///
/// Loaded once at startup via [`ServerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the listener binds to.
    pub listen_addr: SocketAddr,

    /// Interval between seed sensor polls.
    pub poll_interval: Duration,

    /// Pause after a failed sensor poll before the monitor resumes.
    pub error_backoff: Duration,

    /// Hardware backend selection.
    pub backend: HardwareBackend,

    /// Pin assignments for the sysfs backend.
    pub pins: PinConfig,

    /// Duty cycle applied to the motor at startup, in percent.
    pub initial_duty_cycle: u8,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            poll_interval: Duration::from_millis(500),
            error_backoff: Duration::from_secs(1),
            backend: HardwareBackend::Simulated,
            pins: PinConfig::default(),
            initial_duty_cycle: 12,
            log_format: LogFormat::Text,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Config`] if `LISTEN_ADDR` or
    /// `HARDWARE_BACKEND` is set to a value that cannot be parsed.
    pub fn from_env() -> Result<Self, ControlError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControlError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let listen_addr = match lookup("LISTEN_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ControlError::Config(format!("LISTEN_ADDR {raw:?}: {e}")))?,
            None => defaults.listen_addr,
        };

        let backend = match lookup("HARDWARE_BACKEND") {
            Some(raw) => raw.trim().parse()?,
            None => defaults.backend,
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) if raw.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let pin_defaults = PinConfig::default();
        let pins = PinConfig {
            motor_in1: parse_var(&lookup, "MOTOR_IN1_PIN", pin_defaults.motor_in1),
            motor_in2: parse_var(&lookup, "MOTOR_IN2_PIN", pin_defaults.motor_in2),
            seed_sensor: parse_var(&lookup, "SEED_SENSOR_PIN", pin_defaults.seed_sensor),
            pwm_chip: parse_var(&lookup, "PWM_CHIP", pin_defaults.pwm_chip),
            pwm_channel: parse_var(&lookup, "PWM_CHANNEL", pin_defaults.pwm_channel),
            pwm_frequency_hz: parse_var(
                &lookup,
                "PWM_FREQUENCY_HZ",
                pin_defaults.pwm_frequency_hz,
            )
            .max(1),
        };

        let poll_ms = parse_var(&lookup, "SEED_POLL_INTERVAL_MS", 500_u64).max(1);
        let backoff_ms = parse_var(&lookup, "SEED_ERROR_BACKOFF_MS", 1000_u64).max(1);
        let initial_duty_cycle =
            parse_var(&lookup, "INITIAL_DUTY_CYCLE", defaults.initial_duty_cycle).min(100);

        Ok(Self {
            listen_addr,
            poll_interval: Duration::from_millis(poll_ms),
            error_backoff: Duration::from_millis(backoff_ms),
            backend,
            pins,
            initial_duty_cycle,
            log_format,
        })
    }
}

/// Parses a variable as `T`, returning `default` on missing or invalid
/// values.
fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
