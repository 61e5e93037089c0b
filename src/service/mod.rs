//! Service layer: command processing and sensor monitoring.
//!
//! [`MotorController`] turns protocol commands into actuator calls;
//! [`SensorMonitor`] feeds the shared seed level and pushes transitions
//! through the [`crate::net::ConnectionManager`].

pub mod motor_controller;
pub mod sensor_monitor;

pub use motor_controller::MotorController;
pub use sensor_monitor::SensorMonitor;
