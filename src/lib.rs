//! # seeder-control
//!
//! Network-controlled motor driver for a seed dispenser running on a
//! single-board computer.
//!
//! A mobile client connects over TCP and sends newline-terminated
//! commands (`START`, `STOP`, `FORWARD`, `BACKWARD`, `LOW`, `MEDIUM`,
//! `HIGH`, `EXIT`). The server replies `OK`, `ERROR` or
//! `ERROR:NO_SEEDS`, and pushes `SEED_STATUS:EMPTY` /
//! `SEED_STATUS:NORMAL` whenever the hopper sensor changes level.
//!
//! ## Architecture
//!
//! ```text
//! Mobile client (TCP, line protocol)
//!     │
//!     ├── Listener ── Session (net/)
//!     │                  │
//!     │                  ├── MotorController (service/) ── Actuator
//!     │                  │
//!     ├── ConnectionManager (net/) ◀── SensorMonitor (service/) ── SeedSensor
//!     │
//!     └── SeedLevel / MotorState (domain/)
//! ```

pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod hardware;
pub mod logging;
pub mod net;
pub mod service;
