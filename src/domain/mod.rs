//! Domain layer: command vocabulary, motor state and seed level.
//!
//! These types carry no I/O. The service layer mutates them and the
//! network layer renders them onto the wire.

pub mod command;
pub mod motor_state;
pub mod seed_level;

pub use command::{Command, Reply, UnknownCommand};
pub use motor_state::{Direction, FULL_DUTY, Heading, MotorState, SpeedTier};
pub use seed_level::{SeedLevel, SeedStatus};
