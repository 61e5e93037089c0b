//! Motor direction, speed tiers and the controller's view of the motor.

use std::fmt;

/// Output applied to the H-bridge direction pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// IN1 high, IN2 low.
    Forward,
    /// IN1 low, IN2 high.
    Backward,
    /// Both pins low.
    Stopped,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Stopped => "stopped",
        })
    }
}

/// Direction selected by the last FORWARD/BACKWARD command.
///
/// START re-applies the heading, so it survives a STOP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heading {
    /// Forward rotation.
    Forward,
    /// Backward rotation.
    Backward,
}

impl From<Heading> for Direction {
    fn from(heading: Heading) -> Self {
        match heading {
            Heading::Forward => Self::Forward,
            Heading::Backward => Self::Backward,
        }
    }
}

/// Named duty-cycle presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeedTier {
    /// 20 %.
    Low,
    /// 50 %.
    Medium,
    /// 75 %.
    High,
}

impl SpeedTier {
    /// Duty cycle of this tier in percent.
    #[must_use]
    pub const fn duty_cycle(self) -> u8 {
        match self {
            Self::Low => 20,
            Self::Medium => 50,
            Self::High => 75,
        }
    }
}

/// Duty cycle START drives the motor at, regardless of the speed tier.
pub const FULL_DUTY: u8 = 100;

/// Last successfully applied actuator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorState {
    /// Output currently on the direction pins.
    pub direction: Direction,
    /// Direction START will apply.
    pub heading: Heading,
    /// PWM duty cycle in percent (0–100).
    pub duty_cycle: u8,
}

impl MotorState {
    /// Stopped motor heading forward at the given duty.
    #[must_use]
    pub const fn new(duty_cycle: u8) -> Self {
        Self {
            direction: Direction::Stopped,
            heading: Heading::Forward,
            duty_cycle,
        }
    }

    /// Returns `true` when a direction output is energised.
    #[must_use]
    pub fn is_driven(&self) -> bool {
        self.direction != Direction::Stopped
    }
}
