//! Command processor: maps protocol commands onto the actuator.
//!
//! [`MotorController`] owns the single [`Actuator`] together with the
//! [`MotorState`] it last applied. Both sit behind one mutex, which is
//! the serialization point for every session that drives the motor.
//! Every command follows the same pattern: acquire lock → check
//! preconditions → call the actuator → record what succeeded → reply.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::{
    Command, Direction, FULL_DUTY, Heading, MotorState, Reply, SeedLevel, SpeedTier,
};
use crate::error::HardwareError;
use crate::hardware::Actuator;

#[derive(Debug)]
struct Drive {
    actuator: Box<dyn Actuator>,
    state: MotorState,
    retired: bool,
}

impl Drive {
    fn set_direction(&mut self, direction: Direction) -> Result<(), HardwareError> {
        self.actuator.set_direction(direction)?;
        self.state.direction = direction;
        Ok(())
    }

    fn set_duty(&mut self, percent: u8) -> Result<(), HardwareError> {
        self.actuator.set_duty_cycle(percent)?;
        self.state.duty_cycle = percent;
        Ok(())
    }

    fn release(&mut self) -> Result<(), HardwareError> {
        self.actuator.shutdown()?;
        self.state.direction = Direction::Stopped;
        self.state.duty_cycle = 0;
        Ok(())
    }
}

/// Serializes all motor access and enforces the empty-hopper interlock.
#[derive(Debug)]
pub struct MotorController {
    drive: Mutex<Drive>,
    seed_level: Arc<SeedLevel>,
}

impl MotorController {
    /// Takes ownership of the actuator, stops it and applies the initial
    /// duty cycle.
    ///
    /// # Errors
    ///
    /// Returns a [`HardwareError`] if the initial outputs cannot be applied.
    pub fn new(
        actuator: Box<dyn Actuator>,
        seed_level: Arc<SeedLevel>,
        initial_duty: u8,
    ) -> Result<Self, HardwareError> {
        let mut drive = Drive {
            actuator,
            state: MotorState::new(0),
            retired: false,
        };
        drive.set_direction(Direction::Stopped)?;
        drive.set_duty(initial_duty)?;
        Ok(Self {
            drive: Mutex::new(drive),
            seed_level,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Drive> {
        self.drive.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the last successfully applied motor state.
    #[must_use]
    pub fn state(&self) -> MotorState {
        self.lock().state
    }

    /// Executes one command and returns the reply for the client.
    ///
    /// An actuator failure yields [`Reply::Error`]; the motor state keeps
    /// whatever part of the command had already been applied. After
    /// [`MotorController::shutdown`] every command yields [`Reply::Error`].
    ///
    /// Synchronous: the actuator calls run inline on the caller's thread
    /// (see [`Actuator`]).
    pub fn execute(&self, command: Command) -> Reply {
        let mut drive = self.lock();
        if drive.retired {
            tracing::warn!(%command, "command rejected: motor shut down");
            return Reply::Error;
        }

        match self.apply(&mut drive, command) {
            Ok(reply) => reply,
            Err(e) if command == Command::Exit => {
                tracing::error!(error = %e, "failed to release motor");
                Reply::Exit
            }
            Err(e) => {
                tracing::error!(%command, error = %e, "actuator call failed");
                Reply::Error
            }
        }
    }

    fn apply(&self, drive: &mut Drive, command: Command) -> Result<Reply, HardwareError> {
        match command {
            Command::Start => {
                if self.seed_level.is_empty() {
                    tracing::warn!("cannot start: no seeds in hopper");
                    return Ok(Reply::NoSeeds);
                }
                let heading = drive.state.heading;
                drive.set_duty(FULL_DUTY)?;
                drive.set_direction(heading.into())?;
                tracing::info!(direction = %drive.state.direction, "motor running");
            }
            Command::Stop => {
                drive.set_direction(Direction::Stopped)?;
                tracing::info!("motor stopped");
            }
            Command::Forward => Self::steer(drive, Heading::Forward)?,
            Command::Backward => Self::steer(drive, Heading::Backward)?,
            Command::Low => Self::speed(drive, SpeedTier::Low)?,
            Command::Medium => Self::speed(drive, SpeedTier::Medium)?,
            Command::High => Self::speed(drive, SpeedTier::High)?,
            Command::Exit => {
                drive.release()?;
                tracing::info!("motor released");
                return Ok(Reply::Exit);
            }
        }
        Ok(Reply::Ok)
    }

    fn steer(drive: &mut Drive, heading: Heading) -> Result<(), HardwareError> {
        drive.set_direction(heading.into())?;
        drive.state.heading = heading;
        tracing::info!(direction = %drive.state.direction, "direction set");
        Ok(())
    }

    fn speed(drive: &mut Drive, tier: SpeedTier) -> Result<(), HardwareError> {
        drive.set_duty(tier.duty_cycle())?;
        tracing::info!(duty = drive.state.duty_cycle, ?tier, "speed set");
        Ok(())
    }

    /// Releases the actuator for process shutdown.
    ///
    /// Runs at most once; returns `true` for the call that performed the
    /// cleanup.
    pub fn shutdown(&self) -> bool {
        let mut drive = self.lock();
        if drive.retired {
            return false;
        }
        drive.retired = true;
        if let Err(e) = drive.release() {
            tracing::error!(error = %e, "actuator cleanup failed");
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::hardware::{MotorProbe, SimulatedMotor};

    fn make_controller() -> (MotorController, MotorProbe, Arc<SeedLevel>) {
        let motor = SimulatedMotor::new();
        let probe = motor.probe();
        let level = Arc::new(SeedLevel::new());
        let Ok(controller) = MotorController::new(Box::new(motor), Arc::clone(&level), 12) else {
            panic!("controller init");
        };
        (controller, probe, level)
    }

    #[test]
    fn initial_state_is_stopped_at_initial_duty() {
        let (controller, probe, _) = make_controller();
        let state = controller.state();
        assert_eq!(state.direction, Direction::Stopped);
        assert_eq!(state.duty_cycle, 12);
        assert_eq!(probe.outputs().duty_cycle, 12);
    }

    #[test]
    fn forward_then_start_runs_forward_at_full_duty() {
        let (controller, probe, _) = make_controller();
        assert_eq!(controller.execute(Command::Forward), Reply::Ok);
        assert_eq!(controller.execute(Command::Start), Reply::Ok);
        let out = probe.outputs();
        assert_eq!(out.direction, Direction::Forward);
        assert_eq!(out.duty_cycle, 100);
    }

    #[test]
    fn backward_then_start_runs_backward_at_full_duty() {
        let (controller, probe, _) = make_controller();
        assert_eq!(controller.execute(Command::Backward), Reply::Ok);
        assert_eq!(controller.execute(Command::Start), Reply::Ok);
        let out = probe.outputs();
        assert_eq!(out.direction, Direction::Backward);
        assert_eq!(out.duty_cycle, 100);
        assert_eq!(controller.state().heading, Heading::Backward);
    }

    #[test]
    fn start_ignores_configured_speed_tier() {
        let (controller, _, _) = make_controller();
        let _ = controller.execute(Command::Low);
        let _ = controller.execute(Command::Start);
        assert_eq!(controller.state().duty_cycle, 100);
    }

    #[test]
    fn start_while_empty_is_refused() {
        let (controller, probe, level) = make_controller();
        let _ = level.record(true);
        let before = probe.outputs();
        assert_eq!(controller.execute(Command::Start), Reply::NoSeeds);
        assert_eq!(probe.outputs(), before);
        assert!(!controller.state().is_driven());
    }

    #[test]
    fn stop_keeps_duty_and_heading() {
        let (controller, probe, _) = make_controller();
        let _ = controller.execute(Command::Backward);
        let _ = controller.execute(Command::Start);
        assert_eq!(controller.execute(Command::Stop), Reply::Ok);
        let state = controller.state();
        assert_eq!(state.direction, Direction::Stopped);
        assert_eq!(state.heading, Heading::Backward);
        assert_eq!(state.duty_cycle, 100);
        assert_eq!(probe.outputs().direction, Direction::Stopped);

        // START after STOP resumes the stored heading.
        let _ = controller.execute(Command::Start);
        assert_eq!(probe.outputs().direction, Direction::Backward);
    }

    #[test]
    fn speed_tiers_set_exact_duty_and_are_idempotent() {
        let (controller, probe, _) = make_controller();
        for (cmd, duty) in [
            (Command::Low, 20),
            (Command::Medium, 50),
            (Command::High, 75),
        ] {
            assert_eq!(controller.execute(cmd), Reply::Ok);
            let first = controller.state();
            assert_eq!(controller.execute(cmd), Reply::Ok);
            assert_eq!(controller.state(), first);
            assert_eq!(first.duty_cycle, duty);
            assert_eq!(probe.outputs().duty_cycle, duty);
        }
    }

    #[test]
    fn speed_change_keeps_direction() {
        let (controller, _, _) = make_controller();
        let _ = controller.execute(Command::Start);
        let _ = controller.execute(Command::Medium);
        let state = controller.state();
        assert_eq!(state.direction, Direction::Forward);
        assert_eq!(state.duty_cycle, 50);
    }

    #[test]
    fn exit_releases_actuator() {
        let (controller, probe, _) = make_controller();
        let _ = controller.execute(Command::Start);
        assert_eq!(controller.execute(Command::Exit), Reply::Exit);
        let out = probe.outputs();
        assert_eq!(out.shutdowns, 1);
        assert_eq!(out.direction, Direction::Stopped);
        assert_eq!(controller.state().direction, Direction::Stopped);

        // The controller keeps serving later sessions.
        assert_eq!(controller.execute(Command::Forward), Reply::Ok);
    }

    #[test]
    fn actuator_failure_yields_error_and_keeps_state() {
        let (controller, probe, _) = make_controller();
        let before = controller.state();
        probe.fail_next("driver fault");
        assert_eq!(controller.execute(Command::High), Reply::Error);
        assert_eq!(controller.state(), before);
    }

    #[test]
    fn shutdown_runs_once_and_rejects_later_commands() {
        let (controller, probe, _) = make_controller();
        assert!(controller.shutdown());
        assert!(!controller.shutdown());
        assert_eq!(probe.outputs().shutdowns, 1);
        assert_eq!(controller.execute(Command::Start), Reply::Error);
        assert_eq!(probe.outputs().direction, Direction::Stopped);
    }
}
