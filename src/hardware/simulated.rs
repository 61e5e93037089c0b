//! In-memory hardware backend.
//!
//! [`SimulatedMotor`] and [`SimulatedSensor`] keep their state behind an
//! `Arc`, and hand out probes ([`MotorProbe`], [`SensorProbe`]) so a test
//! or a development harness can inspect outputs and script sensor readings
//! while the service owns the device.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::Direction;
use crate::error::HardwareError;

use super::{Actuator, SeedSensor, check_duty};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Observable outputs of the simulated motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorOutputs {
    /// Direction currently applied.
    pub direction: Direction,
    /// Duty cycle currently applied, in percent.
    pub duty_cycle: u8,
    /// Number of completed `shutdown` calls.
    pub shutdowns: usize,
}

#[derive(Debug)]
struct MotorInner {
    outputs: MotorOutputs,
    fail_next: Option<String>,
}

/// Motor driver that records its outputs in memory.
#[derive(Debug)]
pub struct SimulatedMotor {
    inner: Arc<Mutex<MotorInner>>,
}

impl SimulatedMotor {
    /// Creates a stopped motor at 0 % duty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MotorInner {
                outputs: MotorOutputs {
                    direction: Direction::Stopped,
                    duty_cycle: 0,
                    shutdowns: 0,
                },
                fail_next: None,
            })),
        }
    }

    /// Returns a probe sharing this motor's state.
    #[must_use]
    pub fn probe(&self) -> MotorProbe {
        MotorProbe {
            inner: Arc::clone(&self.inner),
        }
    }

    fn apply<F>(&self, op: F) -> Result<(), HardwareError>
    where
        F: FnOnce(&mut MotorOutputs),
    {
        let mut inner = lock(&self.inner);
        if let Some(reason) = inner.fail_next.take() {
            return Err(HardwareError::Simulated(reason));
        }
        op(&mut inner.outputs);
        Ok(())
    }
}

impl Default for SimulatedMotor {
    fn default() -> Self {
        Self::new()
    }
}

impl Actuator for SimulatedMotor {
    fn set_direction(&mut self, direction: Direction) -> Result<(), HardwareError> {
        self.apply(|out| out.direction = direction)?;
        tracing::debug!(%direction, "sim motor direction");
        Ok(())
    }

    fn set_duty_cycle(&mut self, percent: u8) -> Result<(), HardwareError> {
        let percent = check_duty(percent)?;
        self.apply(|out| out.duty_cycle = percent)?;
        tracing::debug!(duty = percent, "sim motor duty");
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), HardwareError> {
        self.apply(|out| {
            out.direction = Direction::Stopped;
            out.duty_cycle = 0;
            out.shutdowns += 1;
        })?;
        tracing::debug!("sim motor released");
        Ok(())
    }
}

/// Test handle onto a [`SimulatedMotor`].
#[derive(Debug, Clone)]
pub struct MotorProbe {
    inner: Arc<Mutex<MotorInner>>,
}

impl MotorProbe {
    /// Snapshot of the current outputs.
    #[must_use]
    pub fn outputs(&self) -> MotorOutputs {
        lock(&self.inner).outputs
    }

    /// Makes the next actuator call fail with the given reason.
    pub fn fail_next(&self, reason: &str) {
        lock(&self.inner).fail_next = Some(reason.to_string());
    }
}

#[derive(Debug)]
enum Scripted {
    Level(bool),
    Fault(String),
}

#[derive(Debug)]
struct SensorInner {
    level: bool,
    script: VecDeque<Scripted>,
    reads: usize,
}

/// Seed sensor whose level is set from a [`SensorProbe`].
///
/// Scripted readings are consumed first, one per read; afterwards the
/// steady level is returned.
#[derive(Debug)]
pub struct SimulatedSensor {
    inner: Arc<Mutex<SensorInner>>,
}

impl SimulatedSensor {
    /// Creates a sensor reading low (seeds present).
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SensorInner {
                level: false,
                script: VecDeque::new(),
                reads: 0,
            })),
        }
    }

    /// Returns a probe sharing this sensor's state.
    #[must_use]
    pub fn probe(&self) -> SensorProbe {
        SensorProbe {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SeedSensor for SimulatedSensor {
    fn read_level(&mut self) -> Result<bool, HardwareError> {
        let mut inner = lock(&self.inner);
        inner.reads += 1;
        match inner.script.pop_front() {
            Some(Scripted::Level(level)) => Ok(level),
            Some(Scripted::Fault(reason)) => Err(HardwareError::Simulated(reason)),
            None => Ok(inner.level),
        }
    }
}

/// Test handle onto a [`SimulatedSensor`].
#[derive(Debug, Clone)]
pub struct SensorProbe {
    inner: Arc<Mutex<SensorInner>>,
}

impl SensorProbe {
    /// Sets the steady level returned once the script is exhausted.
    pub fn set_level(&self, level: bool) {
        lock(&self.inner).level = level;
    }

    /// Queues readings to be returned in order.
    pub fn push_levels(&self, levels: &[bool]) {
        let mut inner = lock(&self.inner);
        inner
            .script
            .extend(levels.iter().copied().map(Scripted::Level));
    }

    /// Queues a failing read.
    pub fn push_fault(&self, reason: &str) {
        lock(&self.inner)
            .script
            .push_back(Scripted::Fault(reason.to_string()));
    }

    /// Number of reads performed so far.
    #[must_use]
    pub fn reads(&self) -> usize {
        lock(&self.inner).reads
    }
}
