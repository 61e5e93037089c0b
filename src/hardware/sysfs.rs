//! Linux sysfs backend for single-board computers.
//!
//! Direction pins and the seed sensor are driven through the legacy
//! `/sys/class/gpio` interface; the motor enable line is a hardware PWM
//! channel under `/sys/class/pwm`. The sensor input relies on an external
//! pull-down since sysfs cannot configure pull resistors.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PinConfig;
use crate::domain::Direction;
use crate::error::HardwareError;

use super::{Actuator, SeedSensor, check_duty};

/// Default sysfs GPIO class directory.
pub const GPIO_ROOT: &str = "/sys/class/gpio";

/// Default sysfs PWM class directory.
pub const PWM_ROOT: &str = "/sys/class/pwm";

fn write_attr(path: &Path, value: &str) -> Result<(), HardwareError> {
    fs::write(path, value).map_err(|source| HardwareError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_attr(path: &Path) -> Result<String, HardwareError> {
    fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|source| HardwareError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// One exported GPIO line.
#[derive(Debug)]
struct GpioPin {
    root: PathBuf,
    number: u32,
}

impl GpioPin {
    fn new(root: &Path, number: u32) -> Self {
        Self {
            root: root.to_path_buf(),
            number,
        }
    }

    fn dir(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.number))
    }

    /// Exports the pin (if needed) and sets its direction: `"in"`, or
    /// `"low"` for an output that starts low.
    fn export(&self, direction: &str) -> Result<(), HardwareError> {
        if !self.dir().exists() {
            write_attr(&self.root.join("export"), &self.number.to_string())?;
        }
        write_attr(&self.dir().join("direction"), direction)
    }

    fn unexport(&self) -> Result<(), HardwareError> {
        if self.dir().exists() {
            write_attr(&self.root.join("unexport"), &self.number.to_string())?;
        }
        Ok(())
    }

    fn write(&self, high: bool) -> Result<(), HardwareError> {
        write_attr(&self.dir().join("value"), if high { "1" } else { "0" })
    }

    fn read(&self) -> Result<bool, HardwareError> {
        let path = self.dir().join("value");
        match read_attr(&path)?.as_str() {
            "1" => Ok(true),
            "0" => Ok(false),
            other => Err(HardwareError::UnexpectedValue {
                path,
                value: other.to_string(),
            }),
        }
    }
}

/// One hardware PWM channel.
#[derive(Debug)]
struct PwmChannel {
    chip: PathBuf,
    channel: u32,
    period_ns: u64,
}

impl PwmChannel {
    fn new(root: &Path, chip: u32, channel: u32, frequency_hz: u32) -> Self {
        Self {
            chip: root.join(format!("pwmchip{chip}")),
            channel,
            period_ns: 1_000_000_000 / u64::from(frequency_hz.max(1)),
        }
    }

    fn dir(&self) -> PathBuf {
        self.chip.join(format!("pwm{}", self.channel))
    }

    fn export(&self) -> Result<(), HardwareError> {
        if !self.dir().exists() {
            write_attr(&self.chip.join("export"), &self.channel.to_string())?;
        }
        // Duty must never exceed the period, so clear it first.
        write_attr(&self.dir().join("duty_cycle"), "0")?;
        write_attr(&self.dir().join("period"), &self.period_ns.to_string())?;
        write_attr(&self.dir().join("enable"), "1")
    }

    fn set_percent(&self, percent: u8) -> Result<(), HardwareError> {
        let duty_ns = self.period_ns * u64::from(percent) / 100;
        write_attr(&self.dir().join("duty_cycle"), &duty_ns.to_string())
    }

    fn unexport(&self) -> Result<(), HardwareError> {
        if self.dir().exists() {
            write_attr(&self.dir().join("enable"), "0")?;
            write_attr(&self.chip.join("unexport"), &self.channel.to_string())?;
        }
        Ok(())
    }
}

/// L298N-style motor driver on two GPIO direction pins and one PWM line.
#[derive(Debug)]
pub struct SysfsMotor {
    in1: GpioPin,
    in2: GpioPin,
    pwm: PwmChannel,
    duty: u8,
    released: bool,
}

impl SysfsMotor {
    /// Opens the motor under the standard sysfs roots.
    ///
    /// # Errors
    ///
    /// Returns a [`HardwareError`] if a pin or the PWM channel cannot be
    /// exported and configured.
    pub fn open(pins: &PinConfig) -> Result<Self, HardwareError> {
        Self::open_at(Path::new(GPIO_ROOT), Path::new(PWM_ROOT), pins)
    }

    /// Opens the motor under explicit sysfs roots.
    ///
    /// # Errors
    ///
    /// Same as [`SysfsMotor::open`].
    pub fn open_at(
        gpio_root: &Path,
        pwm_root: &Path,
        pins: &PinConfig,
    ) -> Result<Self, HardwareError> {
        let mut motor = Self {
            in1: GpioPin::new(gpio_root, pins.motor_in1),
            in2: GpioPin::new(gpio_root, pins.motor_in2),
            pwm: PwmChannel::new(
                pwm_root,
                pins.pwm_chip,
                pins.pwm_channel,
                pins.pwm_frequency_hz,
            ),
            duty: 0,
            released: true,
        };
        motor.acquire()?;
        tracing::info!(
            in1 = pins.motor_in1,
            in2 = pins.motor_in2,
            pwm_chip = pins.pwm_chip,
            pwm_channel = pins.pwm_channel,
            "sysfs motor ready"
        );
        Ok(motor)
    }

    fn acquire(&mut self) -> Result<(), HardwareError> {
        if self.released {
            self.in1.export("low")?;
            self.in2.export("low")?;
            self.pwm.export()?;
            self.pwm.set_percent(self.duty)?;
            self.released = false;
        }
        Ok(())
    }
}

impl Actuator for SysfsMotor {
    fn set_direction(&mut self, direction: Direction) -> Result<(), HardwareError> {
        self.acquire()?;
        // Lower the opposite input first so both are never high together.
        match direction {
            Direction::Forward => {
                self.in2.write(false)?;
                self.in1.write(true)
            }
            Direction::Backward => {
                self.in1.write(false)?;
                self.in2.write(true)
            }
            Direction::Stopped => {
                self.in1.write(false)?;
                self.in2.write(false)
            }
        }
    }

    fn set_duty_cycle(&mut self, percent: u8) -> Result<(), HardwareError> {
        let percent = check_duty(percent)?;
        self.acquire()?;
        self.pwm.set_percent(percent)?;
        self.duty = percent;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), HardwareError> {
        if self.released {
            return Ok(());
        }
        // Attempt every step, report the first failure.
        let results = [
            self.in1.write(false),
            self.in2.write(false),
            self.pwm.unexport(),
            self.in1.unexport(),
            self.in2.unexport(),
        ];
        self.released = true;
        self.duty = 0;
        results.into_iter().find_map(Result::err).map_or(Ok(()), Err)
    }
}

/// Seed sensor on one GPIO input.
#[derive(Debug)]
pub struct SysfsSensor {
    pin: GpioPin,
}

impl SysfsSensor {
    /// Exports the sensor pin under the standard sysfs root.
    ///
    /// # Errors
    ///
    /// Returns a [`HardwareError`] if the pin cannot be exported.
    pub fn open(pin: u32) -> Result<Self, HardwareError> {
        Self::open_at(Path::new(GPIO_ROOT), pin)
    }

    /// Exports the sensor pin under an explicit sysfs root.
    ///
    /// # Errors
    ///
    /// Same as [`SysfsSensor::open`].
    pub fn open_at(gpio_root: &Path, pin: u32) -> Result<Self, HardwareError> {
        let pin = GpioPin::new(gpio_root, pin);
        pin.export("in")?;
        Ok(Self { pin })
    }
}

impl SeedSensor for SysfsSensor {
    fn read_level(&mut self) -> Result<bool, HardwareError> {
        self.pin.read()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    struct FakeSysfs {
        _dir: tempfile::TempDir,
        gpio: PathBuf,
        pwm: PathBuf,
    }

    /// Lays out pre-exported pin directories, as the kernel would after
    /// an `export` write.
    fn fake_sysfs(pins: &PinConfig) -> FakeSysfs {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let gpio = dir.path().join("gpio");
        let pwm = dir.path().join("pwm");
        for n in [pins.motor_in1, pins.motor_in2, pins.seed_sensor] {
            if fs::create_dir_all(gpio.join(format!("gpio{n}"))).is_err() {
                panic!("create gpio dir");
            }
        }
        let channel = pwm
            .join(format!("pwmchip{}", pins.pwm_chip))
            .join(format!("pwm{}", pins.pwm_channel));
        if fs::create_dir_all(channel).is_err() {
            panic!("create pwm dir");
        }
        FakeSysfs {
            _dir: dir,
            gpio,
            pwm,
        }
    }

    fn read(path: PathBuf) -> String {
        fs::read_to_string(path).unwrap_or_default()
    }

    #[test]
    fn open_configures_outputs_and_pwm() {
        let pins = PinConfig::default();
        let fake = fake_sysfs(&pins);
        let Ok(_motor) = SysfsMotor::open_at(&fake.gpio, &fake.pwm, &pins) else {
            panic!("open motor");
        };
        assert_eq!(read(fake.gpio.join("gpio24/direction")), "low");
        assert_eq!(read(fake.gpio.join("gpio23/direction")), "low");
        assert_eq!(read(fake.pwm.join("pwmchip0/pwm0/period")), "1000000");
        assert_eq!(read(fake.pwm.join("pwmchip0/pwm0/enable")), "1");
    }

    #[test]
    fn direction_and_duty_reach_attributes() {
        let pins = PinConfig::default();
        let fake = fake_sysfs(&pins);
        let Ok(mut motor) = SysfsMotor::open_at(&fake.gpio, &fake.pwm, &pins) else {
            panic!("open motor");
        };

        assert!(motor.set_direction(Direction::Backward).is_ok());
        assert_eq!(read(fake.gpio.join("gpio24/value")), "0");
        assert_eq!(read(fake.gpio.join("gpio23/value")), "1");

        assert!(motor.set_duty_cycle(50).is_ok());
        assert_eq!(read(fake.pwm.join("pwmchip0/pwm0/duty_cycle")), "500000");
    }

    #[test]
    fn shutdown_lowers_pins_and_disables_pwm() {
        let pins = PinConfig::default();
        let fake = fake_sysfs(&pins);
        let Ok(mut motor) = SysfsMotor::open_at(&fake.gpio, &fake.pwm, &pins) else {
            panic!("open motor");
        };
        let _ = motor.set_direction(Direction::Forward);
        assert!(motor.shutdown().is_ok());
        assert_eq!(read(fake.gpio.join("gpio24/value")), "0");
        assert_eq!(read(fake.pwm.join("pwmchip0/pwm0/enable")), "0");
        assert_eq!(read(fake.gpio.join("unexport")), "23");
    }

    #[test]
    fn sensor_reads_value_attribute() {
        let pins = PinConfig::default();
        let fake = fake_sysfs(&pins);
        let Ok(mut sensor) = SysfsSensor::open_at(&fake.gpio, pins.seed_sensor) else {
            panic!("open sensor");
        };
        assert_eq!(read(fake.gpio.join("gpio17/direction")), "in");

        let _ = fs::write(fake.gpio.join("gpio17/value"), "1\n");
        assert!(matches!(sensor.read_level(), Ok(true)));

        let _ = fs::write(fake.gpio.join("gpio17/value"), "x\n");
        assert!(matches!(
            sensor.read_level(),
            Err(HardwareError::UnexpectedValue { .. })
        ));
    }

    #[test]
    fn missing_pin_is_an_io_error() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let result = SysfsSensor::open_at(&dir.path().join("absent"), 17);
        assert!(matches!(result, Err(HardwareError::Io { .. })));
    }
}
