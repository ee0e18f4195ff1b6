//! Fan relay, buzzer and LED over sysfs GPIO.

use std::sync::atomic::{AtomicBool, Ordering};

use thermotrack_app::ports::Actuators;
use thermotrack_domain::error::ThermoTrackError;

use crate::config::{GpioConfig, PinMap};
use crate::error::HardwareError;
use crate::sysfs::{Direction, SysfsPin};

/// Outputs driven through sysfs GPIO.
#[derive(Debug)]
pub struct SysfsActuators {
    fan: SysfsPin,
    buzzer: SysfsPin,
    led: SysfsPin,
    released: AtomicBool,
}

impl SysfsActuators {
    /// Export and configure the three output pins, all low.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::NotAvailable`] when the GPIO interface is
    /// missing, or [`HardwareError::Io`] when a pin cannot be configured.
    pub fn open(config: &GpioConfig, pins: &PinMap) -> Result<Self, HardwareError> {
        let fan = open_output(config, pins.fan, &[])?;
        let buzzer = open_output(config, pins.buzzer, &[&fan])?;
        let led = open_output(config, pins.led, &[&fan, &buzzer])?;
        let actuators = Self {
            fan,
            buzzer,
            led,
            released: AtomicBool::new(false),
        };
        tracing::info!(
            fan = actuators.fan.line(),
            buzzer = actuators.buzzer.line(),
            led = actuators.led.line(),
            "gpio outputs ready"
        );
        Ok(actuators)
    }

    fn drive(&self, pin: &SysfsPin, on: bool) -> Result<(), ThermoTrackError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(HardwareError::Released.into());
        }
        pin.write(on)?;
        Ok(())
    }
}

/// Open one output pin; on failure, unexport the pins opened before it.
fn open_output(
    config: &GpioConfig,
    bcm_pin: u32,
    opened: &[&SysfsPin],
) -> Result<SysfsPin, HardwareError> {
    let result = config
        .line(bcm_pin)
        .and_then(|line| SysfsPin::open(&config.gpio_root, line, Direction::OutLow));
    if result.is_err() {
        for pin in opened {
            pin.release_quietly();
        }
    }
    result
}

impl Actuators for SysfsActuators {
    fn set_fan(&self, on: bool) -> Result<(), ThermoTrackError> {
        self.drive(&self.fan, on)
    }

    fn set_buzzer(&self, on: bool) -> Result<(), ThermoTrackError> {
        self.drive(&self.buzzer, on)
    }

    fn set_led(&self, on: bool) -> Result<(), ThermoTrackError> {
        self.drive(&self.led, on)
    }

    fn cleanup(&self) -> Result<(), ThermoTrackError> {
        if self.released.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut first_error = None;
        for pin in [&self.fan, &self.buzzer, &self.led] {
            if let Err(err) = pin.write(false).and_then(|()| pin.release()) {
                tracing::warn!(line = pin.line(), error = %err, "failed to reset output");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::scratch::ScratchDir;

    fn open(scratch: &ScratchDir) -> SysfsActuators {
        for line in [17, 27, 22] {
            scratch.add_pin(line);
        }
        let config = GpioConfig {
            gpio_root: scratch.path().to_path_buf(),
            ..GpioConfig::default()
        };
        SysfsActuators::open(&config, &PinMap::default()).unwrap()
    }

    #[test]
    fn should_configure_outputs_low() {
        let scratch = ScratchDir::new("thermotrack-actuators");
        let _actuators = open(&scratch);

        for line in [17, 27, 22] {
            assert_eq!(scratch.read(format!("gpio{line}/direction")), "low");
        }
    }

    #[test]
    fn should_drive_each_output() {
        let scratch = ScratchDir::new("thermotrack-actuators");
        let actuators = open(&scratch);

        actuators.set_fan(true).unwrap();
        actuators.set_buzzer(true).unwrap();
        actuators.set_led(false).unwrap();

        assert_eq!(scratch.read("gpio17/value"), "1");
        assert_eq!(scratch.read("gpio27/value"), "1");
        assert_eq!(scratch.read("gpio22/value"), "0");
    }

    #[test]
    fn should_switch_everything_off_on_cleanup_once() {
        let scratch = ScratchDir::new("thermotrack-actuators");
        let actuators = open(&scratch);
        actuators.set_fan(true).unwrap();
        actuators.set_led(true).unwrap();

        actuators.cleanup().unwrap();
        actuators.cleanup().unwrap();

        assert_eq!(scratch.read("gpio17/value"), "0");
        assert_eq!(scratch.read("gpio22/value"), "0");
        assert!(matches!(
            actuators.set_fan(true),
            Err(ThermoTrackError::Hardware(_))
        ));
    }

    #[test]
    fn should_unexport_opened_pins_when_a_later_pin_fails() {
        let scratch = ScratchDir::new("thermotrack-actuators");
        let root = scratch.path().to_path_buf();
        // Only the fan line shows up after export; the buzzer line never does.
        let kernel = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            let dir = root.join("gpio17");
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("direction"), "in").unwrap();
        });
        let config = GpioConfig {
            gpio_root: scratch.path().to_path_buf(),
            ..GpioConfig::default()
        };

        let err = SysfsActuators::open(&config, &PinMap::default()).unwrap_err();
        kernel.join().unwrap();

        assert!(matches!(err, HardwareError::Io { .. }));
        assert_eq!(scratch.read("export"), "27");
        assert_eq!(scratch.read("unexport"), "17");
    }

    #[test]
    fn should_reject_overflowing_line() {
        let scratch = ScratchDir::new("thermotrack-actuators");
        let config = GpioConfig {
            gpio_root: scratch.path().to_path_buf(),
            gpio_base: u32::MAX,
            ..GpioConfig::default()
        };

        let err = SysfsActuators::open(&config, &PinMap::default()).unwrap_err();

        assert!(matches!(err, HardwareError::InvalidLine { pin: 17, .. }));
        assert!(!scratch.path().join("export").exists());
    }

    #[test]
    fn should_fail_without_gpio_interface() {
        let config = GpioConfig {
            gpio_root: std::env::temp_dir().join("thermotrack-no-such-gpio"),
            ..GpioConfig::default()
        };
        let err = SysfsActuators::open(&config, &PinMap::default()).unwrap_err();
        assert!(matches!(err, HardwareError::NotAvailable(_)));
    }
}
