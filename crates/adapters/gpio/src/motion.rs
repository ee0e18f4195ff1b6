//! PIR motion input over sysfs GPIO.

use thermotrack_app::ports::MotionSensor;

use crate::config::{GpioConfig, PinMap};
use crate::error::HardwareError;
use crate::sysfs::{Direction, SysfsPin};

#[derive(Debug)]
pub struct SysfsMotionSensor {
    pin: SysfsPin,
}

impl SysfsMotionSensor {
    /// Export and configure the PIR pin as an input.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError`] when the pin cannot be configured.
    pub fn open(config: &GpioConfig, pins: &PinMap) -> Result<Self, HardwareError> {
        let pin = SysfsPin::open(&config.gpio_root, config.line(pins.pir)?, Direction::In)?;
        tracing::info!(line = pin.line(), "PIR input ready");
        Ok(Self { pin })
    }
}

impl MotionSensor for SysfsMotionSensor {
    fn read_motion(&self) -> bool {
        // An unreadable input counts as "no motion".
        self.pin.read().unwrap_or_else(|err| {
            tracing::warn!(line = self.pin.line(), error = %err, "failed to read PIR");
            false
        })
    }
}

impl Drop for SysfsMotionSensor {
    fn drop(&mut self) {
        if let Err(err) = self.pin.release() {
            tracing::warn!(line = self.pin.line(), error = %err, "failed to release PIR pin");
        }
    }
}
