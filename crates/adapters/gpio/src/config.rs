//! Hardware adapter configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::HardwareError;

/// Where the kernel interfaces live and how long a sensor read may take.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GpioConfig {
    /// Root of the sysfs GPIO interface.
    pub gpio_root: PathBuf,
    /// Added to every BCM pin number (512 on kernels that number the header
    /// chip after the SoC's internal lines).
    pub gpio_base: u32,
    /// IIO device directory of the DHT22.
    pub iio_device: PathBuf,
    /// Upper bound on one climate read, in milliseconds.
    pub read_timeout_ms: u64,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            gpio_root: PathBuf::from("/sys/class/gpio"),
            gpio_base: 0,
            iio_device: PathBuf::from("/sys/bus/iio/devices/iio:device0"),
            read_timeout_ms: 2_000,
        }
    }
}

impl GpioConfig {
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Kernel line number for a BCM pin.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InvalidLine`] when the sum overflows.
    pub fn line(&self, bcm_pin: u32) -> Result<u32, HardwareError> {
        self.gpio_base
            .checked_add(bcm_pin)
            .ok_or(HardwareError::InvalidLine {
                base: self.gpio_base,
                pin: bcm_pin,
            })
    }
}

/// BCM pin numbers of the attached devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PinMap {
    pub pir: u32,
    pub fan: u32,
    pub buzzer: u32,
    pub led: u32,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            pir: 6,
            fan: 17,
            buzzer: 27,
            led: 22,
        }
    }
}
