//! # thermotrack-adapter-gpio
//!
//! Hardware adapter for a Raspberry Pi style board.
//!
//! ## How it works
//!
//! Outputs (fan relay, buzzer, LED) and the PIR input are driven through the
//! Linux sysfs GPIO interface: a pin is exported by writing its number to
//! `<gpio_root>/export`, configured through `gpioN/direction` and then read
//! or written through `gpioN/value`. The DHT22 is read through the kernel
//! IIO driver, which exposes milli-unit values as plain files.
//!
//! | Device | Interface | Files |
//! |--------|-----------|-------|
//! | Fan, buzzer, LED | sysfs GPIO, `direction = low` | `gpioN/value` |
//! | PIR | sysfs GPIO, `direction = in` | `gpioN/value` |
//! | DHT22 | IIO `dht11` driver | `in_temp_input`, `in_humidityrelative_input` |
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `thermotrack-app` and
//! `thermotrack-domain`.

mod actuators;
mod climate;
mod config;
mod error;
mod motion;
mod sysfs;

pub use actuators::SysfsActuators;
pub use climate::IioClimateSensor;
pub use config::{GpioConfig, PinMap};
pub use error::HardwareError;
pub use motion::SysfsMotionSensor;

#[cfg(test)]
pub(crate) mod scratch {
    use std::path::{Path, PathBuf};

    use tempfile::TempDir;

    /// Throwaway directory standing in for `/sys/class/gpio` or an IIO device.
    pub struct ScratchDir(TempDir);

    impl ScratchDir {
        pub fn new(prefix: &str) -> Self {
            Self(tempfile::Builder::new().prefix(prefix).tempdir().unwrap())
        }

        pub fn path(&self) -> &Path {
            self.0.path()
        }

        /// Pre-create `gpioN` as if the pin had been exported by someone else.
        pub fn add_pin(&self, number: u32) -> PathBuf {
            let dir = self.path().join(format!("gpio{number}"));
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("value"), "0\n").unwrap();
            std::fs::write(dir.join("direction"), "in\n").unwrap();
            dir
        }

        pub fn read(&self, relative: impl AsRef<Path>) -> String {
            std::fs::read_to_string(self.path().join(relative)).unwrap()
        }
    }
}
