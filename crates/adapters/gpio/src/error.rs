//! Hardware adapter error types.

use std::path::PathBuf;
use std::time::Duration;

use thermotrack_domain::error::ThermoTrackError;

/// Errors specific to the hardware adapter.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The kernel interface directory does not exist.
    #[error("hardware interface not found at {}", .0.display())]
    NotAvailable(PathBuf),

    /// Reading or writing a sysfs file failed.
    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sysfs file held something unexpected.
    #[error("unexpected content {value:?} in {}", path.display())]
    Parse { path: PathBuf, value: String },

    /// The sensor answered with a physically impossible value.
    #[error("{quantity} reading {value} is out of range")]
    OutOfRange { quantity: &'static str, value: f64 },

    /// The sensor did not answer in time.
    #[error("sensor read timed out after {0:?}")]
    Timeout(Duration),

    /// The outputs were already released.
    #[error("outputs already released")]
    Released,

    /// `gpio_base + pin` does not fit a kernel line number.
    #[error("pin {pin} with base {base} is not a valid gpio line")]
    InvalidLine { base: u32, pin: u32 },
}

impl HardwareError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<HardwareError> for ThermoTrackError {
    fn from(err: HardwareError) -> Self {
        ThermoTrackError::Hardware(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_missing_interface() {
        let err = HardwareError::NotAvailable(PathBuf::from("/sys/class/gpio"));
        assert_eq!(
            err.to_string(),
            "hardware interface not found at /sys/class/gpio"
        );
    }

    #[test]
    fn should_convert_to_hardware_error() {
        let err: ThermoTrackError = HardwareError::Released.into();
        assert!(matches!(err, ThermoTrackError::Hardware(_)));
    }
}
