//! Minimal sysfs GPIO pin handling.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::HardwareError;

// udev may need a moment to create gpioN/ and fix its permissions after export.
const EXPORT_POLL_ATTEMPTS: u32 = 40;
const EXPORT_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    In,
    /// Output, initialised low.
    OutLow,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::OutLow => "low",
        }
    }
}

#[derive(Debug)]
pub(crate) struct SysfsPin {
    root: PathBuf,
    line: u32,
    dir: PathBuf,
    exported_here: bool,
}

impl SysfsPin {
    /// Export `line` under `root` if needed and set its direction.
    pub(crate) fn open(root: &Path, line: u32, direction: Direction) -> Result<Self, HardwareError> {
        if !root.is_dir() {
            return Err(HardwareError::NotAvailable(root.to_path_buf()));
        }
        let dir = root.join(format!("gpio{line}"));
        let mut exported_here = false;
        if !dir.is_dir() {
            let export = root.join("export");
            fs::write(&export, line.to_string()).map_err(|err| HardwareError::io(&export, err))?;
            exported_here = true;
            wait_for(&dir.join("direction"));
        }
        let pin = Self {
            root: root.to_path_buf(),
            line,
            dir,
            exported_here,
        };
        let direction_file = pin.dir.join("direction");
        if let Err(err) = fs::write(&direction_file, direction.as_str()) {
            pin.release_quietly();
            return Err(HardwareError::io(&direction_file, err));
        }
        tracing::debug!(line, direction = direction.as_str(), exported_here, "gpio pin ready");
        Ok(pin)
    }

    pub(crate) fn line(&self) -> u32 {
        self.line
    }

    pub(crate) fn write(&self, high: bool) -> Result<(), HardwareError> {
        let value = self.dir.join("value");
        fs::write(&value, if high { "1" } else { "0" }).map_err(|err| HardwareError::io(&value, err))
    }

    pub(crate) fn read(&self) -> Result<bool, HardwareError> {
        let value = self.dir.join("value");
        let raw = fs::read_to_string(&value).map_err(|err| HardwareError::io(&value, err))?;
        match raw.trim() {
            "1" => Ok(true),
            "0" => Ok(false),
            other => Err(HardwareError::Parse {
                path: value,
                value: other.to_string(),
            }),
        }
    }

    /// Unexport the pin if this process exported it.
    pub(crate) fn release(&self) -> Result<(), HardwareError> {
        if !self.exported_here {
            return Ok(());
        }
        let unexport = self.root.join("unexport");
        fs::write(&unexport, self.line.to_string()).map_err(|err| HardwareError::io(&unexport, err))
    }

    /// Like [`release`](Self::release), but logs the error instead.
    pub(crate) fn release_quietly(&self) {
        if let Err(err) = self.release() {
            tracing::warn!(line = self.line, error = %err, "failed to unexport pin");
        }
    }
}

fn wait_for(path: &Path) {
    for _ in 0..EXPORT_POLL_ATTEMPTS {
        if path.exists() {
            return;
        }
        std::thread::sleep(EXPORT_POLL_INTERVAL);
    }
}
