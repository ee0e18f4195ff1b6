//! Logging-only actuators.

use std::sync::{Mutex, MutexGuard, PoisonError};

use thermotrack_app::ports::Actuators;
use thermotrack_domain::error::ThermoTrackError;

/// Last level written to each output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputLevels {
    pub fan: bool,
    pub buzzer: bool,
    pub led: bool,
    /// Number of level writes, cleanup excluded.
    pub writes: u32,
    pub released: bool,
}

/// Actuators that only log. Used when no GPIO interface is present.
pub struct MockActuators {
    levels: Mutex<OutputLevels>,
}

impl MockActuators {
    #[must_use]
    pub fn new() -> Self {
        tracing::warn!("using mock actuators, outputs are only logged");
        Self {
            levels: Mutex::new(OutputLevels::default()),
        }
    }

    /// Snapshot of the output levels.
    #[must_use]
    pub fn levels(&self) -> OutputLevels {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, OutputLevels> {
        self.levels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, output: &'static str, on: bool, apply: impl FnOnce(&mut OutputLevels)) {
        let mut levels = self.lock();
        apply(&mut levels);
        levels.writes += 1;
        tracing::info!(output, on, "[mock] output");
    }
}

impl Default for MockActuators {
    fn default() -> Self {
        Self::new()
    }
}

impl Actuators for MockActuators {
    fn set_fan(&self, on: bool) -> Result<(), ThermoTrackError> {
        self.write("fan", on, |l| l.fan = on);
        Ok(())
    }

    fn set_buzzer(&self, on: bool) -> Result<(), ThermoTrackError> {
        self.write("buzzer", on, |l| l.buzzer = on);
        Ok(())
    }

    fn set_led(&self, on: bool) -> Result<(), ThermoTrackError> {
        self.write("led", on, |l| l.led = on);
        Ok(())
    }

    fn cleanup(&self) -> Result<(), ThermoTrackError> {
        let mut levels = self.lock();
        if !levels.released {
            tracing::info!("[mock] all outputs off");
        }
        levels.fan = false;
        levels.buzzer = false;
        levels.led = false;
        levels.released = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_remember_levels() {
        let actuators = MockActuators::new();
        actuators.set_fan(true).unwrap();
        actuators.set_led(true).unwrap();
        actuators.set_led(false).unwrap();

        let levels = actuators.levels();
        assert!(levels.fan);
        assert!(!levels.led);
        assert_eq!(levels.writes, 3);
    }

    #[test]
    fn should_reset_on_cleanup_idempotently() {
        let actuators = MockActuators::new();
        actuators.set_fan(true).unwrap();
        actuators.set_buzzer(true).unwrap();

        actuators.cleanup().unwrap();
        actuators.cleanup().unwrap();

        let levels = actuators.levels();
        assert!(!levels.fan && !levels.buzzer && !levels.led);
        assert!(levels.released);
        assert_eq!(levels.writes, 2);
    }
}
