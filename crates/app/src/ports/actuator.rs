//! Actuator port — fan, buzzer and indicator LED outputs.

use std::sync::Arc;

use thermotrack_domain::error::ThermoTrackError;

/// Raw output control.
///
/// Writes are synchronous and short (a GPIO level change). Timed behaviour
/// such as a bounded beep is layered on top by
/// [`Controller`](crate::controller::Controller).
pub trait Actuators: Send + Sync + 'static {
    /// Drive the fan relay.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoTrackError::Hardware`] if the output cannot be written.
    fn set_fan(&self, on: bool) -> Result<(), ThermoTrackError>;

    /// Drive the buzzer.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoTrackError::Hardware`] if the output cannot be written.
    fn set_buzzer(&self, on: bool) -> Result<(), ThermoTrackError>;

    /// Drive the indicator LED.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoTrackError::Hardware`] if the output cannot be written.
    fn set_led(&self, on: bool) -> Result<(), ThermoTrackError>;

    /// Switch every output off and release the hardware.
    ///
    /// Must be idempotent: calling it again is a no-op that still leaves
    /// all outputs off.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoTrackError::Hardware`] if an output could not be reset.
    fn cleanup(&self) -> Result<(), ThermoTrackError>;
}

impl<T: Actuators> Actuators for Arc<T> {
    fn set_fan(&self, on: bool) -> Result<(), ThermoTrackError> {
        (**self).set_fan(on)
    }

    fn set_buzzer(&self, on: bool) -> Result<(), ThermoTrackError> {
        (**self).set_buzzer(on)
    }

    fn set_led(&self, on: bool) -> Result<(), ThermoTrackError> {
        (**self).set_led(on)
    }

    fn cleanup(&self) -> Result<(), ThermoTrackError> {
        (**self).cleanup()
    }
}
