//! Actuator state, presets and the automatic fan rule.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CommandError, ValidationError};

/// Lowest threshold accepted from configuration or commands, in °C.
pub const MIN_THRESHOLD_CELSIUS: f64 = -40.0;
/// Highest threshold accepted from configuration or commands, in °C.
pub const MAX_THRESHOLD_CELSIUS: f64 = 80.0;

/// Last commanded state of every output, plus the fan policy settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorState {
    pub fan_on: bool,
    pub fan_auto_mode: bool,
    pub buzzer_on: bool,
    pub temperature_threshold_celsius: f64,
}

impl ActuatorState {
    /// Everything off, automatic fan control on, with the given threshold.
    #[must_use]
    pub fn with_threshold(temperature_threshold_celsius: f64) -> Self {
        Self {
            fan_on: false,
            fan_auto_mode: true,
            buzzer_on: false,
            temperature_threshold_celsius,
        }
    }

    /// Fan state the automatic policy wants for `temperature_celsius`.
    #[must_use]
    pub fn desired_fan(&self, temperature_celsius: f64) -> bool {
        fan_should_run(temperature_celsius, self.temperature_threshold_celsius)
    }
}

impl Default for ActuatorState {
    fn default() -> Self {
        Self::with_threshold(24.0)
    }
}

/// The automatic fan rule: run strictly above the threshold.
#[must_use]
pub fn fan_should_run(temperature_celsius: f64, threshold_celsius: f64) -> bool {
    temperature_celsius > threshold_celsius
}

/// Check that a threshold is finite and within the supported range.
///
/// # Errors
///
/// Returns [`ValidationError::ThresholdOutOfRange`] otherwise.
pub fn validate_threshold(threshold_celsius: f64) -> Result<f64, ValidationError> {
    if threshold_celsius.is_finite()
        && (MIN_THRESHOLD_CELSIUS..=MAX_THRESHOLD_CELSIUS).contains(&threshold_celsius)
    {
        Ok(threshold_celsius)
    } else {
        Err(ValidationError::ThresholdOutOfRange(threshold_celsius))
    }
}

/// Named bundles of fan settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Auto mode, 22 °C.
    Comfort,
    /// Auto mode, 24 °C.
    EnergySaver,
    /// Auto mode off, fan left as is.
    Manual,
    /// Auto mode off, fan off.
    Away,
}

impl Preset {
    pub const ALL: [Self; 4] = [Self::Comfort, Self::EnergySaver, Self::Manual, Self::Away];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comfort => "comfort",
            Self::EnergySaver => "energy_saver",
            Self::Manual => "manual",
            Self::Away => "away",
        }
    }

    /// Apply the preset to `state`.
    ///
    /// Only mutates the in-memory state; driving the fan output when
    /// `fan_on` changes is the caller's job.
    pub fn apply(self, state: &mut ActuatorState) {
        match self {
            Self::Comfort => {
                state.fan_auto_mode = true;
                state.temperature_threshold_celsius = 22.0;
            }
            Self::EnergySaver => {
                state.fan_auto_mode = true;
                state.temperature_threshold_celsius = 24.0;
            }
            Self::Manual => state.fan_auto_mode = false,
            Self::Away => {
                state.fan_auto_mode = false;
                state.fan_on = false;
            }
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| CommandError::UnknownPreset(s.to_string()))
    }
}

/// Snapshot published as the `state` of a `hardware_state` event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HardwareStatus {
    #[serde(flatten)]
    pub actuators: ActuatorState,
    pub manual_override: bool,
    pub preset: Option<Preset>,
}
