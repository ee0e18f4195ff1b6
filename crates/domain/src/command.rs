//! Commands — operator requests received from the command channel.
//!
//! A command is a JSON object with a `cmd` field. Names are matched after
//! trimming, lower-casing and turning spaces into underscores, so the
//! `"Fan On"` / `"FAN_ON"` spellings sent by older dashboards still work.

use std::fmt;

use serde::Deserialize;

use crate::actuator::{Preset, validate_threshold};
use crate::error::CommandError;

/// A validated operator command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    FanOn,
    FanOff,
    BuzzerOn,
    BuzzerOff,
    AutoOn,
    AutoOff,
    SetThreshold(f64),
    ApplyPreset(Preset),
}

#[derive(Debug, Deserialize)]
struct RawCommand {
    cmd: Option<String>,
    value: Option<serde_json::Value>,
    preset: Option<String>,
}

impl Command {
    /// Parse and validate a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the payload is not JSON, has no `cmd`,
    /// names an unknown command or lacks a required argument.
    pub fn from_json(payload: &str) -> Result<Self, CommandError> {
        let raw: RawCommand = serde_json::from_str(payload).map_err(CommandError::Malformed)?;
        let name = raw.cmd.ok_or(CommandError::NotACommand)?;
        Self::from_parts(&name, raw.value.as_ref(), raw.preset.as_deref())
    }

    fn from_parts(
        name: &str,
        value: Option<&serde_json::Value>,
        preset: Option<&str>,
    ) -> Result<Self, CommandError> {
        let normalized = name.trim().to_lowercase().replace(' ', "_");
        match normalized.as_str() {
            "fan_on" => Ok(Self::FanOn),
            "fan_off" => Ok(Self::FanOff),
            "buzzer_on" => Ok(Self::BuzzerOn),
            "buzzer_off" => Ok(Self::BuzzerOff),
            "auto_on" => Ok(Self::AutoOn),
            "auto_off" => Ok(Self::AutoOff),
            "set_threshold" => {
                let value = value
                    .and_then(threshold_value)
                    .ok_or(CommandError::MissingField {
                        command: "set_threshold",
                        field: "value",
                    })?;
                Ok(Self::SetThreshold(validate_threshold(value)?))
            }
            "preset" => {
                let preset = preset.ok_or(CommandError::MissingField {
                    command: "preset",
                    field: "preset",
                })?;
                Ok(Self::ApplyPreset(preset.parse()?))
            }
            _ => Err(CommandError::Unknown(name.to_string())),
        }
    }

    /// Canonical command name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FanOn => "fan_on",
            Self::FanOff => "fan_off",
            Self::BuzzerOn => "buzzer_on",
            Self::BuzzerOff => "buzzer_off",
            Self::AutoOn => "auto_on",
            Self::AutoOff => "auto_off",
            Self::SetThreshold(_) => "set_threshold",
            Self::ApplyPreset(_) => "preset",
        }
    }

    /// Whether accepting this command opens a manual-override window.
    #[must_use]
    pub fn starts_override(&self) -> bool {
        matches!(
            self,
            Self::FanOn | Self::FanOff | Self::BuzzerOn | Self::BuzzerOff | Self::AutoOff
        )
    }
}

// Dashboards send the threshold either as a number or as a numeric string.
fn threshold_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetThreshold(value) => write!(f, "set_threshold({value})"),
            Self::ApplyPreset(preset) => write!(f, "preset({preset})"),
            other => f.write_str(other.name()),
        }
    }
}
