//! Reading — one temperature/humidity sample.
//!
//! Absent fields mean the sensor faulted on this poll. They are never
//! coerced to zero.

use serde::{Deserialize, Serialize};

use crate::time::{Timestamp, now};

/// Where a reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingSource {
    /// A real sensor driver.
    Hardware,
    /// The simulated fallback source.
    Simulated,
}

impl ReadingSource {
    /// Stable lowercase label used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hardware => "hardware",
            Self::Simulated => "simulated",
        }
    }
}

/// A single climate sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub temperature_celsius: Option<f64>,
    pub humidity_percent: Option<f64>,
    pub captured_at: Timestamp,
    pub source: ReadingSource,
}

impl Reading {
    /// A complete reading captured now.
    #[must_use]
    pub fn new(temperature_celsius: f64, humidity_percent: f64, source: ReadingSource) -> Self {
        Self {
            temperature_celsius: Some(temperature_celsius),
            humidity_percent: Some(humidity_percent),
            captured_at: now(),
            source,
        }
    }

    /// A reading with both fields absent, signalling a transient fault.
    #[must_use]
    pub fn unavailable(source: ReadingSource) -> Self {
        Self {
            temperature_celsius: None,
            humidity_percent: None,
            captured_at: now(),
            source,
        }
    }

    /// Whether both fields are absent ("skip this cycle").
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        self.temperature_celsius.is_none() && self.humidity_percent.is_none()
    }

    /// Temperature converted to Fahrenheit, when present.
    #[must_use]
    pub fn temperature_fahrenheit(&self) -> Option<f64> {
        self.temperature_celsius.map(|c| c * 9.0 / 5.0 + 32.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_flag_all_absent_reading_as_unavailable() {
        let reading = Reading::unavailable(ReadingSource::Hardware);
        assert!(reading.is_unavailable());
    }

    #[test]
    fn should_not_flag_partial_reading_as_unavailable() {
        let mut reading = Reading::unavailable(ReadingSource::Hardware);
        reading.humidity_percent = Some(40.0);
        assert!(!reading.is_unavailable());
        assert_eq!(reading.temperature_fahrenheit(), None);
    }

    #[test]
    fn should_convert_to_fahrenheit() {
        let reading = Reading::new(25.0, 50.0, ReadingSource::Simulated);
        assert_eq!(reading.temperature_fahrenheit(), Some(77.0));
    }

    #[test]
    fn should_serialize_source_in_snake_case() {
        let json = serde_json::to_string(&ReadingSource::Simulated).unwrap();
        assert_eq!(json, "\"simulated\"");
    }
}
