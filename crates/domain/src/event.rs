//! Event payloads — immutable records published on the pub/sub channel.
//!
//! The wire form is a JSON object tagged by `kind`:
//!
//! ```json
//! {"kind": "reading", "device_uid": "dht22_sensor_01", "temperature_celsius": 23.4,
//!  "humidity_percent": 41.2, "source": "hardware", "at": 1700000000}
//! {"kind": "motion", "device_uid": "pir_sensor_01", "occupied": 1, "at": 1700000000}
//! {"kind": "hardware_state", "device_uid": "hardware_controller", "state": {…}, "at": 1700000000}
//! ```

use serde::{Deserialize, Serialize};

use crate::actuator::HardwareStatus;
use crate::motion::MotionTransition;
use crate::reading::{Reading, ReadingSource};
use crate::time::{Timestamp, epoch_seconds};

/// Something the controller reports to downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    /// Periodic temperature/humidity heartbeat.
    Reading {
        device_uid: String,
        temperature_celsius: Option<f64>,
        humidity_percent: Option<f64>,
        source: ReadingSource,
        at: i64,
    },
    /// Confirmed motion start (`occupied = 1`) or stop (`occupied = 0`).
    Motion {
        device_uid: String,
        occupied: u8,
        at: i64,
    },
    /// Actuator state after a command or an automatic change.
    HardwareState {
        device_uid: String,
        state: HardwareStatus,
        at: i64,
    },
}

impl EventPayload {
    /// Build a reading heartbeat, rounding values to two decimals.
    #[must_use]
    pub fn reading(device_uid: impl Into<String>, reading: &Reading) -> Self {
        Self::Reading {
            device_uid: device_uid.into(),
            temperature_celsius: reading.temperature_celsius.map(round2),
            humidity_percent: reading.humidity_percent.map(round2),
            source: reading.source,
            at: epoch_seconds(reading.captured_at),
        }
    }

    #[must_use]
    pub fn motion(device_uid: impl Into<String>, transition: MotionTransition, at: Timestamp) -> Self {
        Self::Motion {
            device_uid: device_uid.into(),
            occupied: transition.occupied(),
            at: epoch_seconds(at),
        }
    }

    #[must_use]
    pub fn hardware_state(
        device_uid: impl Into<String>,
        state: HardwareStatus,
        at: Timestamp,
    ) -> Self {
        Self::HardwareState {
            device_uid: device_uid.into(),
            state,
            at: epoch_seconds(at),
        }
    }

    /// The `kind` tag.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Reading { .. } => "reading",
            Self::Motion { .. } => "motion",
            Self::HardwareState { .. } => "hardware_state",
        }
    }

    #[must_use]
    pub fn device_uid(&self) -> &str {
        match self {
            Self::Reading { device_uid, .. }
            | Self::Motion { device_uid, .. }
            | Self::HardwareState { device_uid, .. } => device_uid,
        }
    }

    /// Epoch seconds at which the event happened.
    #[must_use]
    pub fn at(&self) -> i64 {
        match self {
            Self::Reading { at, .. } | Self::Motion { at, .. } | Self::HardwareState { at, .. } => {
                *at
            }
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
