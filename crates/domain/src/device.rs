//! Persisted devices and sensor records — what a downstream sink stores
//! for each event payload.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::event::EventPayload;
use crate::id::DeviceId;
use crate::time::{Timestamp, from_epoch_seconds, now};

/// What a device measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceKind {
    Temperature,
    Motion,
}

impl DeviceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Motion => "Motion",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Temperature" => Ok(Self::Temperature),
            "Motion" => Ok(Self::Motion),
            other => Err(format!("unknown device kind `{other}`")),
        }
    }
}

/// A registered sensing device, keyed by its `device_uid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub device_uid: String,
    pub name: String,
    pub kind: DeviceKind,
    pub status: String,
    pub created_at: Timestamp,
    pub last_seen_at: Option<Timestamp>,
}

impl Device {
    /// A freshly discovered device, named after its uid.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyDeviceUid`] for a blank uid.
    pub fn discovered(device_uid: &str, kind: DeviceKind) -> Result<Self, ValidationError> {
        let device_uid = device_uid.trim();
        if device_uid.is_empty() {
            return Err(ValidationError::EmptyDeviceUid);
        }
        Ok(Self {
            id: DeviceId::new(),
            device_uid: device_uid.to_string(),
            name: format!("Sensor {device_uid}"),
            kind,
            status: "active".to_string(),
            created_at: now(),
            last_seen_at: None,
        })
    }
}

/// One row of sensor history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub device_uid: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub motion_detected: bool,
    pub recorded_at: Timestamp,
}

impl SensorRecord {
    /// Map an event payload onto a record.
    ///
    /// `hardware_state` events carry no sensor data and map to `None`.
    #[must_use]
    pub fn from_event(payload: &EventPayload) -> Option<Self> {
        let recorded_at = from_epoch_seconds(payload.at()).unwrap_or_else(now);
        match payload {
            EventPayload::Reading {
                device_uid,
                temperature_celsius,
                humidity_percent,
                ..
            } => Some(Self {
                device_uid: device_uid.clone(),
                temperature: *temperature_celsius,
                humidity: *humidity_percent,
                motion_detected: false,
                recorded_at,
            }),
            EventPayload::Motion {
                device_uid,
                occupied,
                ..
            } => Some(Self {
                device_uid: device_uid.clone(),
                temperature: None,
                humidity: None,
                motion_detected: *occupied == 1,
                recorded_at,
            }),
            EventPayload::HardwareState { .. } => None,
        }
    }

    /// Kind to register when the record's device is not yet known.
    #[must_use]
    pub fn device_kind(&self) -> DeviceKind {
        if self.temperature.is_some() || self.humidity.is_some() {
            DeviceKind::Temperature
        } else {
            DeviceKind::Motion
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::{ActuatorState, HardwareStatus};
    use crate::motion::MotionTransition;

    #[test]
    fn should_name_discovered_device_after_uid() {
        let device = Device::discovered("dht22_sensor_01", DeviceKind::Temperature).unwrap();
        assert_eq!(device.name, "Sensor dht22_sensor_01");
        assert_eq!(device.status, "active");
        assert_eq!(device.last_seen_at, None);
    }

    #[test]
    fn should_reject_blank_device_uid() {
        let err = Device::discovered("  ", DeviceKind::Motion).unwrap_err();
        assert_eq!(err, ValidationError::EmptyDeviceUid);
    }

    #[test]
    fn should_map_reading_payload() {
        let payload = EventPayload::Reading {
            device_uid: "dht".to_string(),
            temperature_celsius: Some(21.0),
            humidity_percent: Some(40.0),
            source: crate::reading::ReadingSource::Hardware,
            at: 100,
        };
        let record = SensorRecord::from_event(&payload).unwrap();
        assert_eq!(record.temperature, Some(21.0));
        assert!(!record.motion_detected);
        assert_eq!(record.recorded_at.timestamp(), 100);
        assert_eq!(record.device_kind(), DeviceKind::Temperature);
    }

    #[test]
    fn should_map_motion_payload() {
        let at = from_epoch_seconds(50).unwrap();
        let started = EventPayload::motion("pir", MotionTransition::Started, at);
        let stopped = EventPayload::motion("pir", MotionTransition::Stopped, at);

        let record = SensorRecord::from_event(&started).unwrap();
        assert!(record.motion_detected);
        assert_eq!(record.device_kind(), DeviceKind::Motion);
        assert!(!SensorRecord::from_event(&stopped).unwrap().motion_detected);
    }

    #[test]
    fn should_skip_hardware_state_payload() {
        let status = HardwareStatus {
            actuators: ActuatorState::default(),
            manual_override: false,
            preset: None,
        };
        let payload = EventPayload::hardware_state("hw", status, now());
        assert_eq!(SensorRecord::from_event(&payload), None);
    }

    #[test]
    fn should_roundtrip_device_kind_through_str() {
        for kind in [DeviceKind::Temperature, DeviceKind::Motion] {
            assert_eq!(kind.to_string().parse::<DeviceKind>().unwrap(), kind);
        }
    }
}
