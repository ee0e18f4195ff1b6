//! MQTT adapter error types.

use thermotrack_domain::error::ThermoTrackError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client rejected the request (queue full or event loop gone).
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// An event payload could not be encoded.
    #[error("failed to encode MQTT payload")]
    PayloadEncode(#[source] serde_json::Error),

    /// An incoming MQTT payload was not UTF-8.
    #[error("MQTT payload is not UTF-8")]
    NotUtf8(#[source] std::str::Utf8Error),
}

impl From<MqttError> for ThermoTrackError {
    fn from(err: MqttError) -> Self {
        ThermoTrackError::Transport(Box::new(err))
    }
}
