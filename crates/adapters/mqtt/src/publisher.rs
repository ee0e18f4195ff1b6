//! Fire-and-forget event publisher.

use std::future::Future;

use rumqttc::{AsyncClient, QoS};

use thermotrack_app::ports::EventPublisher;
use thermotrack_domain::error::ThermoTrackError;
use thermotrack_domain::event::EventPayload;

use crate::error::MqttError;

/// Publishes event payloads as JSON on the events topic.
///
/// Uses `try_publish` at QoS 0: a payload is queued for the event loop or
/// rejected immediately, never awaited.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    topic: String,
}

impl MqttPublisher {
    pub(crate) fn new(client: AsyncClient, topic: String) -> Self {
        Self { client, topic }
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    fn send(&self, payload: &EventPayload) -> Result<(), MqttError> {
        let bytes = serde_json::to_vec(payload).map_err(MqttError::PayloadEncode)?;
        self.client
            .try_publish(self.topic.as_str(), QoS::AtMostOnce, false, bytes)
            .map_err(MqttError::Client)
    }
}

impl EventPublisher for MqttPublisher {
    fn publish(
        &self,
        payload: EventPayload,
    ) -> impl Future<Output = Result<(), ThermoTrackError>> + Send {
        let result = self.send(&payload);
        if result.is_ok() {
            tracing::debug!(topic = %self.topic, kind = payload.kind(), "published");
        }
        async move { result.map_err(Into::into) }
    }
}
