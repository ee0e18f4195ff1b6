//! # thermotrack-adapter-mqtt
//!
//! MQTT transport for the pub/sub channel.
//!
//! ## Responsibilities
//! - Publish event payloads as JSON on `<channel>/events` without waiting for
//!   the broker ([`MqttPublisher`])
//! - Keep the connection alive and re-subscribe after every reconnect
//!   ([`MqttEventLoop`])
//! - Hand messages from `<channel>/commands` to the command inbox, and relay
//!   payloads seen on `<channel>/events` to an in-process bus
//!
//! ## Dependency rule
//! Same as other adapters: depends on `thermotrack-app` and
//! `thermotrack-domain`.

mod config;
mod error;
mod event_loop;
mod publisher;

pub use config::MqttConfig;
pub use error::MqttError;
pub use event_loop::{Inbound, MqttEventLoop};
pub use publisher::MqttPublisher;

use std::time::Duration;

use rumqttc::{AsyncClient, MqttOptions};

/// Build the client pair for `config`.
///
/// Nothing touches the network until [`MqttEventLoop::run`] is polled, so
/// payloads published before that are queued (up to `request_capacity`).
#[must_use]
pub fn connect(config: &MqttConfig) -> (MqttPublisher, MqttEventLoop) {
    let mut options = MqttOptions::new(
        config.client_id.as_str(),
        config.broker_host.as_str(),
        config.broker_port,
    );
    options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        options.set_credentials(username.as_str(), password.as_str());
    }

    let (client, event_loop) = AsyncClient::new(options, config.request_capacity.max(1));
    let publisher = MqttPublisher::new(client.clone(), config.events_topic());
    let driver = MqttEventLoop::new(
        client,
        event_loop,
        config.events_topic(),
        config.commands_topic(),
        config.reconnect_delay(),
    );
    (publisher, driver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermotrack_app::ports::EventPublisher;
    use thermotrack_domain::event::EventPayload;
    use thermotrack_domain::reading::{Reading, ReadingSource};

    #[tokio::test]
    async fn should_queue_publish_without_broker() {
        let (publisher, _driver) = connect(&MqttConfig::default());
        assert_eq!(publisher.topic(), "thermotrack/events");

        let payload = EventPayload::reading(
            "dht22_sensor_01",
            &Reading::new(22.0, 40.0, ReadingSource::Simulated),
        );
        assert!(publisher.publish(payload).await.is_ok());
    }

    #[tokio::test]
    async fn should_reject_publish_when_queue_full() {
        let config = MqttConfig {
            request_capacity: 1,
            ..MqttConfig::default()
        };
        let (publisher, _driver) = connect(&config);
        let payload = EventPayload::reading(
            "dht22_sensor_01",
            &Reading::new(22.0, 40.0, ReadingSource::Simulated),
        );

        assert!(publisher.publish(payload.clone()).await.is_ok());
        assert!(publisher.publish(payload).await.is_err());
    }
}
