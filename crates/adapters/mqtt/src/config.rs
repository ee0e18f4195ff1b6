//! MQTT transport configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the MQTT transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Channel name; events go to `<channel>/events`, commands arrive on
    /// `<channel>/commands`.
    pub channel: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Capacity of the client's outgoing request queue.
    pub request_capacity: usize,
    /// Pause before polling again after a connection error, in seconds.
    pub reconnect_delay_secs: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "thermotrack".to_string(),
            channel: "thermotrack".to_string(),
            keep_alive_secs: 30,
            username: None,
            password: None,
            request_capacity: 100,
            reconnect_delay_secs: 5,
        }
    }
}

impl MqttConfig {
    #[must_use]
    pub fn events_topic(&self) -> String {
        format!("{}/events", self.channel)
    }

    #[must_use]
    pub fn commands_topic(&self) -> String {
        format!("{}/commands", self.channel)
    }

    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = MqttConfig::default();
        assert_eq!(config.broker_host, "localhost");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.client_id, "thermotrack");
        assert_eq!(config.keep_alive_secs, 30);
        assert_eq!(config.username, None);
    }

    #[test]
    fn should_derive_topics_from_channel() {
        let config = MqttConfig {
            channel: "home/hvac".to_string(),
            ..MqttConfig::default()
        };
        assert_eq!(config.events_topic(), "home/hvac/events");
        assert_eq!(config.commands_topic(), "home/hvac/commands");
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            broker_host = "mqtt.example.com"
            broker_port = 8883
            client_id = "pi-livingroom"
            channel = "livingroom"
            username = "pi"
            password = "secret"
        "#;
        let config: MqttConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "mqtt.example.com");
        assert_eq!(config.broker_port, 8883);
        assert_eq!(config.client_id, "pi-livingroom");
        assert_eq!(config.commands_topic(), "livingroom/commands");
        assert_eq!(config.username.as_deref(), Some("pi"));
        assert_eq!(config.password.as_deref(), Some("secret"));
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let toml = r#"broker_host = "192.168.1.100""#;
        let config: MqttConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "192.168.1.100");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.channel, "thermotrack");
    }
}
