//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `thermotrack.toml` in the working directory, or the file named
//! by `THERMOTRACK_CONFIG`. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use thermotrack_adapter_gpio::{GpioConfig, PinMap};
use thermotrack_adapter_mqtt::MqttConfig;
use thermotrack_app::control_loop::{ControlSettings, DeviceUids};
use thermotrack_domain::actuator::validate_threshold;

const DEFAULT_CONFIG_PATH: &str = "thermotrack.toml";

/// Upper bound for second-valued intervals and timeouts (one day).
const MAX_SECS: u64 = 86_400;
/// Upper bound for millisecond-valued durations.
const MAX_MILLIS: u64 = 60_000;
const MAX_GPIO_BASE: u32 = 4_096;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub hardware: HardwareConfig,
    /// Kernel interface locations for the GPIO backend.
    pub gpio: GpioConfig,
    /// BCM pin assignment.
    pub pins: PinMap,
    pub control: ControlConfig,
    pub devices: DevicesConfig,
    pub transport: TransportConfig,
    pub mqtt: MqttConfig,
    pub sink: SinkConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Which device backend drives the sensors and outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// GPIO when the board interfaces exist, simulated otherwise.
    #[default]
    Auto,
    Gpio,
    Simulated,
}

impl FromStr for Backend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "gpio" => Ok(Self::Gpio),
            "simulated" => Ok(Self::Simulated),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    pub backend: Backend,
}

/// Loop timing and fan policy.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub read_interval_secs: u64,
    /// Pause after a failed climate read.
    pub sensor_retry_secs: u64,
    pub temperature_threshold_celsius: f64,
    pub motion_cooldown_secs: u64,
    pub manual_override_timeout_secs: u64,
    pub beep_on_motion: bool,
    pub beep_duration_ms: u64,
    /// How many validated commands may wait for the loop.
    pub command_queue_capacity: usize,
}

/// Device uids stamped on published events.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DevicesConfig {
    pub climate: String,
    pub motion: String,
    pub controller: String,
}

/// Pub/sub transport selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Run standalone; events stay in-process and no commands arrive.
    #[default]
    None,
    Mqtt,
}

impl FromStr for TransportKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "mqtt" => Ok(Self::Mqtt),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub kind: TransportKind,
}

/// Persistence of received events.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub enabled: bool,
    /// `SQLite` connection URL.
    pub database_url: String,
}

impl Config {
    /// Load configuration from `thermotrack.toml` (or `THERMOTRACK_CONFIG`),
    /// apply environment-variable overrides and validate the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed, if `THERMOTRACK_CONFIG`
    /// names a file that cannot be read, if an override does not parse, or
    /// if validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("THERMOTRACK_CONFIG") {
            Ok(path) => Self::from_file(&path, true)?,
            Err(_) => Self::from_file(DEFAULT_CONFIG_PATH, false)?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str, required: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    fn apply_env_overrides(
        &mut self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = env("THERMOTRACK_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = env("RUST_LOG") {
            self.logging.filter = val;
        }

        if let Some(val) = env("THERMOTRACK_BACKEND") {
            self.hardware.backend = parse_env("THERMOTRACK_BACKEND", val)?;
        }
        if let Some(val) = env("THERMOTRACK_PIR_PIN") {
            self.pins.pir = parse_env("THERMOTRACK_PIR_PIN", val)?;
        }
        if let Some(val) = env("THERMOTRACK_FAN_PIN") {
            self.pins.fan = parse_env("THERMOTRACK_FAN_PIN", val)?;
        }
        if let Some(val) = env("THERMOTRACK_BUZZER_PIN") {
            self.pins.buzzer = parse_env("THERMOTRACK_BUZZER_PIN", val)?;
        }
        if let Some(val) = env("THERMOTRACK_LED_PIN") {
            self.pins.led = parse_env("THERMOTRACK_LED_PIN", val)?;
        }

        if let Some(val) = env("THERMOTRACK_READ_INTERVAL_SECS") {
            self.control.read_interval_secs = parse_env("THERMOTRACK_READ_INTERVAL_SECS", val)?;
        }
        if let Some(val) = env("THERMOTRACK_TEMP_THRESHOLD") {
            self.control.temperature_threshold_celsius =
                parse_env("THERMOTRACK_TEMP_THRESHOLD", val)?;
        }
        if let Some(val) = env("THERMOTRACK_MOTION_COOLDOWN_SECS") {
            self.control.motion_cooldown_secs =
                parse_env("THERMOTRACK_MOTION_COOLDOWN_SECS", val)?;
        }
        if let Some(val) = env("THERMOTRACK_MANUAL_TIMEOUT_SECS") {
            self.control.manual_override_timeout_secs =
                parse_env("THERMOTRACK_MANUAL_TIMEOUT_SECS", val)?;
        }

        if let Some(val) = env("THERMOTRACK_TRANSPORT") {
            self.transport.kind = parse_env("THERMOTRACK_TRANSPORT", val)?;
        }
        if let Some(val) = env("THERMOTRACK_MQTT_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Some(val) = env("THERMOTRACK_MQTT_PORT") {
            self.mqtt.broker_port = parse_env("THERMOTRACK_MQTT_PORT", val)?;
        }
        if let Some(val) = env("THERMOTRACK_MQTT_USERNAME") {
            self.mqtt.username = Some(val);
        }
        if let Some(val) = env("THERMOTRACK_MQTT_PASSWORD") {
            self.mqtt.password = Some(val);
        }
        if let Some(val) = env("THERMOTRACK_CHANNEL") {
            self.mqtt.channel = val;
        }

        if let Some(val) = env("THERMOTRACK_SINK_ENABLED") {
            self.sink.enabled = parse_flag("THERMOTRACK_SINK_ENABLED", val)?;
        }
        if let Some(val) = env("THERMOTRACK_DATABASE_URL") {
            self.sink.database_url = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let control = &self.control;
        for (name, value, max) in [
            ("control.read_interval_secs", control.read_interval_secs, MAX_SECS),
            ("control.sensor_retry_secs", control.sensor_retry_secs, MAX_SECS),
            (
                "control.manual_override_timeout_secs",
                control.manual_override_timeout_secs,
                MAX_SECS,
            ),
            ("control.beep_duration_ms", control.beep_duration_ms, MAX_MILLIS),
            ("gpio.read_timeout_ms", self.gpio.read_timeout_ms, MAX_MILLIS),
        ] {
            if value == 0 || value > max {
                return Err(ConfigError::Validation(format!(
                    "{name} must be between 1 and {max}"
                )));
            }
        }
        if control.motion_cooldown_secs > MAX_SECS {
            return Err(ConfigError::Validation(format!(
                "control.motion_cooldown_secs must be at most {MAX_SECS}"
            )));
        }
        if self.gpio.gpio_base > MAX_GPIO_BASE {
            return Err(ConfigError::Validation(format!(
                "gpio.gpio_base must be at most {MAX_GPIO_BASE}"
            )));
        }
        for pin in [self.pins.pir, self.pins.fan, self.pins.buzzer, self.pins.led] {
            self.gpio
                .line(pin)
                .map_err(|err| ConfigError::Validation(err.to_string()))?;
        }
        if control.command_queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "control.command_queue_capacity must be positive".to_string(),
            ));
        }
        validate_threshold(control.temperature_threshold_celsius)
            .map_err(|err| ConfigError::Validation(err.to_string()))?;

        for (name, uid) in [
            ("devices.climate", &self.devices.climate),
            ("devices.motion", &self.devices.motion),
            ("devices.controller", &self.devices.controller),
        ] {
            if uid.trim().is_empty() {
                return Err(ConfigError::MissingSetting(name));
            }
        }

        if self.transport.kind == TransportKind::Mqtt {
            if self.mqtt.broker_host.trim().is_empty() {
                return Err(ConfigError::MissingSetting("mqtt.broker_host"));
            }
            if self.mqtt.channel.trim().is_empty() {
                return Err(ConfigError::MissingSetting("mqtt.channel"));
            }
            if self.mqtt.username.is_some() && self.mqtt.password.is_none() {
                return Err(ConfigError::MissingSetting("mqtt.password"));
            }
            if self.mqtt.keep_alive_secs < 5 {
                return Err(ConfigError::Validation(
                    "mqtt.keep_alive_secs must be at least 5".to_string(),
                ));
            }
        }

        if self.sink.enabled && self.sink.database_url.trim().is_empty() {
            return Err(ConfigError::MissingSetting("sink.database_url"));
        }
        Ok(())
    }

    /// Settings handed to the control loop.
    #[must_use]
    pub fn control_settings(&self) -> ControlSettings {
        ControlSettings {
            read_interval: Duration::from_secs(self.control.read_interval_secs),
            sensor_retry_backoff: Duration::from_secs(self.control.sensor_retry_secs),
            temperature_threshold_celsius: self.control.temperature_threshold_celsius,
            motion_cooldown: Duration::from_secs(self.control.motion_cooldown_secs),
            manual_override_timeout: Duration::from_secs(
                self.control.manual_override_timeout_secs,
            ),
            beep_on_motion: self.control.beep_on_motion,
            beep_duration: Duration::from_millis(self.control.beep_duration_ms),
            devices: DeviceUids {
                climate: self.devices.climate.clone(),
                motion: self.devices.motion.clone(),
                controller: self.devices.controller.clone(),
            },
        }
    }
}

fn parse_env<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    match value.trim().parse() {
        Ok(parsed) => Ok(parsed),
        Err(_) => Err(ConfigError::InvalidEnv { var, value }),
    }
}

fn parse_flag(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv { var, value }),
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "thermotrackd=info,thermotrack=info".to_string(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            read_interval_secs: 2,
            sensor_retry_secs: 2,
            temperature_threshold_celsius: 24.0,
            motion_cooldown_secs: 2,
            manual_override_timeout_secs: 10,
            beep_on_motion: true,
            beep_duration_ms: 300,
            command_queue_capacity: 32,
        }
    }
}

impl Default for DevicesConfig {
    fn default() -> Self {
        let uids = DeviceUids::default();
        Self {
            climate: uids.climate,
            motion: uids.motion,
            controller: uids.controller,
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            database_url: "sqlite:thermotrack.db?mode=rwc".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
    /// A setting required by the chosen options is absent.
    #[error("missing setting: {0}")]
    MissingSetting(&'static str),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
