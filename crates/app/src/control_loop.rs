//! Control loop — the periodic sense/decide/act cycle.
//!
//! Each cycle polls the climate sensor, debounces the motion input, runs the
//! automatic fan policy and publishes a reading heartbeat. Between cycles the
//! loop waits for the next tick while draining queued operator commands, so
//! commands take effect without waiting for a full read interval.

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};

use thermotrack_domain::command::Command;
use thermotrack_domain::event::EventPayload;
use thermotrack_domain::motion::{MotionTracker, MotionTransition};
use thermotrack_domain::time::now;

use crate::controller::Controller;
use crate::ports::{Actuators, ClimateSensor, EventPublisher, MotionSensor};

/// Upper bound on a single publish, so a stuck transport cannot stall a cycle.
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(1);

/// Device identifiers stamped on published events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUids {
    pub climate: String,
    pub motion: String,
    pub controller: String,
}

impl Default for DeviceUids {
    fn default() -> Self {
        Self {
            climate: "dht22_sensor_01".to_string(),
            motion: "pir_sensor_01".to_string(),
            controller: "hardware_controller".to_string(),
        }
    }
}

/// Timing and policy knobs for the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSettings {
    pub read_interval: Duration,
    /// Wait after a failed sensor read before trying again.
    pub sensor_retry_backoff: Duration,
    pub temperature_threshold_celsius: f64,
    pub motion_cooldown: Duration,
    pub manual_override_timeout: Duration,
    pub beep_on_motion: bool,
    pub beep_duration: Duration,
    pub devices: DeviceUids,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            read_interval: Duration::from_secs(2),
            sensor_retry_backoff: Duration::from_secs(2),
            temperature_threshold_celsius: 24.0,
            motion_cooldown: Duration::from_secs(2),
            manual_override_timeout: Duration::from_secs(10),
            beep_on_motion: true,
            beep_duration: Duration::from_millis(300),
            devices: DeviceUids::default(),
        }
    }
}

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed,
    /// The climate sensor returned nothing; the rest of the cycle was skipped.
    SensorUnavailable,
}

enum Wake {
    Tick,
    Shutdown,
    Command(Option<Command>),
}

pub struct ControlLoop<C, M, A: Actuators, P> {
    climate: C,
    motion: M,
    controller: Controller<A>,
    publisher: P,
    tracker: MotionTracker,
    settings: ControlSettings,
    commands: Option<mpsc::Receiver<Command>>,
}

impl<C, M, A, P> ControlLoop<C, M, A, P>
where
    C: ClimateSensor,
    M: MotionSensor,
    A: Actuators,
    P: EventPublisher + Send + Sync,
{
    #[must_use]
    pub fn new(
        climate: C,
        motion: M,
        controller: Controller<A>,
        publisher: P,
        settings: ControlSettings,
    ) -> Self {
        Self {
            climate,
            motion,
            controller,
            publisher,
            tracker: MotionTracker::new(settings.motion_cooldown),
            settings,
            commands: None,
        }
    }

    /// Drain operator commands from `commands` between cycles.
    #[must_use]
    pub fn with_commands(mut self, commands: mpsc::Receiver<Command>) -> Self {
        self.commands = Some(commands);
        self
    }

    #[must_use]
    pub fn controller(&self) -> &Controller<A> {
        &self.controller
    }

    #[must_use]
    pub fn settings(&self) -> &ControlSettings {
        &self.settings
    }

    /// Run one cycle at monotonic time `now`.
    pub async fn run_cycle(&mut self, now_mono: Instant) -> CycleOutcome {
        let reading = self.climate.poll().await;
        if reading.is_unavailable() {
            tracing::warn!(
                source = reading.source.as_str(),
                "climate sensor returned no data, skipping cycle"
            );
            return CycleOutcome::SensorUnavailable;
        }
        tracing::debug!(
            temperature = ?reading.temperature_celsius,
            humidity = ?reading.humidity_percent,
            source = reading.source.as_str(),
            "reading"
        );

        let level = self.motion.read_motion();
        if let Some(transition) = self.tracker.observe(level, now_mono) {
            self.on_motion(transition).await;
        }

        if self
            .controller
            .apply_automatic_fan(reading.temperature_celsius, now_mono)
            .is_some()
        {
            self.publish_status(self.controller.status()).await;
        }

        let heartbeat = EventPayload::reading(self.settings.devices.climate.as_str(), &reading);
        self.publish(heartbeat).await;
        CycleOutcome::Completed
    }

    /// Apply an operator command and publish the resulting hardware state.
    pub async fn handle_command(&self, command: Command) {
        let status = self
            .controller
            .apply_command(command, tokio::time::Instant::now().into_std());
        self.publish_status(status).await;
    }

    /// Run until `shutdown` flips to `true` (or its sender goes away), then
    /// switch every output off.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            interval_secs = self.settings.read_interval.as_secs_f64(),
            threshold = self.settings.temperature_threshold_celsius,
            "control loop started"
        );
        let mut commands = self.commands.take();

        'cycles: loop {
            if *shutdown.borrow() {
                break;
            }
            let started = tokio::time::Instant::now();
            let wait = match self.run_cycle(started.into_std()).await {
                CycleOutcome::Completed => self.settings.read_interval,
                CycleOutcome::SensorUnavailable => self.settings.sensor_retry_backoff,
            };
            // `sleep` clamps durations that would overflow an Instant.
            let tick = tokio::time::sleep(wait.saturating_sub(started.elapsed()));
            tokio::pin!(tick);

            loop {
                let wake = tokio::select! {
                    () = &mut tick => Wake::Tick,
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            Wake::Shutdown
                        } else {
                            continue;
                        }
                    }
                    command = next_command(&mut commands) => Wake::Command(command),
                };
                match wake {
                    Wake::Tick => break,
                    Wake::Shutdown => break 'cycles,
                    Wake::Command(Some(command)) => self.handle_command(command).await,
                    Wake::Command(None) => {
                        tracing::debug!("command queue closed");
                        commands = None;
                    }
                }
            }
        }

        tracing::info!("control loop stopping");
        self.controller.cleanup();
    }

    async fn on_motion(&self, transition: MotionTransition) {
        let payload = EventPayload::motion(self.settings.devices.motion.as_str(), transition, now());
        match transition {
            MotionTransition::Started => {
                tracing::info!("motion detected");
                self.publish(payload).await;
                if self.settings.beep_on_motion {
                    self.controller.beep(self.settings.beep_duration);
                }
                self.controller.set_led(true);
            }
            MotionTransition::Stopped => {
                tracing::info!("motion stopped");
                self.publish(payload).await;
                self.controller.set_led(false);
            }
        }
    }

    async fn publish_status(&self, status: thermotrack_domain::actuator::HardwareStatus) {
        let payload =
            EventPayload::hardware_state(self.settings.devices.controller.as_str(), status, now());
        self.publish(payload).await;
    }

    async fn publish(&self, payload: EventPayload) {
        let kind = payload.kind();
        match tokio::time::timeout(PUBLISH_TIMEOUT, self.publisher.publish(payload)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(kind, error = %err, "failed to publish event"),
            Err(_) => tracing::warn!(kind, "publishing event timed out"),
        }
    }
}

async fn next_command(commands: &mut Option<mpsc::Receiver<Command>>) -> Option<Command> {
    match commands {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
