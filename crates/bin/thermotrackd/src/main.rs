//! # thermotrackd — thermotrack daemon
//!
//! Composition root that wires all adapters together and runs the
//! controller.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars) and initialise logging
//! - Pick the hardware backend (GPIO, simulated, or a mix under `auto`)
//! - Connect the transport and the persistence sink
//! - Run the control loop until SIGINT/SIGTERM, then switch every output off
//!
//! ## Exit codes
//! | Code | Meaning |
//! |------|---------|
//! | 0 | clean shutdown after a signal |
//! | 1 | configuration fault |
//! | 2 | hardware initialisation fault |
//! | 3 | other fatal fault (database open, crashed control task) |
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod hardware;

use std::error::Error;
use std::future::Future;
use std::process::ExitCode;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use thermotrack_adapter_mqtt::{Inbound, MqttPublisher};
use thermotrack_adapter_storage_sqlite_sqlx::SqliteReadingSink;
use thermotrack_app::command_inbox::command_channel;
use thermotrack_app::control_loop::ControlLoop;
use thermotrack_app::controller::Controller;
use thermotrack_app::event_bus::InProcessEventBus;
use thermotrack_app::ports::{Actuators, EventPublisher};
use thermotrack_app::services::persistence_service::PersistenceService;
use thermotrack_domain::actuator::ActuatorState;
use thermotrack_domain::error::ThermoTrackError;
use thermotrack_domain::event::EventPayload;

use crate::config::{Config, LoggingConfig, TransportKind};

const EXIT_CONFIG: u8 = 1;
const EXIT_HARDWARE: u8 = 2;
const EXIT_FATAL: u8 = 3;

const EVENT_BUS_CAPACITY: usize = 256;
/// How long background tasks get to drain after the control loop stopped.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the control loop sends its events.
enum AnyPublisher {
    Mqtt(MqttPublisher),
    /// No transport: events go straight onto the in-process bus.
    Bus(InProcessEventBus),
}

impl EventPublisher for AnyPublisher {
    fn publish(
        &self,
        payload: EventPayload,
    ) -> impl Future<Output = Result<(), ThermoTrackError>> + Send {
        async move {
            match self {
                Self::Mqtt(publisher) => publisher.publish(payload).await,
                Self::Bus(bus) => bus.publish(payload).await,
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            init_tracing(&LoggingConfig::default().filter);
            tracing::error!(error = %error_chain(&err), "invalid configuration");
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    init_tracing(&config.logging.filter);

    run(config).await
}

fn init_tracing(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// `err` followed by each of its sources, `: `-separated.
fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

async fn run(config: Config) -> ExitCode {
    // Hardware
    let hardware = match hardware::select(config.hardware.backend, &config.gpio, &config.pins) {
        Ok(hardware) => hardware,
        Err(err) => {
            tracing::error!(error = %error_chain(&err), "hardware initialisation failed");
            return ExitCode::from(EXIT_HARDWARE);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let bus = InProcessEventBus::new(EVENT_BUS_CAPACITY);
    let mut background: Vec<JoinHandle<()>> = Vec::new();

    // Persistence
    if config.sink.enabled {
        let db_config = thermotrack_adapter_storage_sqlite_sqlx::Config {
            database_url: config.sink.database_url.clone(),
        };
        let db = match db_config.build().await {
            Ok(db) => db,
            Err(err) => {
                tracing::error!(error = %error_chain(&err), "failed to open database");
                if let Err(err) = hardware.actuators.cleanup() {
                    tracing::warn!(error = %err, "failed to reset outputs");
                }
                return ExitCode::from(EXIT_FATAL);
            }
        };
        let service = PersistenceService::new(SqliteReadingSink::new(db.pool().clone()));
        background.push(tokio::spawn(service.run(bus.subscribe())));
        tracing::info!("persistence sink enabled");
    }

    // Transport
    let (inbox, commands) = command_channel(config.control.command_queue_capacity);
    let publisher = match config.transport.kind {
        TransportKind::Mqtt => {
            let (publisher, driver) = thermotrack_adapter_mqtt::connect(&config.mqtt);
            let inbound = Inbound {
                commands: Some(inbox),
                events: config.sink.enabled.then(|| bus.clone()),
            };
            background.push(tokio::spawn(driver.run(inbound, shutdown_rx.clone())));
            AnyPublisher::Mqtt(publisher)
        }
        TransportKind::None => {
            tracing::info!("no transport configured, manual commands disabled");
            drop(inbox);
            AnyPublisher::Bus(bus.clone())
        }
    };

    // Control
    let settings = config.control_settings();
    let controller = Controller::new(
        hardware.actuators,
        ActuatorState::with_threshold(settings.temperature_threshold_celsius),
        settings.manual_override_timeout,
    );
    let control = ControlLoop::new(
        hardware.climate,
        hardware.motion,
        controller,
        publisher,
        settings,
    )
    .with_commands(commands);
    let mut control_task = tokio::spawn(control.run(shutdown_rx));

    let finished = tokio::select! {
        () = shutdown_signal() => None,
        result = &mut control_task => Some(result),
    };
    let _ = shutdown_tx.send(true);
    let control_result = match finished {
        Some(result) => result,
        None => {
            tracing::info!("shutdown requested");
            control_task.await
        }
    };

    // The bus closes once the loop and the transport let go of it, which
    // ends the persistence task.
    drop(bus);
    for task in background {
        match tokio::time::timeout(DRAIN_TIMEOUT, task).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "background task failed"),
            Err(_) => tracing::warn!("background task did not stop in time"),
        }
    }

    match control_result {
        Ok(()) => {
            tracing::info!("thermotrackd stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "control loop crashed");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
