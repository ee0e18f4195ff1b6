//! End-to-end tests for the thermotrackd stack.
//!
//! Each test wires the real control loop to simulated devices, the
//! in-process bus and (where persistence matters) an in-memory `SQLite`
//! sink. No broker and no GPIO interface is needed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::watch;

use thermotrack_adapter_simulated::{MockActuators, SimulatedClimateSensor};
use thermotrack_adapter_storage_sqlite_sqlx::{Config, SqliteReadingSink};
use thermotrack_app::command_inbox::command_channel;
use thermotrack_app::control_loop::{ControlLoop, ControlSettings, CycleOutcome};
use thermotrack_app::controller::Controller;
use thermotrack_app::event_bus::InProcessEventBus;
use thermotrack_app::ports::MotionSensor;
use thermotrack_app::services::persistence_service::PersistenceService;
use thermotrack_domain::actuator::ActuatorState;
use thermotrack_domain::device::DeviceKind;

/// PIR replaying a fixed script, LOW once it runs out.
#[derive(Default)]
struct ScriptedPir {
    script: Mutex<VecDeque<bool>>,
}

impl ScriptedPir {
    fn with(samples: &[bool]) -> Self {
        Self {
            script: Mutex::new(samples.iter().copied().collect()),
        }
    }
}

impl MotionSensor for ScriptedPir {
    fn read_motion(&self) -> bool {
        self.script.lock().unwrap().pop_front().unwrap_or(false)
    }
}

async fn sink() -> SqliteReadingSink {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");
    SqliteReadingSink::new(db.pool().clone())
}

fn controller(outputs: &Arc<MockActuators>, settings: &ControlSettings) -> Controller<Arc<MockActuators>> {
    Controller::new(
        Arc::clone(outputs),
        ActuatorState::with_threshold(settings.temperature_threshold_celsius),
        settings.manual_override_timeout,
    )
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_persist_readings_published_by_the_control_loop() {
    let sink = sink().await;
    let bus = InProcessEventBus::new(64);
    let persistence = tokio::spawn(PersistenceService::new(sink.clone()).run(bus.subscribe()));

    let outputs = Arc::new(MockActuators::new());
    let settings = ControlSettings {
        temperature_threshold_celsius: 19.0,
        ..ControlSettings::default()
    };
    let mut control = ControlLoop::new(
        SimulatedClimateSensor::seeded(7),
        ScriptedPir::default(),
        controller(&outputs, &settings),
        bus.clone(),
        settings,
    );

    let start = Instant::now();
    for step in 0..3 {
        let outcome = control.run_cycle(start + Duration::from_secs(2 * step)).await;
        assert_eq!(outcome, CycleOutcome::Completed);
    }
    // Simulated temperatures never drop below 20 °C.
    assert!(outputs.levels().fan);

    control.controller().cleanup();
    drop(control);
    drop(bus);
    persistence.await.unwrap();

    let history = sink.recent_readings("dht22_sensor_01", 10).await.unwrap();
    assert_eq!(history.len(), 3);
    for record in &history {
        let temperature = record.temperature.unwrap();
        assert!((20.0..26.0).contains(&temperature));
        assert!(!record.motion_detected);
    }

    let device = sink.find_device("dht22_sensor_01").await.unwrap().unwrap();
    assert_eq!(device.kind, DeviceKind::Temperature);
    assert!(
        sink.find_device("hardware_controller").await.unwrap().is_none(),
        "hardware_state events carry no sensor data"
    );
}

#[tokio::test]
async fn should_persist_motion_start_and_stop() {
    let sink = sink().await;
    let bus = InProcessEventBus::new(64);
    let persistence = tokio::spawn(PersistenceService::new(sink.clone()).run(bus.subscribe()));

    let outputs = Arc::new(MockActuators::new());
    let settings = ControlSettings::default();
    let mut control = ControlLoop::new(
        SimulatedClimateSensor::seeded(3),
        ScriptedPir::with(&[true, false]),
        controller(&outputs, &settings),
        bus.clone(),
        settings,
    );

    let start = Instant::now();
    control.run_cycle(start).await;
    assert!(outputs.levels().led);
    control.run_cycle(start + Duration::from_secs(2)).await;
    assert!(!outputs.levels().led);

    control.controller().cleanup();
    drop(control);
    drop(bus);
    persistence.await.unwrap();

    let device = sink.find_device("pir_sensor_01").await.unwrap().unwrap();
    assert_eq!(device.kind, DeviceKind::Motion);
    let history = sink.recent_readings("pir_sensor_01", 10).await.unwrap();
    let occupied: Vec<bool> = history.iter().map(|r| r.motion_detected).collect();
    assert_eq!(occupied, vec![false, true]);
}

// ---------------------------------------------------------------------------
// Commands and shutdown
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn should_apply_command_and_switch_outputs_off_on_shutdown() {
    let bus = InProcessEventBus::new(64);
    let mut events = bus.subscribe();
    let (inbox, commands) = command_channel(8);

    let outputs = Arc::new(MockActuators::new());
    let settings = ControlSettings {
        temperature_threshold_celsius: 30.0,
        ..ControlSettings::default()
    };
    let control = ControlLoop::new(
        SimulatedClimateSensor::seeded(11),
        ScriptedPir::default(),
        controller(&outputs, &settings),
        bus.clone(),
        settings,
    )
    .with_commands(commands);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(control.run(shutdown_rx));

    assert!(inbox.deliver(r#"{"cmd": "Fan On"}"#).is_some());
    let state = loop {
        let payload = events.recv().await.unwrap();
        if payload.kind() == "hardware_state" {
            break serde_json::to_value(&payload).unwrap();
        }
    };
    assert_eq!(state["device_uid"], "hardware_controller");
    assert_eq!(state["state"]["fan_on"], true);
    assert_eq!(state["state"]["manual_override"], true);
    assert!(outputs.levels().fan);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap();

    let levels = outputs.levels();
    assert!(!levels.fan);
    assert!(!levels.buzzer);
    assert!(!levels.led);
    assert!(levels.released);
}

#[tokio::test(start_paused = true)]
async fn should_ignore_malformed_commands() {
    let (inbox, mut commands) = command_channel(8);

    assert!(inbox.deliver("not json").is_none());
    assert!(inbox.deliver(r#"{"cmd": "warp_drive"}"#).is_none());
    assert!(inbox.deliver(r#"{"kind": "reading"}"#).is_none());
    assert!(inbox.deliver(r#"{"cmd": "auto_on"}"#).is_some());

    drop(inbox);
    let mut queued = Vec::new();
    while let Some(command) = commands.recv().await {
        queued.push(command.name());
    }
    assert_eq!(queued, vec!["auto_on"]);
}
