//! # thermotrack-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `ClimateSensor` / `MotionSensor` — polled inputs
//!   - `Actuators` — fan, buzzer and LED outputs
//!   - `EventPublisher` — fire-and-forget event delivery
//!   - `ReadingSink` — persistence of sensor records
//! - Own the shared actuator state behind a single lock ([`controller`])
//! - Run the polling cycle ([`control_loop`])
//! - Validate and queue inbound commands ([`command_inbox`])
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//! - Map published events onto persisted records ([`services`])
//!
//! ## Dependency rule
//! Depends on `thermotrack-domain` only (plus `tokio` for channels, timers
//! and task spawning). Never imports adapter crates.

pub mod command_inbox;
pub mod control_loop;
pub mod controller;
pub mod event_bus;
pub mod ports;
pub mod services;
