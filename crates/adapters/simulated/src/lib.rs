//! # thermotrack-adapter-simulated
//!
//! Simulated devices for running the controller without a board, for demos
//! and for tests.
//!
//! ## Provided devices
//!
//! | Device | Behaviour |
//! |--------|-----------|
//! | [`SimulatedClimateSensor`] | Uniform temperature in 20–26 °C, humidity in 30–70 % |
//! | [`SimulatedMotionSensor`] | Occasional HIGH bursts of a few samples |
//! | [`MockActuators`] | Logs every write and remembers output levels |
//!
//! Readings are tagged [`ReadingSource::Simulated`] and every device logs a
//! warning when constructed, so simulated data never passes for real data.
//!
//! ## Dependency rule
//!
//! Depends on `thermotrack-app` (port traits) and `thermotrack-domain` only.
//!
//! [`ReadingSource::Simulated`]: thermotrack_domain::reading::ReadingSource::Simulated

mod actuators;
mod climate;
mod motion;

pub use actuators::{MockActuators, OutputLevels};
pub use climate::SimulatedClimateSensor;
pub use motion::SimulatedMotionSensor;
