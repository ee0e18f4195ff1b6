//! Port definitions — traits that adapters implement.
//!
//! Outputs are only ever driven through the
//! [`Controller`](crate::controller::Controller); everything else is called
//! from the control loop or a service.

pub mod actuator;
pub mod event_publisher;
pub mod reading_sink;
pub mod sensor;

pub use actuator::Actuators;
pub use event_publisher::EventPublisher;
pub use reading_sink::ReadingSink;
pub use sensor::{ClimateSensor, MotionSensor};
