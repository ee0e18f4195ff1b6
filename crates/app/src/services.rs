//! Application services that run next to the control loop.
//!
//! Services take their ports as generic parameters and are driven by the
//! in-process event bus.

pub mod persistence_service;
