//! # thermotrack-domain
//!
//! Pure domain model for the thermotrack climate/motion controller.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Readings** (temperature/humidity snapshots, possibly partial)
//! - Define the **motion debounce** ([`motion::MotionTracker`]) that turns raw
//!   PIR levels into start/stop transitions
//! - Define **actuator state**, **presets** and the automatic fan rule
//! - Define the **manual override** window
//! - Define **event payloads** published on the pub/sub channel and the
//!   **commands** accepted from it
//! - Define the **persisted records** a downstream sink stores
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod actuator;
pub mod command;
pub mod device;
pub mod event;
pub mod manual_override;
pub mod motion;
pub mod reading;
