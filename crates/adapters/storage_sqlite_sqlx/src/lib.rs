//! # thermotrack-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `ReadingSink` port defined in `thermotrack-app::ports`
//! - Register unknown devices on their first record and keep `last_seen_at`
//!   current
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//!
//! ## Dependency rule
//! Depends on `thermotrack-app` (for port traits) and `thermotrack-domain`
//! (for domain types). The `app` and `domain` crates must never reference
//! this adapter.

mod error;
mod pool;
mod reading_sink;

pub use error::StorageError;
pub use pool::{Config, Database};
pub use reading_sink::SqliteReadingSink;
