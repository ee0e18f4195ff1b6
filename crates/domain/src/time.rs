//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for captured readings, event times and persisted rows.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Whole seconds since the Unix epoch, the `at` field of every event payload.
#[must_use]
pub fn epoch_seconds(ts: Timestamp) -> i64 {
    ts.timestamp()
}

/// Inverse of [`epoch_seconds`]; `None` when out of chrono's range.
#[must_use]
pub fn from_epoch_seconds(secs: i64) -> Option<Timestamp> {
    DateTime::from_timestamp(secs, 0)
}
