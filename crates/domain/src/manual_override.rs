//! Manual override — a time-boxed window in which operator commands win
//! over the automatic fan policy.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualOverride {
    active: bool,
    set_at: Option<Instant>,
    timeout: Duration,
}

impl ManualOverride {
    /// An inactive override that lasts `timeout` once engaged.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            active: false,
            set_at: None,
            timeout,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn set_at(&self) -> Option<Instant> {
        self.set_at
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start (or restart) the window at `now`.
    pub fn engage(&mut self, now: Instant) {
        self.active = true;
        self.set_at = Some(now);
    }

    /// End the window immediately.
    pub fn clear(&mut self) {
        self.active = false;
    }

    /// Deactivate once `now - set_at > timeout`.
    ///
    /// Returns `true` only on the call that performs the expiry.
    pub fn expire_if_elapsed(&mut self, now: Instant) -> bool {
        if !self.active {
            return false;
        }
        let elapsed = self
            .set_at
            .map_or(Duration::MAX, |at| now.saturating_duration_since(at));
        if elapsed > self.timeout {
            self.active = false;
            return true;
        }
        false
    }
}
