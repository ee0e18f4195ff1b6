//! Motion debounce — turns raw PIR levels into start/stop transitions.
//!
//! The tracker owns the [`MotionState`]. A rising level starts occupancy
//! immediately. A falling level only stops it once the level has stayed
//! low for at least the cooldown, measured from the last HIGH sample. Every
//! other combination is absorbed without a transition.

use std::time::{Duration, Instant};

/// Current occupancy as seen by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionState {
    pub active: bool,
    pub last_transition_at: Option<Instant>,
}

/// An accepted edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionTransition {
    Started,
    Stopped,
}

impl MotionTransition {
    /// Value of the `occupied` field on the wire.
    #[must_use]
    pub fn occupied(self) -> u8 {
        match self {
            Self::Started => 1,
            Self::Stopped => 0,
        }
    }
}

/// Edge detector with a cooldown window.
#[derive(Debug, Clone)]
pub struct MotionTracker {
    state: MotionState,
    last_high_at: Option<Instant>,
    cooldown: Duration,
}

impl MotionTracker {
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: MotionState::default(),
            last_high_at: None,
            cooldown,
        }
    }

    #[must_use]
    pub fn state(&self) -> MotionState {
        self.state
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Feed one instantaneous level sampled at `now`.
    ///
    /// Returns the accepted transition, if any.
    pub fn observe(&mut self, level: bool, now: Instant) -> Option<MotionTransition> {
        if level {
            self.last_high_at = Some(now);
            if self.state.active {
                return None;
            }
            self.state = MotionState {
                active: true,
                last_transition_at: Some(now),
            };
            return Some(MotionTransition::Started);
        }

        if !self.state.active {
            return None;
        }

        let quiet_for = self
            .last_high_at
            .map_or(Duration::MAX, |at| now.saturating_duration_since(at));
        if quiet_for < self.cooldown {
            return None;
        }

        self.state = MotionState {
            active: false,
            last_transition_at: Some(now),
        };
        Some(MotionTransition::Stopped)
    }
}
