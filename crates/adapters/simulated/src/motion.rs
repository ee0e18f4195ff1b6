//! Random PIR bursts.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use thermotrack_app::ports::MotionSensor;

/// Chance that an idle sample starts a burst.
const BURST_PROBABILITY: f64 = 0.1;

struct BurstState {
    rng: StdRng,
    remaining_high: u32,
}

/// PIR stand-in that goes HIGH for a few consecutive samples now and then.
pub struct SimulatedMotionSensor {
    state: Mutex<BurstState>,
}

impl SimulatedMotionSensor {
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        tracing::warn!("using simulated PIR, motion events are not real");
        Self {
            state: Mutex::new(BurstState {
                rng,
                remaining_high: 0,
            }),
        }
    }
}

impl Default for SimulatedMotionSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionSensor for SimulatedMotionSensor {
    fn read_motion(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.remaining_high == 0 && state.rng.gen_bool(BURST_PROBABILITY) {
            state.remaining_high = state.rng.gen_range(2..=5);
        }
        if state.remaining_high > 0 {
            state.remaining_high -= 1;
            true
        } else {
            false
        }
    }
}
