//! Random climate readings.

use std::future::Future;
use std::ops::Range;
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use thermotrack_app::ports::ClimateSensor;
use thermotrack_domain::reading::{Reading, ReadingSource};

const TEMPERATURE_RANGE: Range<f64> = 20.0..26.0;
const HUMIDITY_RANGE: Range<f64> = 30.0..70.0;

/// Climate source drawing uniform values on every poll.
pub struct SimulatedClimateSensor {
    rng: Mutex<StdRng>,
}

impl SimulatedClimateSensor {
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic sequence, for tests and reproducible demos.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        tracing::warn!("using simulated climate sensor, readings are not real");
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl Default for SimulatedClimateSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl ClimateSensor for SimulatedClimateSensor {
    fn poll(&self) -> impl Future<Output = Reading> + Send {
        let (temperature, humidity) = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            (
                rng.gen_range(TEMPERATURE_RANGE),
                rng.gen_range(HUMIDITY_RANGE),
            )
        };
        async move { Reading::new(temperature, humidity, ReadingSource::Simulated) }
    }
}
