//! Reproducible random streams for fixture generation.
//!
//! One seed per suite run. Scenarios either share a [`SharedRng`] (draws are
//! serialised through a mutex) or take their own ChaCha stream via
//! [`OracleRng::fork`], which depends only on the base seed and a stream id.

use std::sync::{Arc, Mutex, PoisonError};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::OracleConfig;

/// Suite seed used when none is configured.
pub const DEFAULT_SEED: u64 = ticktock_oracle_config::DEFAULT_SEED;

/// Seeded ChaCha8 stream. Identical seeds give identical draws on every platform.
#[derive(Debug, Clone)]
pub struct OracleRng {
    seed: u64,
    stream: u64,
    inner: ChaCha8Rng,
}

impl OracleRng {
    /// Stream 0 of `seed`.
    pub fn new(seed: u64) -> Self {
        Self::on_stream(seed, 0)
    }

    fn on_stream(seed: u64, stream: u64) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(seed);
        inner.set_stream(stream);
        Self {
            seed,
            stream,
            inner,
        }
    }

    /// Stream 0 of the `[suite] seed` setting.
    pub fn from_config(config: &OracleConfig) -> Self {
        Self::new(config.suite.seed)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stream(&self) -> u64 {
        self.stream
    }

    /// Uniform integer in `[low, high]`. Degenerate ranges yield `low`.
    pub fn range_inclusive(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        self.inner.gen_range(low..=high)
    }

    /// Uniform float in `[low, high)`.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.inner.r#gen::<f64>()
    }

    /// ChaCha stream `stream` of the same seed, from its first draw.
    ///
    /// The result does not depend on how many values were drawn from `self`.
    /// `fork(0)` replays the base stream.
    pub fn fork(&self, stream: u64) -> Self {
        Self::on_stream(self.seed, stream)
    }
}

/// A stream shared by concurrent scenario runners.
#[derive(Debug, Clone)]
pub struct SharedRng {
    inner: Arc<Mutex<OracleRng>>,
}

impl SharedRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(OracleRng::new(seed))),
        }
    }

    /// Runs `f` with exclusive access to the stream.
    ///
    /// A poisoned lock is recovered; the stream state stays usable.
    pub fn with<T>(&self, f: impl FnOnce(&mut OracleRng) -> T) -> T {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn fork(&self, stream: u64) -> OracleRng {
        self.with(|rng| rng.fork(stream))
    }
}

impl From<OracleRng> for SharedRng {
    fn from(rng: OracleRng) -> Self {
        Self {
            inner: Arc::new(Mutex::new(rng)),
        }
    }
}
