use std::sync::atomic::{AtomicU64, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;

/// Seed offset between consecutive generators to avoid correlated streams.
const STREAM_STRIDE: u64 = 57;

/// Hands out one independent random generator per consumer.
///
/// With a master seed every generator is reproducible: the n-th one is
/// seeded with `seed + n * 57`. Without a seed each is drawn from the OS.
#[derive(Debug)]
pub struct SeedSource {
    seed: Option<u64>,
    issued: AtomicU64,
}

impl SeedSource {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            seed,
            issued: AtomicU64::new(0),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    pub fn unseeded() -> Self {
        Self::new(None)
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns the next generator in the sequence.
    pub fn next_rng(&self) -> StdRng {
        let n = self.issued.fetch_add(1, Ordering::Relaxed);
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(n.wrapping_mul(STREAM_STRIDE))),
            None => StdRng::from_os_rng(),
        }
    }
}
