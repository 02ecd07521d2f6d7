use mimic_common::Span;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Largest fractional offset added to a delay, in seconds (0.1 ms).
const MAX_FRACTIONAL_OFFSET_SECS: f64 = 0.0001;

/// Random source owned by a single generator.
///
/// The generator is guarded by a mutex so a generator can be shared across
/// tasks; each instance is seeded once and never re-seeded.
pub struct RandomSource {
    rng: Mutex<StdRng>,
}

impl fmt::Debug for RandomSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomSource").finish_non_exhaustive()
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource {
    /// Seed from the operating system so independent instances diverge.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Fixed seed, for reproducible sequences in tests and previews.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Uniform in `[0, 1)`.
    pub fn unit(&self) -> f64 {
        self.lock().gen::<f64>()
    }

    /// Uniform in `[min, max)`; bounds may be given in either order.
    pub fn uniform(&self, min: f64, max: f64) -> f64 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        lo + self.unit() * (hi - lo)
    }

    pub fn span(&self, span: Span<f64>) -> f64 {
        self.uniform(span.min, span.max)
    }

    /// Uniform integer in `min..=max`; bounds may be given in either order.
    pub fn int_inclusive(&self, min: u32, max: u32) -> u32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.lock().gen_range(lo..=hi)
    }

    /// Bernoulli trial. `p <= 0` never succeeds, `p >= 1` always does.
    pub fn chance(&self, p: f64) -> bool {
        self.unit() < p
    }

    /// Standard normal sample via the Box–Muller transform.
    pub fn standard_normal(&self) -> f64 {
        let (u1, u2) = {
            let mut rng = self.lock();
            // 1 - [0, 1) keeps ln() away from zero.
            (1.0 - rng.gen::<f64>(), rng.gen::<f64>())
        };
        (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
    }

    pub fn choose<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.lock().gen_range(0..items.len());
        items.get(idx)
    }

    /// Strictly positive offset below 0.1 ms, in seconds.
    ///
    /// Added to every delay so no duration lands on a whole millisecond.
    pub fn fractional_offset(&self) -> f64 {
        let offset = self.unit() * MAX_FRACTIONAL_OFFSET_SECS;
        if offset > 0.0 {
            offset
        } else {
            MAX_FRACTIONAL_OFFSET_SECS / 2.0
        }
    }
}
