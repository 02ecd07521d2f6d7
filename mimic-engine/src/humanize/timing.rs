//! Randomized delays and cancellable sleeps.
//!
//! Every sampled duration carries a sub-millisecond fractional offset, so
//! no delay is ever a whole number of milliseconds.

use super::rng::RandomSource;
use mimic_common::{MimicError, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Shortest delay the jittered and Gaussian variants return, in seconds.
pub const MIN_DELAY_SECS: f64 = 0.001;

/// Produces human-plausible delays and sleeps for them.
#[derive(Debug)]
pub struct TimingService {
    rng: RandomSource,
}

impl TimingService {
    pub fn new(rng: RandomSource) -> Self {
        Self { rng }
    }

    /// Uniform duration between `min_secs` and `max_secs`.
    ///
    /// Negative bounds count as zero; inverted bounds are swapped.
    pub fn sample(&self, min_secs: f64, max_secs: f64) -> Duration {
        let secs = self.rng.uniform(non_negative(min_secs), non_negative(max_secs));
        self.finish(secs)
    }

    /// `base ± variance` seconds, floored at 1 ms.
    pub fn jittered(&self, base_secs: f64, variance_secs: f64) -> Duration {
        let variance = non_negative(variance_secs);
        let secs = non_negative(base_secs) + self.rng.uniform(-variance, variance);
        self.finish(secs.max(MIN_DELAY_SECS))
    }

    /// Normally distributed duration, floored at 1 ms.
    pub fn gaussian(&self, mean_secs: f64, std_dev_secs: f64) -> Duration {
        let spread = self.rng.standard_normal() * non_negative(std_dev_secs);
        let secs = non_negative(mean_secs) + spread;
        self.finish(secs.max(MIN_DELAY_SECS))
    }

    /// Uniform integer in `min..=max`, bounds in either order.
    pub fn uniform_int(&self, min: u32, max: u32) -> u32 {
        self.rng.int_inclusive(min, max)
    }

    /// Uniform float in `[min, max)`, bounds in either order.
    pub fn uniform_float(&self, min: f64, max: f64) -> f64 {
        self.rng.uniform(min, max)
    }

    /// Sleep for [`TimingService::jittered`]`(base, variance)`.
    pub async fn sleep(
        &self,
        base_secs: f64,
        variance_secs: f64,
        cancel: &CancellationToken,
    ) -> Result<Duration> {
        self.sleep_for(self.jittered(base_secs, variance_secs), cancel)
            .await
    }

    /// Sleep for [`TimingService::sample`]`(min, max)`.
    pub async fn sleep_range(
        &self,
        min_secs: f64,
        max_secs: f64,
        cancel: &CancellationToken,
    ) -> Result<Duration> {
        self.sleep_for(self.sample(min_secs, max_secs), cancel).await
    }

    /// Sleep for [`TimingService::gaussian`]`(mean, std_dev)`.
    pub async fn sleep_gaussian(
        &self,
        mean_secs: f64,
        std_dev_secs: f64,
        cancel: &CancellationToken,
    ) -> Result<Duration> {
        self.sleep_for(self.gaussian(mean_secs, std_dev_secs), cancel)
            .await
    }

    /// Sleep for exactly `duration` unless `cancel` fires first.
    ///
    /// Returns the slept duration, or [`MimicError::Cancelled`] immediately
    /// when the token is (or becomes) cancelled.
    pub async fn sleep_for(
        &self,
        duration: Duration,
        cancel: &CancellationToken,
    ) -> Result<Duration> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                trace!(target: "mimic.timing", ?duration, "sleep cancelled");
                Err(MimicError::Cancelled)
            }
            _ = tokio::time::sleep(duration) => Ok(duration),
        }
    }

    fn finish(&self, secs: f64) -> Duration {
        Duration::from_secs_f64(secs + self.rng.fractional_offset())
    }
}

fn non_negative(secs: f64) -> f64 {
    if secs.is_finite() {
        secs.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn timing() -> TimingService {
        TimingService::new(RandomSource::seeded(42))
    }

    #[test]
    fn sample_stays_in_range() {
        let timing = timing();
        for _ in 0..1000 {
            let secs = timing.sample(0.5, 0.2).as_secs_f64();
            assert!((0.2..0.5001).contains(&secs), "{secs}");
        }
    }

    #[test]
    fn jittered_is_floored_and_offset() {
        let timing = timing();
        for _ in 0..1000 {
            let d = timing.jittered(0.0, 0.5);
            assert!(d.as_secs_f64() >= MIN_DELAY_SECS);
            assert_ne!(d.subsec_nanos() % 1_000_000, 0);
        }
    }

    #[test]
    fn zero_variance_is_base_plus_offset() {
        let timing = timing();
        for _ in 0..100 {
            let secs = timing.jittered(0.25, 0.0).as_secs_f64();
            assert!(secs > 0.25 && secs < 0.2501, "{secs}");
        }
    }

    #[test]
    fn gaussian_mean_and_floor() {
        let timing = timing();
        let n = 5000;
        let mean = (0..n)
            .map(|_| timing.gaussian(0.4, 0.05).as_secs_f64())
            .sum::<f64>()
            / f64::from(n);
        assert!((mean - 0.4).abs() < 0.01, "{mean}");

        for _ in 0..500 {
            assert!(timing.gaussian(0.0, 1.0).as_secs_f64() >= MIN_DELAY_SECS);
        }
    }

    #[test]
    fn garbage_inputs_do_not_panic() {
        let timing = timing();
        assert!(timing.jittered(f64::NAN, f64::INFINITY).as_secs_f64() >= MIN_DELAY_SECS);
        assert!(timing.gaussian(-5.0, f64::NAN).as_secs_f64() >= MIN_DELAY_SECS);
        assert!(timing.sample(-1.0, -2.0).as_secs_f64() < 0.001);
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_waits_at_least_base() {
        let timing = timing();
        let cancel = CancellationToken::new();
        let started = Instant::now();
        let slept = timing.sleep(0.3, 0.0, &cancel).await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed <= Duration::from_millis(305));
        assert!(slept >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_sleep() {
        let timing = timing();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let outcome = timing.sleep(10.0, 0.0, &cancel).await;
        assert!(matches!(outcome, Err(MimicError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn already_cancelled_returns_immediately() {
        let timing = timing();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let started = std::time::Instant::now();
        let outcome = timing.sleep_range(5.0, 6.0, &cancel).await;
        assert!(outcome.unwrap_err().is_cancelled());
        assert!(started.elapsed() < Duration::from_millis(500));
    }
}
