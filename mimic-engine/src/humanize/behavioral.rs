use super::cadence::CadenceGenerator;
use super::path::PathGenerator;
use super::rng::RandomSource;
use super::scroll::{ScrollGenerator, MAX_SCROLL_DISTANCE};
use super::timing::TimingService;
use super::types::{KeyAction, Point, ScrollAction, ScrollDirection};
use mimic_common::{HumanizeConfig, Result, Span};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Produces human‑like pointer paths, typing, scrolling and delays.
///
/// Holds one normalized [`HumanizeConfig`] and the four generators built from
/// it. Per-call parameters left as `None` fall back to the configuration.
/// The engine is `Send + Sync`; share it behind an `Arc`.
#[derive(Debug)]
pub struct BehavioralEngine {
    config: Arc<HumanizeConfig>,
    path: PathGenerator,
    cadence: CadenceGenerator,
    scroll: ScrollGenerator,
    timing: TimingService,
}

impl Default for BehavioralEngine {
    fn default() -> Self {
        Self::new(HumanizeConfig::default())
    }
}

impl BehavioralEngine {
    /// Build an engine whose generators are seeded from OS entropy.
    pub fn new(config: HumanizeConfig) -> Self {
        Self::assemble(
            config,
            [
                RandomSource::from_entropy(),
                RandomSource::from_entropy(),
                RandomSource::from_entropy(),
                RandomSource::from_entropy(),
            ],
        )
    }

    /// Build a reproducible engine; every generator gets its own seed derived
    /// from `seed`.
    pub fn with_seed(config: HumanizeConfig, seed: u64) -> Self {
        Self::assemble(
            config,
            std::array::from_fn(|i| RandomSource::seeded(seed.wrapping_add(i as u64))),
        )
    }

    fn assemble(config: HumanizeConfig, sources: [RandomSource; 4]) -> Self {
        let config = Arc::new(config.normalized());
        let [path_rng, cadence_rng, scroll_rng, timing_rng] = sources;
        debug!(target: "mimic.engine", ?config, "behavioral engine ready");
        Self {
            path: PathGenerator::new(config.clone(), path_rng),
            cadence: CadenceGenerator::new(cadence_rng),
            scroll: ScrollGenerator::new(scroll_rng),
            timing: TimingService::new(timing_rng),
            config,
        }
    }

    pub fn config(&self) -> &HumanizeConfig {
        &self.config
    }

    /// Assumed cursor position before the first move: the viewport centre.
    pub fn start_position(&self) -> Point {
        self.config.viewport.center().into()
    }

    pub fn path(&self) -> &PathGenerator {
        &self.path
    }

    pub fn cadence(&self) -> &CadenceGenerator {
        &self.cadence
    }

    pub fn scroll(&self) -> &ScrollGenerator {
        &self.scroll
    }

    pub fn timing(&self) -> &TimingService {
        &self.timing
    }

    /// Pointer path from `start` to `end`; see [`PathGenerator::generate`].
    pub fn generate_path(&self, start: Point, end: Point, allow_overshoot: bool) -> Vec<Point> {
        let points = self.path.generate(start, end, allow_overshoot);
        debug!(target: "mimic.engine", points = points.len(), "path requested");
        points
    }

    /// Typing sequence for `text`, defaulting to the configured WPM range and
    /// typo probability.
    pub fn generate_typing(
        &self,
        text: &str,
        wpm: Option<Span<u32>>,
        typo_probability: Option<f64>,
    ) -> Vec<KeyAction> {
        let wpm = wpm.unwrap_or(self.config.typing_wpm);
        let typo_probability = typo_probability.unwrap_or(self.config.typo_probability);
        let actions = self.cadence.generate(text, wpm, typo_probability);
        debug!(target: "mimic.engine", actions = actions.len(), "typing requested");
        actions
    }

    /// Chunked scroll sequence. Negative distances are treated as their
    /// absolute value; the direction alone decides the sign.
    pub fn generate_scroll(
        &self,
        direction: ScrollDirection,
        distance: i64,
        chunk: Option<Span<u32>>,
    ) -> Vec<ScrollAction> {
        let chunk = chunk.unwrap_or(self.config.scroll_chunk);
        let actions = self
            .scroll
            .generate(direction, scroll_distance(distance), chunk);
        debug!(target: "mimic.engine", actions = actions.len(), "scroll requested");
        actions
    }

    /// Smooth scroll sequence; see [`ScrollGenerator::generate_smooth`].
    pub fn generate_smooth_scroll(
        &self,
        direction: ScrollDirection,
        distance: i64,
    ) -> Vec<ScrollAction> {
        self.scroll
            .generate_smooth(direction, scroll_distance(distance))
    }

    /// Sleep `base ± variance` seconds.
    ///
    /// Defaults: `base` is the configured minimum base delay and `variance`
    /// the width of the configured base delay range.
    pub async fn sleep(
        &self,
        base_secs: Option<f64>,
        variance_secs: Option<f64>,
        cancel: &CancellationToken,
    ) -> Result<Duration> {
        let span = self.config.base_delay;
        let base = base_secs.unwrap_or(span.min);
        let variance = variance_secs.unwrap_or(span.max - span.min);
        self.timing.sleep(base, variance, cancel).await
    }

    /// Sleep a uniform duration between `min` and `max` seconds, defaulting to
    /// the configured base delay range.
    pub async fn sleep_range(
        &self,
        min_secs: Option<f64>,
        max_secs: Option<f64>,
        cancel: &CancellationToken,
    ) -> Result<Duration> {
        let span = self.config.base_delay;
        self.timing
            .sleep_range(min_secs.unwrap_or(span.min), max_secs.unwrap_or(span.max), cancel)
            .await
    }
}

fn scroll_distance(distance: i64) -> u32 {
    distance.unsigned_abs().min(u64::from(MAX_SCROLL_DISTANCE)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BehavioralEngine>();
    }

    #[test]
    fn construction_normalizes_config() {
        let engine = BehavioralEngine::new(HumanizeConfig {
            typo_probability: 4.0,
            typing_wpm: Span::new(90, 10),
            ..HumanizeConfig::default()
        });
        assert_eq!(engine.config().typo_probability, 1.0);
        assert_eq!(engine.config().typing_wpm, Span::new(10, 90));
    }

    #[test]
    fn seeded_engines_repeat() {
        let a = BehavioralEngine::with_seed(HumanizeConfig::default(), 9);
        let b = BehavioralEngine::with_seed(HumanizeConfig::default(), 9);
        let from = Point::new(10.0, 10.0);
        let to = Point::new(640.0, 480.0);
        assert_eq!(a.generate_path(from, to, true), b.generate_path(from, to, true));
        assert_eq!(
            a.generate_typing("same", None, None),
            b.generate_typing("same", None, None)
        );
    }

    #[test]
    fn typing_defaults_come_from_config() {
        let engine = BehavioralEngine::with_seed(
            HumanizeConfig {
                typo_probability: 1.0,
                ..HumanizeConfig::default()
            },
            1,
        );
        // Configured: every non-final char mistyped.
        assert_eq!(engine.generate_typing("abc", None, None).len(), 9);
        // Override per call.
        assert_eq!(engine.generate_typing("abc", None, Some(0.0)).len(), 3);
    }

    #[test]
    fn negative_scroll_distance_is_absolute() {
        let engine = BehavioralEngine::with_seed(HumanizeConfig::default(), 2);
        let actions = engine.generate_scroll(ScrollDirection::Forward, -600, None);
        let sum: i64 = actions.iter().map(|a| i64::from(a.distance)).sum();
        assert_eq!(sum, 600);
    }

    #[test]
    fn oversized_scroll_is_capped() {
        assert_eq!(scroll_distance(i64::MIN), MAX_SCROLL_DISTANCE);
        assert_eq!(scroll_distance(-5), 5);
    }

    #[test]
    fn start_position_is_viewport_center() {
        let engine = BehavioralEngine::default();
        assert_eq!(engine.start_position(), Point::new(960.0, 540.0));
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_defaults_to_base_delay_range() {
        let engine = BehavioralEngine::with_seed(
            HumanizeConfig {
                base_delay: Span::new(0.2, 0.3),
                ..HumanizeConfig::default()
            },
            3,
        );
        let cancel = CancellationToken::new();
        for _ in 0..20 {
            // base 0.2 ± 0.1
            let slept = engine.sleep(None, None, &cancel).await.unwrap();
            assert!(slept >= Duration::from_millis(100));
            assert!(slept <= Duration::from_millis(301));

            let slept = engine.sleep_range(None, None, &cancel).await.unwrap();
            assert!(slept >= Duration::from_millis(200));
            assert!(slept <= Duration::from_millis(301));
        }
    }
}
