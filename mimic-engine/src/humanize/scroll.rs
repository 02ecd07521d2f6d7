//! Chunked scrolling with acceleration and deceleration.

use super::easing::ease_in_out_cubic;
use super::rng::RandomSource;
use super::types::{ScrollAction, ScrollDirection};
use mimic_common::Span;
use std::time::Duration;
use tracing::trace;

/// Largest distance a single request can cover; keeps deltas within `i32`.
pub const MAX_SCROLL_DISTANCE: u32 = i32::MAX as u32;
/// Upper bound on distance-bearing chunks per sequence; chunks grow instead.
pub const MAX_SCROLL_CHUNKS: u32 = 512;
/// Reading pause after the last chunk, in milliseconds.
const SETTLE_PAUSE_MS: Span<f64> = Span::new(200.0, 500.0);
const SMOOTH_STEPS: Span<u32> = Span::new(10, 20);
const SMOOTH_STEP_DELAY_MS: Span<f64> = Span::new(10.0, 30.0);

/// Generates scroll sequences.
#[derive(Debug)]
pub struct ScrollGenerator {
    rng: RandomSource,
}

impl ScrollGenerator {
    pub fn new(rng: RandomSource) -> Self {
        Self { rng }
    }

    /// Scroll `distance` pixels in bursts sized by `chunk`, smaller at both
    /// ends, then pause to read.
    ///
    /// The signed distances always add up to exactly `distance`. A zero
    /// distance yields an empty sequence, and no request produces more than
    /// [`MAX_SCROLL_CHUNKS`] chunks.
    pub fn generate(
        &self,
        direction: ScrollDirection,
        distance: u32,
        chunk: Span<u32>,
    ) -> Vec<ScrollAction> {
        let distance = distance.min(MAX_SCROLL_DISTANCE);
        if distance == 0 {
            return Vec::new();
        }
        let min_size = distance.div_ceil(MAX_SCROLL_CHUNKS);
        let chunk = chunk.floored(min_size);
        let sign = direction.sign();

        let planned = distance.div_ceil(chunk.midpoint()).clamp(1, MAX_SCROLL_CHUNKS) as usize;
        let mut actions = Vec::with_capacity(planned + 1);
        let mut remaining = distance;
        let mut index = 0usize;

        while remaining > 0 {
            let t = if planned == 1 {
                0.5
            } else {
                index as f64 / (planned - 1) as f64
            };
            let size_bias = ease_in_out_cubic(t);
            let nominal = f64::from(chunk.min) + size_bias * f64::from(chunk.max - chunk.min);
            let size = ((nominal * self.rng.uniform(0.7, 1.3)) as u32)
                .max(min_size)
                .min(remaining);
            remaining -= size;

            let edge = index == 0 || remaining == 0;
            actions.push(ScrollAction {
                distance: sign * size as i32,
                delay: self.chunk_delay(size, edge),
            });
            index += 1;
        }

        actions.push(ScrollAction {
            distance: 0,
            delay: self.millis(self.rng.span(SETTLE_PAUSE_MS)),
        });

        trace!(
            target: "mimic.scroll",
            ?direction,
            distance,
            chunks = actions.len() - 1,
            "generated scroll sequence"
        );
        actions
    }

    /// Scroll in 10–20 near-equal small steps with short gaps, no settle pause.
    pub fn generate_smooth(&self, direction: ScrollDirection, distance: u32) -> Vec<ScrollAction> {
        let distance = distance.min(MAX_SCROLL_DISTANCE);
        if distance == 0 {
            return Vec::new();
        }
        let sign = direction.sign();
        let steps = self
            .rng
            .int_inclusive(SMOOTH_STEPS.min, SMOOTH_STEPS.max)
            .min(distance);
        let (base, extra) = (distance / steps, distance % steps);

        (0..steps)
            .map(|i| {
                let size = base + u32::from(i < extra);
                ScrollAction {
                    distance: sign * size as i32,
                    delay: self.millis(self.rng.span(SMOOTH_STEP_DELAY_MS)),
                }
            })
            .collect()
    }

    /// `50 ms + 0.5 ms/px`, stretched at the edges, compressed in between.
    fn chunk_delay(&self, size: u32, edge: bool) -> Duration {
        let mut ms = 50.0 + f64::from(size) * 0.5;
        ms *= if edge {
            self.rng.uniform(1.5, 2.0)
        } else {
            self.rng.uniform(0.7, 1.0)
        };
        ms += self.rng.uniform(0.0, 20.0);
        self.millis(ms)
    }

    fn millis(&self, ms: f64) -> Duration {
        Duration::from_secs_f64(ms / 1000.0 + self.rng.fractional_offset())
    }
}
