//! Pointer trajectories along eased cubic Bézier curves.
//!
//! A move aims either at the target or, with the configured probability, a
//! little past it along the direction of travel. An overshoot is followed by a
//! short corrective curve back to the real target.

use super::easing::ease_in_out_cubic;
use super::rng::RandomSource;
use super::types::Point;
use mimic_common::HumanizeConfig;
use std::sync::Arc;
use tracing::trace;

/// Moves shorter than this produce a single point.
const MIN_DISTANCE_FOR_MOVEMENT: f64 = 1.0;
pub const MIN_STEPS: usize = 10;
pub const MAX_STEPS: usize = 100;
const STEP_DIVISOR: f64 = 10.0;
const CORRECTION_STEP_FACTOR: f64 = 0.2;
pub const MIN_CORRECTION_STEPS: usize = 5;

/// Generates human-like pointer paths.
#[derive(Debug)]
pub struct PathGenerator {
    config: Arc<HumanizeConfig>,
    rng: RandomSource,
}

impl PathGenerator {
    pub fn new(config: Arc<HumanizeConfig>, rng: RandomSource) -> Self {
        Self { config, rng }
    }

    /// Points to visit when moving from `start` to `end`.
    ///
    /// `start` itself is not emitted as a separate step; the last point is
    /// always exactly `end`.
    pub fn generate(&self, start: Point, end: Point, allow_overshoot: bool) -> Vec<Point> {
        let distance = start.distance_to(end);
        // Also catches NaN coordinates.
        if !(distance >= MIN_DISTANCE_FOR_MOVEMENT) {
            return vec![end];
        }

        let aim = self.aim_point(start, end, distance, allow_overshoot);
        let mut points = self.curve(start, aim, self.primary_steps(distance));

        let overshot = aim != end;
        if overshot {
            // Proportional to the whole move, not the short way back.
            let steps = correction_steps(distance);
            points.extend(self.curve(aim, end, steps));
        }

        if let Some(last) = points.last_mut() {
            *last = end;
        }

        trace!(
            target: "mimic.path",
            %start,
            %end,
            distance,
            overshot,
            points = points.len(),
            "generated pointer path"
        );
        points
    }

    /// Where the primary curve ends: `end`, or a point past it.
    fn aim_point(&self, start: Point, end: Point, distance: f64, allow_overshoot: bool) -> Point {
        if !allow_overshoot || !self.rng.chance(self.config.overshoot_chance) {
            return end;
        }
        let extra = distance * self.rng.span(self.config.overshoot_distance);
        let ux = (end.x - start.x) / distance;
        let uy = (end.y - start.y) / distance;
        Point::new(end.x + ux * extra, end.y + uy * extra)
    }

    fn primary_steps(&self, distance: f64) -> usize {
        let speed = self.rng.span(self.config.mouse_speed);
        let steps = (distance / (STEP_DIVISOR * speed)) as usize;
        steps.clamp(MIN_STEPS, MAX_STEPS)
    }

    fn curve(&self, from: Point, to: Point, steps: usize) -> Vec<Point> {
        let controls = self.control_points(from, to);
        sample_bezier(&controls, steps)
    }

    /// `[from, c1, c2, to]` with the inner points pushed off the straight
    /// line on opposite sides.
    fn control_points(&self, from: Point, to: Point) -> [Point; 4] {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let length = dx.hypot(dy);

        let (px, py) = if length > 0.0 {
            // Unit perpendicular scaled by the arc amplitude.
            let amplitude = self.rng.span(self.config.control_point_offset) * length;
            (-dy / length * amplitude, dx / length * amplitude)
        } else {
            (0.0, 0.0)
        };

        let spread1 = self.rng.span(self.config.control_point_spread);
        let spread2 = self.rng.span(self.config.control_point_spread);

        [
            from,
            Point::new(from.x + px * spread1, from.y + py * spread1),
            Point::new(to.x - px * spread2, to.y - py * spread2),
            to,
        ]
    }
}

fn correction_steps(original_distance: f64) -> usize {
    ((original_distance * CORRECTION_STEP_FACTOR) as usize).max(MIN_CORRECTION_STEPS)
}

/// `steps` points on the curve, parameter eased before evaluation.
fn sample_bezier(controls: &[Point; 4], steps: usize) -> Vec<Point> {
    let steps = steps.max(2);
    let last = (steps - 1) as f64;
    (0..steps)
        .map(|i| cubic_bezier(controls, ease_in_out_cubic(i as f64 / last)))
        .collect()
}

/// B(t) = (1-t)³P0 + 3(1-t)²tP1 + 3(1-t)t²P2 + t³P3
fn cubic_bezier([p0, p1, p2, p3]: &[Point; 4], t: f64) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}
