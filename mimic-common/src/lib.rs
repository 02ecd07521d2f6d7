//! Common types and utilities shared across Mimic crates.
//!
//! This crate defines the humanization configuration model, observability
//! helpers, and shared error types used throughout the Mimic workspace. It is
//! intentionally lightweight so that the engine, the loader and the binaries
//! can all depend on it without heavy transitive costs.
//!
//! # Overview
//!
//! - [`HumanizeConfig`]: ranges and probabilities consumed by the engine
//! - [`Span`]: inclusive `min..=max` range used by every configured range
//! - [`Viewport`]: screen size used to derive the default cursor position
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`MimicError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! Constructing a configuration and repairing an inverted range:
//!
//! ```rust
//! use mimic_common::{HumanizeConfig, Span};
//!
//! let mut cfg = HumanizeConfig::default();
//! cfg.typing_wpm = Span::new(90, 30);
//! let cfg = cfg.normalized();
//! assert_eq!(cfg.typing_wpm, Span::new(30, 90));
//! ```
use serde::{Deserialize, Serialize};
use tracing::warn;

pub mod observability;

/// Inclusive range of values, written as `{ min, max }` in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Span<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Both bounds set to the same value.
    pub const fn fixed(value: T) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Return the span with `min <= max`, swapping the bounds if needed.
    pub fn normalized(self) -> Self {
        if self.is_inverted() {
            Self {
                min: self.max,
                max: self.min,
            }
        } else {
            self
        }
    }

    pub fn is_inverted(&self) -> bool {
        self.min > self.max
    }
}

impl Span<f64> {
    /// Clamp both bounds to at least `floor` and order them.
    pub fn floored(self, floor: f64) -> Self {
        Self {
            min: self.min.max(floor),
            max: self.max.max(floor),
        }
        .normalized()
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

impl Span<u32> {
    /// Clamp both bounds to at least `floor` and order them.
    pub fn floored(self, floor: u32) -> Self {
        Self {
            min: self.min.max(floor),
            max: self.max.max(floor),
        }
        .normalized()
    }

    /// Integer midpoint, rounded down.
    pub fn midpoint(&self) -> u32 {
        self.min / 2 + self.max / 2 + (self.min % 2 + self.max % 2) / 2
    }
}

/// Screen size of the automated session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl Viewport {
    /// Centre of the viewport, the assumed cursor position before any movement.
    pub fn center(&self) -> (f64, f64) {
        (f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

/// Humanization parameters shared read-only by every generator.
///
/// Every field has a default, so partial YAML sections are accepted. Call
/// [`HumanizeConfig::normalized`] before handing the value to the engine;
/// the engine does this itself on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanizeConfig {
    /// Pointer speed multiplier; higher values mean fewer path points.
    pub mouse_speed: Span<f64>,
    /// Probability (0.0–1.0) that a pointer move aims past its target.
    pub overshoot_chance: f64,
    /// Overshoot length as a fraction of the move distance.
    pub overshoot_distance: Span<f64>,
    /// Curve arc amplitude as a fraction of the segment length.
    pub control_point_offset: Span<f64>,
    /// Fraction of the arc amplitude applied to each control point.
    pub control_point_spread: Span<f64>,
    /// Typing speed in words per minute.
    pub typing_wpm: Span<u32>,
    /// Probability (0.0–1.0) of a typo on any non-final character.
    pub typo_probability: f64,
    /// Scroll chunk size in pixels.
    pub scroll_chunk: Span<u32>,
    /// Base delay in seconds used when callers omit sleep parameters.
    pub base_delay: Span<f64>,
    pub viewport: Viewport,
}

impl Default for HumanizeConfig {
    fn default() -> Self {
        Self {
            mouse_speed: Span::new(0.5, 1.5),
            overshoot_chance: 0.3,
            overshoot_distance: Span::new(0.05, 0.15),
            control_point_offset: Span::new(0.05, 0.25),
            control_point_spread: Span::new(0.3, 0.7),
            typing_wpm: Span::new(40, 80),
            typo_probability: 0.02,
            scroll_chunk: Span::new(50, 200),
            base_delay: Span::new(0.1, 0.5),
            viewport: Viewport::default(),
        }
    }
}

/// Lowest accepted pointer speed multiplier.
pub const MIN_MOUSE_SPEED: f64 = 0.05;

impl HumanizeConfig {
    /// Repair out-of-range values instead of rejecting them.
    ///
    /// Negative values clamp to zero, inverted ranges are swapped,
    /// probabilities clamp to `[0, 1]`, WPM and chunk sizes floor at 1.
    /// Every adjustment is reported at `warn` level.
    pub fn normalized(self) -> Self {
        Self {
            mouse_speed: repair_span("mouse_speed", self.mouse_speed, MIN_MOUSE_SPEED),
            overshoot_chance: repair_probability("overshoot_chance", self.overshoot_chance),
            overshoot_distance: repair_span("overshoot_distance", self.overshoot_distance, 0.0),
            control_point_offset: repair_span(
                "control_point_offset",
                self.control_point_offset,
                0.0,
            ),
            control_point_spread: repair_span(
                "control_point_spread",
                self.control_point_spread,
                0.0,
            ),
            typing_wpm: repair_count_span("typing_wpm", self.typing_wpm),
            typo_probability: repair_probability("typo_probability", self.typo_probability),
            scroll_chunk: repair_count_span("scroll_chunk", self.scroll_chunk),
            base_delay: repair_span("base_delay", self.base_delay, 0.0),
            viewport: self.viewport,
        }
    }
}

/// Clamp a probability into `[0, 1]`; NaN becomes 0.
pub fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

fn repair_probability(field: &'static str, value: f64) -> f64 {
    let fixed = clamp_probability(value);
    if fixed != value {
        warn!(target: "mimic.config", field, value, fixed, "probability clamped");
    }
    fixed
}

fn repair_span(field: &'static str, span: Span<f64>, floor: f64) -> Span<f64> {
    let sanitize = |v: f64| if v.is_finite() { v } else { floor };
    let fixed = Span::new(sanitize(span.min), sanitize(span.max)).floored(floor);
    if fixed != span {
        warn!(
            target: "mimic.config",
            field,
            inverted = span.is_inverted(),
            min = span.min,
            max = span.max,
            fixed_min = fixed.min,
            fixed_max = fixed.max,
            "range adjusted"
        );
    }
    fixed
}

fn repair_count_span(field: &'static str, span: Span<u32>) -> Span<u32> {
    let fixed = span.floored(1);
    if fixed != span {
        warn!(
            target: "mimic.config",
            field,
            inverted = span.is_inverted(),
            min = span.min,
            max = span.max,
            fixed_min = fixed.min,
            fixed_max = fixed.max,
            "range adjusted"
        );
    }
    fixed
}

/// Error types used across the Mimic system.
#[derive(thiserror::Error, Debug)]
pub enum MimicError {
    /// A sleep or replay was interrupted by the caller's cancellation signal.
    #[error("Operation cancelled")]
    Cancelled,

    /// The execution substrate (browser, device, etc.) reported an error.
    #[error("Sink error: {0}")]
    Sink(#[from] anyhow::Error),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MimicError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Convenient alias for results that use [`MimicError`].
pub type Result<T> = std::result::Result<T, MimicError>;
