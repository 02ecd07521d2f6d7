//! Human-like synthetic input generation.
//!
//! This crate turns desired outcomes (move here, type this, scroll that far,
//! wait a bit) into time-ordered action sequences whose geometry and timing
//! look like a person at the controls.
//!
//! - [`humanize::behavioral::BehavioralEngine`]: configured entry point
//! - [`humanize::path::PathGenerator`]: eased Bézier pointer paths with overshoot
//! - [`humanize::cadence::CadenceGenerator`]: WPM-based typing with corrected typos
//! - [`humanize::scroll::ScrollGenerator`]: chunked and smooth scrolling
//! - [`humanize::timing::TimingService`]: jittered, cancellable delays
//! - [`humanize::replay`]: the [`InputSink`] boundary for executing sequences
//!
//! ```
//! use mimic_common::HumanizeConfig;
//! use mimic_engine::{BehavioralEngine, Point};
//!
//! let engine = BehavioralEngine::new(HumanizeConfig::default());
//! let path = engine.generate_path(Point::new(0.0, 0.0), Point::new(500.0, 300.0), true);
//! assert_eq!(path.last(), Some(&Point::new(500.0, 300.0)));
//! ```
pub mod humanize;

pub use humanize::{
    BehavioralEngine, InputSink, KeyAction, Point, Replayer, ScrollAction, ScrollDirection,
    TracingSink, BACKSPACE,
};
