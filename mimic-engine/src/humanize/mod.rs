//! Humanization engine: synthetic pointer, keyboard, scroll and timing input.
//!
//! Each generator owns its own [`rng::RandomSource`] and is otherwise a pure
//! function of its arguments. [`behavioral::BehavioralEngine`] wires them to a
//! shared configuration; [`replay::Replayer`] executes the output.
pub mod behavioral;
pub mod cadence;
pub mod easing;
pub mod layout;
pub mod path;
pub mod replay;
pub mod rng;
pub mod scroll;
pub mod timing;
pub mod types;

pub use behavioral::BehavioralEngine;
pub use replay::{InputSink, Replayer, TracingSink};
pub use types::{KeyAction, Point, ScrollAction, ScrollDirection, BACKSPACE};
