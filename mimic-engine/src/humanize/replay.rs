//! Executing generated sequences against an input backend.
//!
//! The engine never touches a real device. Callers implement [`InputSink`]
//! for their backend and drive it through a [`Replayer`], which keeps the
//! cursor position and routes every delay through the engine's timing service.

use super::behavioral::BehavioralEngine;
use super::types::{KeyAction, Point, ScrollDirection};
use async_trait::async_trait;
use mimic_common::{MimicError, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Gap between consecutive pointer moves, in seconds.
const POINTER_STEP_SECS: (f64, f64) = (0.008, 0.014);
/// Hesitation before pressing the button, as `(base, variance)` seconds.
const PRE_CLICK_SECS: (f64, f64) = (0.1, 0.2);

/// Low-level input events a backend must be able to dispatch.
#[async_trait]
pub trait InputSink: Send {
    async fn pointer_move(&mut self, to: Point) -> anyhow::Result<()>;

    async fn click(&mut self, at: Point) -> anyhow::Result<()>;

    async fn key(&mut self, character: char) -> anyhow::Result<()>;

    async fn backspace(&mut self) -> anyhow::Result<()>;

    /// Positive deltas scroll down the page.
    async fn scroll_by(&mut self, delta: i32) -> anyhow::Result<()>;
}

/// Replays engine output on an [`InputSink`].
///
/// A cancelled token stops the whole sequence with [`MimicError::Cancelled`];
/// sink failures abort with [`MimicError::Sink`].
pub struct Replayer<S> {
    engine: Arc<BehavioralEngine>,
    sink: S,
    cursor: Point,
    cancel: CancellationToken,
}

impl<S: InputSink> Replayer<S> {
    /// The cursor starts at the engine's viewport centre.
    pub fn new(engine: Arc<BehavioralEngine>, sink: S, cancel: CancellationToken) -> Self {
        let cursor = engine.start_position();
        Self {
            engine,
            sink,
            cursor,
            cancel,
        }
    }

    /// Last position the pointer was moved to.
    pub fn cursor(&self) -> Point {
        self.cursor
    }

    /// Override the tracked position, e.g. after the backend reports one.
    pub fn set_cursor(&mut self, at: Point) {
        self.cursor = at;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Move along a generated path from the tracked cursor to `target`.
    pub async fn move_to(&mut self, target: Point, allow_overshoot: bool) -> Result<()> {
        let path = self.engine.generate_path(self.cursor, target, allow_overshoot);
        debug!(
            target: "mimic.replay",
            from = %self.cursor,
            to = %target,
            points = path.len(),
            "moving pointer"
        );

        let (min, max) = POINTER_STEP_SECS;
        for (i, point) in path.iter().enumerate() {
            self.checkpoint()?;
            self.sink.pointer_move(*point).await?;
            self.cursor = *point;
            if i + 1 < path.len() {
                self.engine.timing().sleep_range(min, max, &self.cancel).await?;
            }
        }
        Ok(())
    }

    /// Move to `target`, hesitate briefly, then click.
    pub async fn click_at(&mut self, target: Point) -> Result<()> {
        self.move_to(target, true).await?;
        let (base, variance) = PRE_CLICK_SECS;
        self.engine.timing().sleep(base, variance, &self.cancel).await?;
        self.checkpoint()?;
        self.sink.click(self.cursor).await?;
        Ok(())
    }

    /// Type `text` with the configured cadence.
    pub async fn type_text(&mut self, text: &str) -> Result<()> {
        let actions = self.engine.generate_typing(text, None, None);
        self.replay_keys(&actions).await
    }

    /// Replay an already generated key sequence.
    pub async fn replay_keys(&mut self, actions: &[KeyAction]) -> Result<()> {
        for action in actions {
            self.checkpoint()?;
            match *action {
                KeyAction::Key { .. } if action.is_backspace() => self.sink.backspace().await?,
                KeyAction::Key { character, .. } => self.sink.key(character).await?,
                KeyAction::Pause { .. } => {}
            }
            self.engine
                .timing()
                .sleep_for(action.delay(), &self.cancel)
                .await?;
        }
        Ok(())
    }

    /// Scroll `distance` pixels in human-like chunks.
    pub async fn scroll(&mut self, direction: ScrollDirection, distance: i64) -> Result<()> {
        let actions = self.engine.generate_scroll(direction, distance, None);
        for action in actions {
            self.checkpoint()?;
            if !action.is_pause() {
                self.sink.scroll_by(action.distance).await?;
            }
            self.engine
                .timing()
                .sleep_for(action.delay, &self.cancel)
                .await?;
        }
        Ok(())
    }

    fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(MimicError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Sink that only logs what it would dispatch.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TracingSink {
    pub moves: usize,
    pub clicks: usize,
    pub keys: usize,
    pub backspaces: usize,
    pub scrolled: i64,
}

#[async_trait]
impl InputSink for TracingSink {
    async fn pointer_move(&mut self, to: Point) -> anyhow::Result<()> {
        self.moves += 1;
        tracing::trace!(target: "mimic.sink", %to, "pointer move");
        Ok(())
    }

    async fn click(&mut self, at: Point) -> anyhow::Result<()> {
        self.clicks += 1;
        info!(target: "mimic.sink", %at, "click");
        Ok(())
    }

    async fn key(&mut self, character: char) -> anyhow::Result<()> {
        self.keys += 1;
        debug!(target: "mimic.sink", ?character, "key");
        Ok(())
    }

    async fn backspace(&mut self) -> anyhow::Result<()> {
        self.backspaces += 1;
        debug!(target: "mimic.sink", "backspace");
        Ok(())
    }

    async fn scroll_by(&mut self, delta: i32) -> anyhow::Result<()> {
        self.scrolled += i64::from(delta);
        debug!(target: "mimic.sink", delta, "scroll");
        Ok(())
    }
}
