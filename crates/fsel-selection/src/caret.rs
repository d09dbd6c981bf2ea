#![forbid(unsafe_code)]

//! Caret geometry, blink timing, and painting.
//!
//! The blinker is driven by explicit time deltas (`tick`) or wall-clock
//! polls (`poll`) on the same thread as the controller; there is no
//! background task to cancel, stopping it is enough.
//!
//! # Invariants
//!
//! 1. A stopped blinker is never painted.
//! 2. A suspended blinker never turns the caret off; it may turn it back on.
//! 3. `tick` toggles at most once per elapsed interval and keeps the
//!    remainder.

use std::time::Duration;

use fsel_core::{Affinity, LayoutProvider, NodeId, Position, Rect};
use web_time::Instant;

/// Cached caret geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaretState {
    pub(crate) local_rect: Rect,
    pub(crate) absolute_bounds: Rect,
    pub(crate) node: Option<NodeId>,
    pub(crate) last_painted_node: Option<NodeId>,
    pub(crate) dirty: bool,
}

impl Default for CaretState {
    fn default() -> Self {
        Self {
            local_rect: Rect::default(),
            absolute_bounds: Rect::default(),
            node: None,
            last_painted_node: None,
            dirty: true,
        }
    }
}

impl CaretState {
    /// Caret rect relative to the renderer of [`CaretState::node`].
    pub fn local_rect(&self) -> Rect {
        self.local_rect
    }

    /// Caret rect in document coordinates, as of the last recompute.
    pub fn absolute_bounds(&self) -> Rect {
        self.absolute_bounds
    }

    /// Node whose renderer hosts the caret.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Node the caret was last laid out in with a non-empty rect.
    pub fn last_painted_node(&self) -> Option<NodeId> {
        self.last_painted_node
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Forget everything, e.g. on teardown.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Blink phase state machine.
#[derive(Debug, Clone)]
pub struct CaretBlinker {
    interval: Option<Duration>,
    elapsed: Duration,
    active: bool,
    painted: bool,
    suspended: bool,
    last_poll: Option<Instant>,
}

impl CaretBlinker {
    /// `None` keeps the caret solid while active.
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
            active: false,
            painted: false,
            suspended: false,
            last_poll: None,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Option<Duration>) {
        self.interval = interval;
        self.elapsed = Duration::ZERO;
    }

    /// Start (or restart) with the caret shown for a full interval.
    pub fn restart(&mut self) {
        self.active = true;
        self.painted = true;
        self.elapsed = Duration::ZERO;
        self.last_poll = None;
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.painted = false;
        self.elapsed = Duration::ZERO;
        self.last_poll = None;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the caret is in its visible phase.
    pub fn is_painted(&self) -> bool {
        self.active && self.painted
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Pause blinking with the caret held on.
    pub fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
    }

    /// Advance by `dt`. Returns whether the painted phase changed.
    pub fn tick(&mut self, dt: Duration) -> bool {
        if !self.active {
            return false;
        }
        let Some(interval) = self.interval.filter(|i| !i.is_zero()) else {
            return false;
        };
        let before = self.painted;
        self.elapsed = self.elapsed.saturating_add(dt);
        while self.elapsed >= interval {
            self.elapsed -= interval;
            if self.suspended && self.painted {
                continue;
            }
            self.painted = !self.painted;
        }
        self.painted != before
    }

    /// Advance by the wall-clock time since the previous poll.
    ///
    /// The first poll after a (re)start only records the timestamp.
    pub fn poll(&mut self, now: Instant) -> bool {
        let dt = match self.last_poll {
            Some(prev) => now.saturating_duration_since(prev),
            None => Duration::ZERO,
        };
        self.last_poll = Some(now);
        self.tick(dt)
    }
}

/// Low-level painting primitive.
pub trait CaretCanvas {
    fn fill_rect(&mut self, rect: Rect);
}

/// Fill `bounds` clipped to `clip`; nothing when they do not overlap.
pub(crate) fn fill_clipped(canvas: &mut dyn CaretCanvas, bounds: Rect, clip: Rect) -> bool {
    match bounds.intersection_opt(&clip) {
        Some(rect) => {
            canvas.fill_rect(rect);
            true
        }
        None => false,
    }
}

/// The insertion indicator shown while dragging content over the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragCaret {
    position: Option<Position>,
    width: i32,
}

impl DragCaret {
    pub fn new(width: i32) -> Self {
        Self {
            position: None,
            width: width.max(1),
        }
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn set_position(&mut self, position: Option<Position>) {
        self.position = position;
    }

    pub fn clear(&mut self) {
        self.position = None;
    }

    pub fn is_active(&self) -> bool {
        self.position.is_some()
    }

    /// Absolute rect of the drag caret, if it resolves.
    pub fn bounds<L: LayoutProvider + ?Sized>(&self, layout: &L) -> Option<Rect> {
        let pos = self.position?;
        let mut local = layout.local_caret_rect(pos, Affinity::Downstream)?;
        local.width = self.width;
        Some(layout.absolute_transform(pos.node).map_rect(local))
    }

    /// Paint into `canvas`. Returns whether anything was drawn.
    pub fn paint<L: LayoutProvider + ?Sized>(
        &self,
        layout: &L,
        canvas: &mut dyn CaretCanvas,
        clip: Rect,
    ) -> bool {
        self.bounds(layout)
            .is_some_and(|bounds| fill_clipped(canvas, bounds, clip))
    }
}
