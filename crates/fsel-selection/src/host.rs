#![forbid(unsafe_code)]

//! Contracts the controller consumes from its embedder.
//!
//! All methods take `&self`; implementations needing state use interior
//! mutability. Every hook is optional: a controller without a policy allows
//! everything and one without observers notifies nobody.

use fsel_core::{EditingStyle, NodeId, Position, Rect};

use crate::selection::Selection;

/// Source of truth for window activation and keyboard focus.
pub trait FocusController {
    /// Whether the window hosting the document is active.
    fn is_active(&self) -> bool;

    /// Move keyboard focus to `node`, or clear it with `None`.
    fn set_focused_node(&self, node: Option<NodeId>);
}

/// Embedder veto points.
pub trait EditingPolicy {
    /// Whether `old` may be replaced by `candidate`.
    fn should_change_selection(&self, _old: &Selection, _candidate: &Selection) -> bool {
        true
    }

    /// Whether the content of `selection` may be deleted.
    fn should_delete_selection(&self, _selection: &Selection) -> bool {
        true
    }

    /// Fire the `selectstart` event at `target`. `false` cancels.
    fn dispatch_select_start(&self, _target: Option<Position>) -> bool {
        true
    }
}

/// A committed selection change.
#[derive(Debug, Clone, Copy)]
pub struct SelectionChange<'a> {
    pub old: &'a Selection,
    pub new: &'a Selection,
    pub user_triggered: bool,
    pub spell_correction_triggered: bool,
}

/// Fire-and-forget notifications.
pub trait SelectionObserver {
    fn selection_did_change(&self, _change: &SelectionChange<'_>) {}

    /// Accessibility tree update for the new selection.
    fn accessibility_selection_changed(&self, _selection: &Selection) {}

    /// `rect` needs repainting because the caret moved, blinked, or
    /// disappeared.
    fn caret_rect_invalidated(&self, _rect: Rect) {}

    fn typing_style_changed(&self, _style: Option<&EditingStyle>) {}

    /// The open typing command should be closed.
    fn typing_closed(&self) {}
}
