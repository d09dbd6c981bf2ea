#![forbid(unsafe_code)]

//! The selection controller.
//!
//! [`SelectionController`] owns the current [`Selection`] for one document
//! and is the only thing that replaces it. Every change funnels through a
//! single commit path that diffs against the previous value, updates the
//! typing style and caret state, and notifies observers. Unchanged values
//! short-circuit before any side effect.
//!
//! # Attachment
//!
//! The controller holds a weak reference to its [`EditingFrame`]. After
//! [`SelectionController::prepare_for_destruction`], or once the frame is
//! dropped, every mutating operation is a no-op returning `false`.
//!
//! # Invariants
//!
//! 1. Committed selections satisfy the [`Selection`] invariants.
//! 2. A range whose base is editable never extends outside its editable
//!    root.
//! 3. The horizontal anchor survives only consecutive vertical moves; any
//!    other commit clears it.
//! 4. The caret blinks only for a caret selection in a focused, active,
//!    visible controller.

use std::cmp::Ordering;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use fsel_core::{
    Affinity, CursorAlignOnScroll, EditingFrame, EditingStyle, Granularity, LogicalDirection,
    NodeId, Point, Position, Rect, SelectionDirection, VerticalDirection,
};
use web_time::Instant;

use crate::bidi;
use crate::caret::{CaretBlinker, CaretCanvas, CaretState, DragCaret, fill_clipped};
use crate::config::SelectionConfig;
use crate::host::{EditingPolicy, FocusController, SelectionChange, SelectionObserver};
use crate::options::{Alteration, SetSelectionOptions};
use crate::selection::{Selection, SelectionRange};

enum Attachment {
    Attached(Weak<dyn EditingFrame>),
    Detached,
}

/// A candidate produced by a movement, before policy checks.
struct Plan {
    selection: Selection,
    original_base: Option<Position>,
    x_anchor: Option<i32>,
}

/// Selection and caret state machine for one document.
pub struct SelectionController {
    frame: Attachment,
    focus: Option<Rc<dyn FocusController>>,
    policy: Option<Rc<dyn EditingPolicy>>,
    observers: Vec<Rc<dyn SelectionObserver>>,
    selection: Rc<Selection>,
    original_base: Option<Position>,
    granularity: Granularity,
    x_pos_for_vertical_arrow_navigation: Option<i32>,
    typing_style: Option<Rc<EditingStyle>>,
    caret: CaretState,
    blinker: CaretBlinker,
    drag_caret: DragCaret,
    config: SelectionConfig,
    focused: bool,
    caret_visible: bool,
    should_show_block_cursor: bool,
}

fn log_noop(operation: &'static str, reason: &'static str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(operation, reason, "selection.noop");
    #[cfg(not(feature = "tracing"))]
    let _ = (operation, reason);
}

fn caret_rect_at(frame: &dyn EditingFrame, pos: Position, affinity: Affinity) -> Option<Rect> {
    let local = frame.local_caret_rect(pos, affinity)?;
    Some(frame.absolute_transform(pos.node).map_rect(local))
}

/// Keep the extent of a range on the same side of every editing boundary
/// as its base.
fn confine_to_editing_boundary(frame: &dyn EditingFrame, selection: Selection) -> Selection {
    if !selection.is_range() {
        return selection;
    }
    let (Some(base), Some(extent)) = (selection.base(), selection.extent()) else {
        return selection;
    };
    let base_root = frame.editable_root(base);
    let extent_root = frame.editable_root(extent);
    if base_root == extent_root {
        return selection;
    }
    let base_first = selection.is_base_first();
    let clamped = match base_root {
        Some(root) if frame.is_inclusive_ancestor(root, extent.node) => return selection,
        Some(root) if base_first => frame.last_position_in(root),
        Some(root) => frame.first_position_in(root),
        None => match extent_root {
            Some(root) if base_first => frame.position_before_node(root),
            Some(root) => frame.position_after_node(root),
            None => return selection,
        },
    };
    let extent = clamped.unwrap_or(base);
    Selection::new(base, extent, selection.affinity(), frame).with_directional(selection.is_directional())
}

/// Clamp a caret move that started inside an editable root to that root.
fn confine_position(frame: &dyn EditingFrame, anchor: Position, pos: Position) -> Position {
    let Some(root) = frame.editable_root(anchor) else {
        return pos;
    };
    if frame.is_inclusive_ancestor(root, pos.node) {
        return pos;
    }
    let edge = if frame.compare_positions(pos, anchor) == Some(Ordering::Greater) {
        frame.last_position_in(root)
    } else {
        frame.first_position_in(root)
    };
    edge.unwrap_or(anchor)
}

fn is_base_first(frame: &dyn EditingFrame, base: Position, extent: Position) -> bool {
    frame.compare_positions(base, extent) != Some(Ordering::Greater)
}

impl SelectionController {
    /// Controller bound to `frame` with the default configuration.
    ///
    /// The controller starts unfocused; call [`Self::set_focused`] before
    /// expecting a visible caret.
    pub fn new<F: EditingFrame + 'static>(frame: &Rc<F>) -> Self {
        Self::with_config(frame, SelectionConfig::default())
    }

    pub fn with_config<F: EditingFrame + 'static>(frame: &Rc<F>, config: SelectionConfig) -> Self {
        let weak: Weak<F> = Rc::downgrade(frame);
        let weak: Weak<dyn EditingFrame> = weak;
        Self {
            frame: Attachment::Attached(weak),
            focus: None,
            policy: None,
            observers: Vec::new(),
            selection: Rc::new(Selection::none()),
            original_base: None,
            granularity: Granularity::Character,
            x_pos_for_vertical_arrow_navigation: None,
            typing_style: None,
            caret: CaretState::default(),
            blinker: CaretBlinker::new(config.caret.blink_interval()),
            drag_caret: DragCaret::new(config.caret.width),
            config,
            focused: false,
            caret_visible: true,
            should_show_block_cursor: false,
        }
    }

    pub fn set_focus_controller(&mut self, focus: Rc<dyn FocusController>) {
        self.focus = Some(focus);
    }

    pub fn set_editing_policy(&mut self, policy: Rc<dyn EditingPolicy>) {
        self.policy = Some(policy);
    }

    pub fn add_observer(&mut self, observer: Rc<dyn SelectionObserver>) {
        self.observers.push(observer);
    }

    pub fn remove_observer(&mut self, observer: &Rc<dyn SelectionObserver>) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| !Rc::ptr_eq(o, observer));
        self.observers.len() != before
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Swap the configuration; caret timing and width apply immediately.
    pub fn set_config(&mut self, config: SelectionConfig) {
        self.blinker.set_interval(config.caret.blink_interval());
        self.drag_caret = DragCaret::new(config.caret.width);
        self.config = config;
        self.caret.invalidate();
        self.update_appearance();
    }

    fn frame(&self) -> Option<Rc<dyn EditingFrame>> {
        match &self.frame {
            Attachment::Attached(weak) => weak.upgrade(),
            Attachment::Detached => None,
        }
    }

    /// Whether the controller still has a live document.
    pub fn is_attached(&self) -> bool {
        self.frame().is_some()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Shared handle to the current value; stays valid across later changes.
    pub fn selection_snapshot(&self) -> Rc<Selection> {
        Rc::clone(&self.selection)
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn is_none(&self) -> bool {
        self.selection.is_none()
    }

    pub fn is_caret(&self) -> bool {
        self.selection.is_caret()
    }

    pub fn is_range(&self) -> bool {
        self.selection.is_range()
    }

    pub fn to_normalized_range(&self) -> Option<SelectionRange> {
        self.selection.to_normalized_range()
    }

    /// Base before the last bidi endpoint adjustment, if one is in effect.
    pub fn original_base(&self) -> Option<Position> {
        self.original_base
    }

    pub fn x_pos_for_vertical_arrow_navigation(&self) -> Option<i32> {
        self.x_pos_for_vertical_arrow_navigation
    }

    pub fn typing_style(&self) -> Option<&EditingStyle> {
        self.typing_style.as_deref()
    }

    pub fn caret_state(&self) -> &CaretState {
        &self.caret
    }

    // ------------------------------------------------------------------
    // Commit path
    // ------------------------------------------------------------------

    fn commit(
        &mut self,
        frame: &dyn EditingFrame,
        selection: Selection,
        options: SetSelectionOptions,
        align: CursorAlignOnScroll,
        granularity: Granularity,
        keep_original_base: bool,
    ) -> bool {
        let selection = confine_to_editing_boundary(frame, selection);
        if !keep_original_base {
            self.original_base = None;
        }
        self.granularity = granularity;

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "selection.commit",
            kind = selection.selection_type().as_str(),
            user_triggered = options.user_triggered,
            changed = tracing::field::Empty
        )
        .entered();

        if *self.selection == selection {
            #[cfg(feature = "tracing")]
            _span.record("changed", false);
            return false;
        }

        let new = Rc::new(selection);
        let old = std::mem::replace(&mut self.selection, Rc::clone(&new));
        self.x_pos_for_vertical_arrow_navigation = None;

        if options.close_typing {
            for observer in &self.observers {
                observer.typing_closed();
            }
        }
        self.update_typing_style(frame, &old, &new, options.clear_typing_style);
        if options.move_focus && self.config.move_focus_on_change {
            self.focus_editable_root(frame);
        }
        self.caret.invalidate();
        if options.update_appearance {
            self.update_appearance();
        } else if !new.is_caret() {
            self.stop_blinking();
        }

        let change = SelectionChange {
            old: &old,
            new: &new,
            user_triggered: options.user_triggered,
            spell_correction_triggered: options.spell_correction_triggered,
        };
        for observer in &self.observers {
            observer.selection_did_change(&change);
            observer.accessibility_selection_changed(&new);
        }
        if options.user_triggered {
            self.reveal_in(frame, align);
        }

        #[cfg(feature = "tracing")]
        _span.record("changed", true);
        true
    }

    /// Typing style follows the caret: a range drops it, a caret keeps it
    /// only while it stays in the same styling context.
    fn update_typing_style(
        &mut self,
        frame: &dyn EditingFrame,
        old: &Selection,
        new: &Selection,
        clear: bool,
    ) {
        let next = match new.start().filter(|_| new.is_caret()) {
            None => None,
            Some(pos) => {
                let context = frame.style_at(pos);
                let same_context = old.is_caret()
                    && old.start().map(|p| frame.style_at(p)) == Some(context.clone());
                if !clear && same_context && self.typing_style.is_some() {
                    self.typing_style.clone()
                } else {
                    context
                }
            }
        };
        if next != self.typing_style {
            self.typing_style = next;
            for observer in &self.observers {
                observer.typing_style_changed(self.typing_style.as_deref());
            }
        }
    }

    /// Replace the selection.
    ///
    /// Returns `false` when detached or when `selection` equals the current
    /// value; in the latter case nothing is notified or recomputed.
    pub fn set_selection(&mut self, selection: Selection, options: SetSelectionOptions) -> bool {
        self.set_selection_with(
            selection,
            options,
            CursorAlignOnScroll::IfNeeded,
            Granularity::Character,
        )
    }

    /// [`Self::set_selection`] with scroll alignment and the granularity to
    /// remember for repeat operations.
    pub fn set_selection_with(
        &mut self,
        selection: Selection,
        options: SetSelectionOptions,
        align: CursorAlignOnScroll,
        granularity: Granularity,
    ) -> bool {
        let Some(frame) = self.frame() else {
            log_noop("set_selection", "detached");
            return false;
        };
        let selection = if !selection.is_none() && self.config.directional_by_default() {
            selection.with_directional(true)
        } else {
            selection
        };
        self.commit(&*frame, selection, options, align, granularity, false)
    }

    /// Collapse to a caret at `pos`.
    pub fn move_to(&mut self, pos: Position, user_triggered: bool) -> bool {
        let Some(frame) = self.frame() else {
            log_noop("move_to", "detached");
            return false;
        };
        let selection = Selection::caret(pos, Affinity::Downstream, &*frame);
        self.set_selection(
            selection,
            SetSelectionOptions::default().user_triggered(user_triggered),
        )
    }

    /// Select from `base` to `extent`.
    pub fn move_to_range(&mut self, base: Position, extent: Position, user_triggered: bool) -> bool {
        let Some(frame) = self.frame() else {
            log_noop("move_to_range", "detached");
            return false;
        };
        let selection = Selection::new(base, extent, Affinity::Downstream, &*frame);
        self.set_selection(
            selection,
            SetSelectionOptions::default().user_triggered(user_triggered),
        )
    }

    /// Select `range` forward.
    pub fn set_selected_range(
        &mut self,
        range: SelectionRange,
        affinity: Affinity,
        close_typing: bool,
    ) -> bool {
        let Some(frame) = self.frame() else {
            log_noop("set_selected_range", "detached");
            return false;
        };
        let selection = Selection::from_range(range, affinity, &*frame);
        self.set_selection(
            selection,
            SetSelectionOptions::default().close_typing(close_typing),
        )
    }

    fn rebuild(&mut self, base: Position, extent: Position, user_triggered: bool) -> bool {
        let Some(frame) = self.frame() else {
            log_noop("set_endpoint", "detached");
            return false;
        };
        let selection = Selection::new(base, extent, Affinity::Downstream, &*frame)
            .with_directional(self.selection.is_directional());
        self.set_selection(
            selection,
            SetSelectionOptions::default().user_triggered(user_triggered),
        )
    }

    pub fn set_base(&mut self, pos: Position, user_triggered: bool) -> bool {
        let extent = self.selection.extent().unwrap_or(pos);
        self.rebuild(pos, extent, user_triggered)
    }

    pub fn set_extent(&mut self, pos: Position, user_triggered: bool) -> bool {
        let base = self.selection.base().unwrap_or(pos);
        self.rebuild(base, pos, user_triggered)
    }

    /// Move whichever of base and extent is the start.
    pub fn set_start(&mut self, pos: Position, user_triggered: bool) -> bool {
        if self.selection.is_base_first() {
            self.set_base(pos, user_triggered)
        } else {
            self.set_extent(pos, user_triggered)
        }
    }

    /// Move whichever of base and extent is the end.
    pub fn set_end(&mut self, pos: Position, user_triggered: bool) -> bool {
        if self.selection.is_base_first() {
            self.set_extent(pos, user_triggered)
        } else {
            self.set_base(pos, user_triggered)
        }
    }

    pub fn clear(&mut self) -> bool {
        let Some(frame) = self.frame() else {
            log_noop("clear", "detached");
            return false;
        };
        self.commit(
            &*frame,
            Selection::none(),
            SetSelectionOptions::default(),
            CursorAlignOnScroll::IfNeeded,
            Granularity::Character,
            false,
        )
    }

    /// Grow the current selection to `granularity` boundaries and remember
    /// the granularity.
    pub fn expand_selection(&mut self, granularity: Granularity) -> bool {
        let Some(frame) = self.frame() else {
            log_noop("expand_selection", "detached");
            return false;
        };
        let expanded = self.selection.expand_to(granularity, &*frame);
        self.commit(
            &*frame,
            expanded,
            SetSelectionOptions::default(),
            CursorAlignOnScroll::IfNeeded,
            granularity,
            false,
        )
    }

    /// Select the whole editable root containing the selection, or the
    /// whole document. Cancelled by a `selectstart` veto.
    pub fn select_all(&mut self) -> bool {
        let Some(frame) = self.frame() else {
            log_noop("select_all", "detached");
            return false;
        };
        let root = self
            .selection
            .start()
            .and_then(|p| frame.editable_root(p))
            .or_else(|| frame.root_node());
        let Some(root) = root else {
            log_noop("select_all", "no root");
            return false;
        };
        let (Some(first), Some(last)) = (frame.first_position_in(root), frame.last_position_in(root))
        else {
            log_noop("select_all", "empty");
            return false;
        };
        let candidate = Selection::new(first, last, Affinity::Downstream, &*frame)
            .with_directional(self.config.directional_by_default());
        if candidate.is_none() {
            log_noop("select_all", "empty");
            return false;
        }
        if let Some(policy) = &self.policy
            && !policy.dispatch_select_start(candidate.base())
        {
            log_noop("select_all", "selectstart cancelled");
            return false;
        }
        if !self.should_change_selection(&candidate) {
            log_noop("select_all", "vetoed");
            return false;
        }
        self.commit(
            &*frame,
            candidate,
            SetSelectionOptions::default(),
            CursorAlignOnScroll::IfNeeded,
            Granularity::Character,
            false,
        )
    }

    pub fn should_change_selection(&self, candidate: &Selection) -> bool {
        self.policy
            .as_ref()
            .is_none_or(|p| p.should_change_selection(&self.selection, candidate))
    }

    pub fn should_delete_selection(&self, candidate: &Selection) -> bool {
        self.policy
            .as_ref()
            .is_none_or(|p| p.should_delete_selection(candidate))
    }

    // ------------------------------------------------------------------
    // Movement
    // ------------------------------------------------------------------

    /// Base and extent to extend from.
    ///
    /// Directional selections keep their base (the pre-adjustment one if a
    /// bidi adjustment is in effect). Others anchor at the end opposite the
    /// direction of travel.
    fn will_be_modified(&self, alter: Alteration, forward: bool) -> Option<(Position, Position)> {
        let sel = &*self.selection;
        let (base, extent) = (sel.base()?, sel.extent()?);
        Some(match alter {
            Alteration::Move => (base, extent),
            Alteration::Extend if sel.is_directional() || sel.is_caret() => {
                (self.original_base.unwrap_or(base), extent)
            }
            Alteration::Extend if forward => (sel.start()?, sel.end()?),
            Alteration::Extend => (sel.end()?, sel.start()?),
        })
    }

    /// Absolute x to hold during block-direction navigation.
    fn line_direction_point(&self, frame: &dyn EditingFrame, pos: Position) -> i32 {
        if let Some(x) = self.x_pos_for_vertical_arrow_navigation {
            return x;
        }
        caret_rect_at(frame, pos, self.selection.affinity()).map_or(0, |r| r.x)
    }

    fn plan_modify(
        &self,
        frame: &dyn EditingFrame,
        alter: Alteration,
        direction: SelectionDirection,
        granularity: Granularity,
    ) -> Option<Plan> {
        let sel = &*self.selection;
        let (start, end) = (sel.start()?, sel.end()?);
        let logical = direction.to_logical(frame.enclosing_block_direction(sel.extent()?));
        let forward = logical == LogicalDirection::Forward;
        let (base, extent) = self.will_be_modified(alter, forward)?;

        let pivot = match alter {
            Alteration::Extend => extent,
            Alteration::Move if sel.is_range() && forward => end,
            Alteration::Move => start,
        };

        let mut x_anchor = None;
        let mut target = if granularity == Granularity::Line {
            let x = self.line_direction_point(frame, pivot);
            x_anchor = Some(x);
            let vertical = if forward {
                VerticalDirection::Down
            } else {
                VerticalDirection::Up
            };
            frame.position_on_adjacent_line(pivot, sel.affinity(), vertical, x)?
        } else if alter == Alteration::Move && sel.is_range() && granularity == Granularity::Character
        {
            pivot
        } else {
            if granularity == Granularity::Paragraph {
                x_anchor = Some(self.line_direction_point(frame, pivot));
            }
            frame.next_position(pivot, granularity, logical)?
        };

        let behavior = self.config.behavior;
        let selection = match alter {
            Alteration::Move => {
                target = confine_position(frame, pivot, target);
                let affinity = if granularity == Granularity::LineBoundary && forward {
                    Affinity::Upstream
                } else {
                    Affinity::Downstream
                };
                Selection::caret(target, affinity, frame)
                    .with_directional(self.config.directional_by_default())
            }
            Alteration::Extend
                if sel.is_range()
                    && granularity.is_boundary()
                    && behavior.should_always_grow_selection_when_extending_to_boundary() =>
            {
                let (b, e) = match (forward, sel.is_base_first()) {
                    (true, true) => (start, target),
                    (true, false) => (target, start),
                    (false, true) => (target, end),
                    (false, false) => (end, target),
                };
                Selection::new(b, e, sel.affinity(), frame).with_directional(true)
            }
            Alteration::Extend => {
                if sel.is_range()
                    && matches!(
                        granularity,
                        Granularity::Word | Granularity::Line | Granularity::Paragraph
                    )
                    && behavior.should_extend_selection_by_word_or_line_across_caret()
                    && is_base_first(frame, base, extent) != is_base_first(frame, base, target)
                {
                    target = base;
                }
                let adjusted = if self.config.bidi.adjust_endpoints {
                    bidi::adjusted_base(frame, base, target)
                } else {
                    None
                };
                let selection = Selection::new(adjusted.unwrap_or(base), target, sel.affinity(), frame)
                    .with_directional(true);
                return Some(Plan {
                    selection,
                    original_base: adjusted.map(|_| base),
                    x_anchor,
                });
            }
        };
        Some(Plan {
            selection,
            original_base: None,
            x_anchor,
        })
    }

    /// Policy gate for a user-visible change. Starting a range from a caret
    /// by user action fires `selectstart` first.
    fn approve(&self, candidate: &Selection, user_triggered: bool, operation: &'static str) -> bool {
        if !self.should_change_selection(candidate) {
            log_noop(operation, "vetoed");
            return false;
        }
        if user_triggered
            && !self.selection.is_range()
            && candidate.is_range()
            && let Some(policy) = &self.policy
            && !policy.dispatch_select_start(candidate.base())
        {
            log_noop(operation, "selectstart cancelled");
            return false;
        }
        true
    }

    fn apply_plan(
        &mut self,
        frame: &dyn EditingFrame,
        plan: Plan,
        user_triggered: bool,
        align: CursorAlignOnScroll,
        operation: &'static str,
    ) -> bool {
        if !self.approve(&plan.selection, user_triggered, operation) {
            return false;
        }
        self.original_base = plan.original_base;
        let changed = self.commit(
            frame,
            plan.selection,
            SetSelectionOptions::default().user_triggered(user_triggered),
            align,
            Granularity::Character,
            true,
        );
        if plan.x_anchor.is_some() {
            self.x_pos_for_vertical_arrow_navigation = plan.x_anchor;
        }
        changed
    }

    /// Move or extend by one unit of `granularity`.
    ///
    /// Returns whether the selection changed. Nothing to move to, a policy
    /// veto, or a cancelled `selectstart` leave the selection untouched.
    pub fn modify(
        &mut self,
        alter: Alteration,
        direction: SelectionDirection,
        granularity: Granularity,
        user_triggered: bool,
    ) -> bool {
        let Some(frame) = self.frame() else {
            log_noop("modify", "detached");
            return false;
        };
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "selection.modify",
            alteration = alter.as_str(),
            direction = ?direction,
            granularity = granularity.as_str()
        )
        .entered();

        let Some(plan) = self.plan_modify(&*frame, alter, direction, granularity) else {
            log_noop("modify", "no position");
            return false;
        };
        self.apply_plan(
            &*frame,
            plan,
            user_triggered,
            CursorAlignOnScroll::IfNeeded,
            "modify",
        )
    }

    /// Move or extend by up to `distance` layout units vertically, holding
    /// the horizontal anchor across consecutive calls.
    ///
    /// Steps line by line and stops on the last line whose caret is within
    /// `distance` of the starting caret. A negative distance reverses the
    /// direction.
    pub fn modify_vertical(
        &mut self,
        alter: Alteration,
        distance: i32,
        direction: VerticalDirection,
        user_triggered: bool,
        align: CursorAlignOnScroll,
    ) -> bool {
        let Some(frame) = self.frame() else {
            log_noop("modify_vertical", "detached");
            return false;
        };
        if distance == 0 {
            log_noop("modify_vertical", "zero distance");
            return false;
        }
        let direction = match (distance < 0, direction) {
            (false, d) => d,
            (true, VerticalDirection::Up) => VerticalDirection::Down,
            (true, VerticalDirection::Down) => VerticalDirection::Up,
        };
        let distance = distance.saturating_abs();

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "selection.modify",
            alteration = alter.as_str(),
            direction = ?direction,
            granularity = "vertical",
            distance
        )
        .entered();

        let Some(plan) = self.plan_vertical(&*frame, alter, distance, direction) else {
            log_noop("modify_vertical", "no position");
            return false;
        };
        self.apply_plan(&*frame, plan, user_triggered, align, "modify_vertical")
    }

    fn plan_vertical(
        &self,
        frame: &dyn EditingFrame,
        alter: Alteration,
        distance: i32,
        direction: VerticalDirection,
    ) -> Option<Plan> {
        let sel = &*self.selection;
        let down = direction == VerticalDirection::Down;
        let (base, extent) = self.will_be_modified(alter, down)?;
        let pivot = match alter {
            Alteration::Extend => extent,
            Alteration::Move if down => sel.end()?,
            Alteration::Move => sel.start()?,
        };
        let x = self.line_direction_point(frame, pivot);
        let start_y = caret_rect_at(frame, pivot, sel.affinity())?.y;

        let mut current = pivot;
        let mut affinity = sel.affinity();
        let mut result = None;
        while let Some(next) = frame.position_on_adjacent_line(current, affinity, direction, x) {
            if next == current {
                break;
            }
            let Some(rect) = caret_rect_at(frame, next, Affinity::Downstream) else {
                break;
            };
            let delta = rect.y.saturating_sub(start_y).saturating_abs();
            if delta > distance {
                break;
            }
            result = Some(next);
            if delta == distance {
                break;
            }
            current = next;
            affinity = Affinity::Downstream;
        }
        let target = result?;

        let selection = match alter {
            Alteration::Move => Selection::caret(confine_position(frame, pivot, target), Affinity::Downstream, frame)
                .with_directional(self.config.directional_by_default()),
            Alteration::Extend => {
                Selection::new(base, target, sel.affinity(), frame).with_directional(true)
            }
        };
        Some(Plan {
            selection,
            original_base: None,
            x_anchor: Some(x),
        })
    }

    // ------------------------------------------------------------------
    // Document mutation hooks
    // ------------------------------------------------------------------

    /// Re-anchor before `node`'s subtree leaves the document.
    ///
    /// A range that loses one endpoint collapses to a caret where the
    /// subtree used to be, canonical for the document without it; a range that
    /// loses both becomes `None`. A caret inside the subtree moves the same
    /// way.
    pub fn node_will_be_removed(&mut self, node: NodeId) {
        let Some(frame) = self.frame() else {
            return;
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(node = node.0, "selection.node_will_be_removed");

        let inside = |p: Option<Position>| p.is_some_and(|p| frame.is_inclusive_ancestor(node, p.node));
        if inside(self.drag_caret.position()) {
            self.drag_caret.clear();
        }
        if self
            .caret
            .last_painted_node
            .is_some_and(|n| frame.is_inclusive_ancestor(node, n))
        {
            let bounds = self.caret.absolute_bounds;
            self.caret.last_painted_node = None;
            self.caret.node = None;
            self.caret.absolute_bounds = Rect::default();
            self.caret.invalidate();
            self.notify_caret_rect(bounds);
        }

        let sel = Rc::clone(&self.selection);
        let start_removed = inside(sel.start());
        let end_removed = inside(sel.end());
        if !start_removed && !end_removed {
            return;
        }
        let replacement = frame.position_replacing_node(node);
        let collapse = |pos: Option<Position>| match pos {
            Some(p) => Selection::caret_unchecked(p, sel.affinity()),
            None => Selection::none(),
        };
        let new = if sel.is_range() && start_removed && end_removed {
            Selection::none()
        } else {
            collapse(replacement)
        };
        self.commit(
            &*frame,
            new,
            SetSelectionOptions::mutation(),
            CursorAlignOnScroll::IfNeeded,
            self.granularity,
            false,
        );
    }

    /// Shift endpoints after `old_len` bytes at `offset` in `node` were
    /// replaced by `new_len` bytes.
    ///
    /// Positions past the replaced span move by the length difference;
    /// positions inside it snap to `offset`.
    pub fn text_was_replaced(&mut self, node: NodeId, offset: usize, old_len: usize, new_len: usize) {
        let Some(frame) = self.frame() else {
            return;
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(node = node.0, offset, old_len, new_len, "selection.text_was_replaced");

        let sel = Rc::clone(&self.selection);
        let (Some(base), Some(extent)) = (sel.base(), sel.extent()) else {
            return;
        };
        let shift = |p: Position| {
            if p.node != node {
                p
            } else if p.offset > offset + old_len {
                Position::new(node, p.offset - old_len + new_len)
            } else if p.offset > offset {
                Position::new(node, offset)
            } else {
                p
            }
        };
        if base.node == node || extent.node == node {
            self.caret.invalidate();
        }
        let (new_base, new_extent) = (shift(base), shift(extent));
        if new_base == base && new_extent == extent {
            return;
        }
        let new = Selection::new(new_base, new_extent, sel.affinity(), &*frame)
            .with_directional(sel.is_directional());
        self.commit(
            &*frame,
            new,
            SetSelectionOptions::mutation(),
            CursorAlignOnScroll::IfNeeded,
            self.granularity,
            false,
        );
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Whether `point` falls on the highlighted part of a range.
    pub fn contains(&self, point: Point) -> bool {
        let Some(frame) = self.frame() else {
            return false;
        };
        let (Some(start), Some(end)) = (self.selection.start(), self.selection.end()) else {
            return false;
        };
        self.selection.is_range()
            && frame
                .selection_rects(start, end)
                .iter()
                .any(|r| r.contains(point))
    }

    /// Bounding box of the caret or of the highlighted range.
    pub fn bounds(&self, clip_to_visible_content: bool) -> Rect {
        let Some(frame) = self.frame() else {
            return Rect::default();
        };
        let sel = &*self.selection;
        let rect = match (sel.start(), sel.end()) {
            (Some(pos), _) if sel.is_caret() => caret_rect_at(&*frame, pos, sel.affinity())
                .map(|mut r| {
                    r.width = self.caret_width(&*frame, pos);
                    r
                })
                .unwrap_or_default(),
            (Some(start), Some(end)) => frame
                .selection_rects(start, end)
                .iter()
                .fold(Rect::default(), |acc, r| acc.union(r)),
            _ => return Rect::default(),
        };
        match frame.visible_content_rect() {
            Some(visible) if clip_to_visible_content => rect.intersection(&visible),
            _ => rect,
        }
    }

    /// Highlight rectangles clipped to the visible content; empty pieces
    /// are dropped.
    pub fn clipped_visible_text_rects(&self) -> Vec<Rect> {
        let Some(frame) = self.frame() else {
            return Vec::new();
        };
        let (Some(start), Some(end)) = (self.selection.start(), self.selection.end()) else {
            return Vec::new();
        };
        let rects = frame.selection_rects(start, end);
        match frame.visible_content_rect() {
            Some(visible) => rects
                .iter()
                .filter_map(|r| r.intersection_opt(&visible))
                .collect(),
            None => rects,
        }
    }

    pub fn selected_text(&self) -> String {
        let Some(frame) = self.frame() else {
            return String::new();
        };
        match (self.selection.start(), self.selection.end()) {
            (Some(start), Some(end)) if self.selection.is_range() => frame.text_between(start, end),
            _ => String::new(),
        }
    }

    /// Text to put on the clipboard: no-break spaces become plain spaces and
    /// password fields yield nothing.
    pub fn selected_text_for_clipboard(&self) -> String {
        if self.is_in_password_field() {
            return String::new();
        }
        self.selected_text().replace('\u{a0}', " ")
    }

    pub fn is_in_password_field(&self) -> bool {
        match (self.frame(), self.selection.start()) {
            (Some(frame), Some(pos)) => frame.is_in_password_field(pos),
            _ => false,
        }
    }

    pub fn root_editable_element(&self) -> Option<NodeId> {
        let frame = self.frame()?;
        frame.editable_root(self.selection.start()?)
    }

    pub fn is_content_editable(&self) -> bool {
        self.root_editable_element().is_some()
    }

    /// Whether the selection spans its whole editable root (or the whole
    /// document).
    pub fn is_all(&self) -> bool {
        let Some(frame) = self.frame() else {
            return false;
        };
        let (Some(start), Some(end)) = (self.selection.start(), self.selection.end()) else {
            return false;
        };
        let Some(root) = frame.editable_root(start).or_else(|| frame.root_node()) else {
            return false;
        };
        let first = frame
            .first_position_in(root)
            .and_then(|p| frame.canonical_position(p));
        let last = frame
            .last_position_in(root)
            .and_then(|p| frame.canonical_position(p));
        first == Some(start) && last == Some(end)
    }

    // ------------------------------------------------------------------
    // Focus, caret appearance, and painting
    // ------------------------------------------------------------------

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_focused_and_active(&self) -> bool {
        self.focused && self.focus.as_ref().is_none_or(|f| f.is_active())
    }

    pub fn set_focused(&mut self, focused: bool) {
        if self.focused == focused {
            return;
        }
        self.focused = focused;
        self.focused_or_active_state_changed();
    }

    /// The embedder's focus changed; re-evaluate the caret.
    pub fn did_change_focus(&mut self) {
        self.focused_or_active_state_changed();
    }

    /// The window became active or inactive.
    pub fn page_activation_changed(&mut self) {
        self.focused_or_active_state_changed();
    }

    fn focused_or_active_state_changed(&mut self) {
        self.caret.invalidate();
        self.update_appearance();
        self.notify_caret_rect(self.caret.absolute_bounds);
    }

    /// Move keyboard focus to the selection's editable root.
    pub fn set_focused_node_if_needed(&mut self) {
        if let Some(frame) = self.frame() {
            self.focus_editable_root(&*frame);
        }
    }

    fn focus_editable_root(&self, frame: &dyn EditingFrame) {
        let Some(focus) = &self.focus else {
            return;
        };
        let Some(start) = self.selection.start() else {
            return;
        };
        focus.set_focused_node(frame.editable_root(start));
    }

    /// Hide or show the caret regardless of focus (e.g. while a menu is up).
    pub fn set_caret_visible(&mut self, visible: bool) {
        if self.caret_visible == visible {
            return;
        }
        self.caret_visible = visible;
        self.update_appearance();
    }

    pub fn is_caret_visible(&self) -> bool {
        self.caret_visible
    }

    /// Draw the caret as a block one grapheme wide (overtype mode).
    pub fn set_should_show_block_cursor(&mut self, block: bool) {
        if self.should_show_block_cursor == block {
            return;
        }
        self.should_show_block_cursor = block;
        self.caret.invalidate();
        self.update_appearance();
    }

    pub fn should_show_block_cursor(&self) -> bool {
        self.should_show_block_cursor
    }

    fn caret_should_show(&self) -> bool {
        self.selection.is_caret() && self.caret_visible && self.is_focused_and_active()
    }

    fn update_appearance(&mut self) {
        let was_painted = self.blinker.is_painted();
        if self.caret_should_show() {
            self.blinker.restart();
        } else {
            self.blinker.stop();
        }
        if was_painted != self.blinker.is_painted() {
            self.notify_caret_rect(self.caret.absolute_bounds);
        }
    }

    fn stop_blinking(&mut self) {
        let was_painted = self.blinker.is_painted();
        self.blinker.stop();
        if was_painted != self.blinker.is_painted() {
            self.notify_caret_rect(self.caret.absolute_bounds);
        }
    }

    fn notify_caret_rect(&self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        for observer in &self.observers {
            observer.caret_rect_invalidated(rect);
        }
    }

    fn caret_width(&self, frame: &dyn EditingFrame, pos: Position) -> i32 {
        let width = self.config.caret.width;
        if self.should_show_block_cursor {
            frame.grapheme_advance(pos).unwrap_or(width)
        } else {
            width
        }
    }

    /// Mark the caret geometry stale.
    pub fn invalidate_caret_rect(&mut self) {
        self.caret.invalidate();
    }

    /// Refresh the cached caret geometry if it is stale.
    ///
    /// Returns whether the absolute bounds changed; on change both the old
    /// and new rects are reported to observers for repaint.
    pub fn recompute_caret_rect(&mut self) -> bool {
        if !self.caret.dirty {
            return false;
        }
        let Some(frame) = self.frame() else {
            return false;
        };
        let sel = &*self.selection;
        let resolved = sel.start().filter(|_| sel.is_caret()).and_then(|pos| {
            let mut local = frame.local_caret_rect(pos, sel.affinity())?;
            local.width = self.caret_width(&*frame, pos);
            Some((pos.node, local))
        });
        let (node, local, absolute) = match resolved {
            Some((node, local)) => (
                Some(node),
                local,
                frame.absolute_transform(node).map_rect(local),
            ),
            None => (None, Rect::default(), Rect::default()),
        };
        self.caret.dirty = false;
        self.caret.local_rect = local;
        self.caret.node = node;
        if !absolute.is_empty() {
            self.caret.last_painted_node = node;
        }
        if absolute == self.caret.absolute_bounds {
            return false;
        }
        let old = std::mem::replace(&mut self.caret.absolute_bounds, absolute);
        self.notify_caret_rect(old);
        self.notify_caret_rect(absolute);
        true
    }

    /// Current absolute caret rect, recomputed if stale.
    pub fn absolute_caret_bounds(&mut self) -> Rect {
        self.recompute_caret_rect();
        self.caret.absolute_bounds
    }

    /// Whether the caret is in its visible blink phase right now.
    pub fn is_caret_painted(&self) -> bool {
        self.caret_should_show() && self.blinker.is_painted()
    }

    /// Paint the caret with the geometry of the last recompute.
    pub fn paint_caret(&self, canvas: &mut dyn CaretCanvas, clip: Rect) -> bool {
        self.is_caret_painted() && fill_clipped(canvas, self.caret.absolute_bounds, clip)
    }

    pub fn drag_caret(&self) -> &DragCaret {
        &self.drag_caret
    }

    /// Show the drop indicator at `pos`, or hide it with `None`.
    pub fn set_drag_caret(&mut self, pos: Option<Position>) {
        if let Some(frame) = self.frame()
            && let Some(old) = self.drag_caret.bounds(&*frame)
        {
            self.notify_caret_rect(old);
        }
        let pos = match (self.frame(), pos) {
            (Some(frame), Some(p)) => frame.canonical_position(p),
            _ => None,
        };
        self.drag_caret.set_position(pos);
        if let Some(frame) = self.frame()
            && let Some(new) = self.drag_caret.bounds(&*frame)
        {
            self.notify_caret_rect(new);
        }
    }

    pub fn paint_drag_caret(&self, canvas: &mut dyn CaretCanvas, clip: Rect) -> bool {
        self.frame()
            .is_some_and(|frame| self.drag_caret.paint(&*frame, canvas, clip))
    }

    /// Advance the blink timer. Returns whether the caret toggled.
    pub fn tick(&mut self, dt: Duration) -> bool {
        if !self.caret_should_show() {
            return false;
        }
        let toggled = self.blinker.tick(dt);
        if toggled {
            self.notify_caret_rect(self.caret.absolute_bounds);
        }
        toggled
    }

    /// Advance the blink timer by wall-clock time.
    pub fn poll_blink(&mut self, now: Instant) -> bool {
        if !self.caret_should_show() {
            return false;
        }
        let toggled = self.blinker.poll(now);
        if toggled {
            self.notify_caret_rect(self.caret.absolute_bounds);
        }
        toggled
    }

    /// Whether the blink timer is running.
    pub fn is_caret_blinking(&self) -> bool {
        self.blinker.is_active() && self.blinker.interval().is_some()
    }

    pub fn set_caret_blinking_suspended(&mut self, suspended: bool) {
        self.blinker.set_suspended(suspended);
    }

    pub fn is_caret_blinking_suspended(&self) -> bool {
        self.blinker.is_suspended()
    }

    // ------------------------------------------------------------------
    // Scrolling, typing style, teardown
    // ------------------------------------------------------------------

    /// Ask the layout to scroll the extent into view.
    pub fn reveal_selection(&self, align: CursorAlignOnScroll) {
        if let Some(frame) = self.frame() {
            self.reveal_in(&*frame, align);
        }
    }

    fn reveal_in(&self, frame: &dyn EditingFrame, align: CursorAlignOnScroll) {
        let Some(extent) = self.selection.extent() else {
            return;
        };
        if let Some(rect) = caret_rect_at(frame, extent, self.selection.affinity()) {
            frame.reveal_rect(rect, align);
        }
    }

    /// Override the style applied to the next typed text.
    pub fn set_typing_style(&mut self, style: Option<EditingStyle>) {
        let style = style.filter(|s| !s.is_empty()).map(Rc::new);
        if style == self.typing_style {
            return;
        }
        self.typing_style = style;
        for observer in &self.observers {
            observer.typing_style_changed(self.typing_style.as_deref());
        }
    }

    pub fn clear_typing_style(&mut self) {
        self.set_typing_style(None);
    }

    /// Detach from the document and go quiescent.
    ///
    /// Stops the blink timer and drops the selection and every host hook
    /// without notifying anyone.
    pub fn prepare_for_destruction(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!("selection.prepare_for_destruction");
        self.frame = Attachment::Detached;
        self.blinker.stop();
        self.selection = Rc::new(Selection::none());
        self.original_base = None;
        self.granularity = Granularity::Character;
        self.x_pos_for_vertical_arrow_navigation = None;
        self.typing_style = None;
        self.caret.reset();
        self.drag_caret.clear();
        self.observers.clear();
        self.focus = None;
        self.policy = None;
    }
}

impl fmt::Debug for SelectionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionController")
            .field("attached", &self.is_attached())
            .field("selection", &self.selection)
            .field("granularity", &self.granularity)
            .field("caret", &self.caret)
            .field("focused", &self.focused)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

/// Multi-line state dump for diagnostics.
impl fmt::Display for SelectionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "selection: {}", self.selection)?;
        if let Some(range) = self.selection.to_normalized_range() {
            writeln!(f, "range: {range}")?;
        }
        writeln!(f, "granularity: {}", self.granularity.as_str())?;
        let b = self.caret.absolute_bounds;
        writeln!(
            f,
            "caret: {}x{} at ({}, {}){}{}",
            b.width,
            b.height,
            b.x,
            b.y,
            if self.caret.dirty { " dirty" } else { "" },
            if self.is_caret_painted() { " painted" } else { "" }
        )?;
        match &self.typing_style {
            Some(style) => write!(f, "typing style: {style}"),
            None => write!(f, "typing style: none"),
        }
    }
}
