#![forbid(unsafe_code)]

//! Contracts the selection engine consumes from its document and layout
//! collaborators.
//!
//! Both traits take `&self`: the engine holds a non-owning reference to the
//! document context and only reads through it. Implementations that mutate
//! (node removal, text replacement) do so outside these traits and tell the
//! engine through its explicit mutation hooks.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::geometry::{Rect, Transform};
use crate::position::{
    Affinity, BidiRun, Granularity, LogicalDirection, NodeId, Position, TextDirection,
    VerticalDirection,
};
use crate::style::EditingStyle;

/// Document tree queries and the position/granularity resolver.
pub trait DocumentModel {
    /// Whether the node is currently attached to the document.
    fn contains_node(&self, node: NodeId) -> bool;

    /// Whether `node` is `ancestor` or one of its descendants.
    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool;

    /// Document-order comparison. `None` if either position is detached.
    fn compare_positions(&self, a: Position, b: Position) -> Option<Ordering>;

    /// Snap a raw position to its visible, canonical equivalent.
    ///
    /// Returns `None` when the position refers to a detached node or the node
    /// cannot hold a caret.
    fn canonical_position(&self, pos: Position) -> Option<Position>;

    /// Step `pos` by one unit of `granularity`.
    ///
    /// Returns `None` when no further position exists in that direction.
    /// Boundary granularities may return `pos` itself when it already sits
    /// on the boundary.
    fn next_position(
        &self,
        pos: Position,
        granularity: Granularity,
        direction: LogicalDirection,
    ) -> Option<Position>;

    /// Direction of the block enclosing `pos`.
    fn enclosing_block_direction(&self, pos: Position) -> TextDirection;

    /// Bidi level runs of the paragraph containing `pos`, in logical order.
    fn bidi_runs(&self, pos: Position) -> Vec<BidiRun>;

    /// Highest editable root containing `pos`, if it is editable at all.
    fn editable_root(&self, pos: Position) -> Option<NodeId>;

    /// The document element.
    fn root_node(&self) -> Option<NodeId>;

    /// First caret position inside `node`.
    fn first_position_in(&self, node: NodeId) -> Option<Position>;

    /// Last caret position inside `node`.
    fn last_position_in(&self, node: NodeId) -> Option<Position>;

    /// Last caret position preceding `node`'s subtree.
    fn position_before_node(&self, node: NodeId) -> Option<Position>;

    /// First caret position following `node`'s subtree.
    fn position_after_node(&self, node: NodeId) -> Option<Position>;

    /// Caret position that takes the place of `node`'s subtree once it is
    /// removed, canonical for the document without that subtree.
    fn position_replacing_node(&self, node: NodeId) -> Option<Position> {
        self.position_before_node(node)
            .or_else(|| self.position_after_node(node))
    }

    /// Plain text between two ordered positions. Paragraphs are separated by
    /// `'\n'`.
    fn text_between(&self, start: Position, end: Position) -> String;

    /// Computed inline style at `pos`, `None` when unstyled.
    fn style_at(&self, pos: Position) -> Option<Rc<EditingStyle>>;

    /// Whether `pos` is inside a password field.
    fn is_in_password_field(&self, _pos: Position) -> bool {
        false
    }
}

/// How aggressively to scroll when revealing the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum CursorAlignOnScroll {
    #[default]
    IfNeeded,
    Always,
}

/// Render-tree queries used for caret geometry and vertical navigation.
pub trait LayoutProvider {
    /// Caret rectangle local to the renderer of `pos.node`.
    fn local_caret_rect(&self, pos: Position, affinity: Affinity) -> Option<Rect>;

    /// Local-to-absolute transform of the renderer of `node`.
    fn absolute_transform(&self, node: NodeId) -> Transform;

    /// Position on the adjacent line closest to the absolute x coordinate.
    fn position_on_adjacent_line(
        &self,
        pos: Position,
        affinity: Affinity,
        direction: VerticalDirection,
        x: i32,
    ) -> Option<Position>;

    /// Absolute highlight rectangles covering `[start, end)`.
    fn selection_rects(&self, start: Position, end: Position) -> Vec<Rect>;

    /// Width of the grapheme following `pos`, used by block cursors.
    fn grapheme_advance(&self, _pos: Position) -> Option<i32> {
        None
    }

    /// Visible part of the document, for clipping.
    fn visible_content_rect(&self) -> Option<Rect> {
        None
    }

    /// Scroll so that `rect` becomes visible.
    fn reveal_rect(&self, _rect: Rect, _align: CursorAlignOnScroll) {}
}

/// The document context a selection controller is bound to.
pub trait EditingFrame: DocumentModel + LayoutProvider {}

impl<T: DocumentModel + LayoutProvider + ?Sized> EditingFrame for T {}
