#![forbid(unsafe_code)]

//! In-memory editable document.
//!
//! [`TextDocument`] owns an arena tree and lazily derives a [`Snapshot`]
//! (paragraphs, bidi levels, wrapped lines) from it. It implements both
//! collaborator contracts so the selection engine can run against real
//! text without a browser-grade layout engine.
//!
//! Mutators take `&self`: the document is usually shared behind an `Rc`
//! with the engine, which only ever reads it.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::rc::Rc;

use fsel_core::{
    Affinity, BidiRun, CursorAlignOnScroll, DocumentModel, EditingStyle, Granularity,
    LayoutProvider, LogicalDirection, NodeId, Position, Rect, TextDirection, Transform,
    VerticalDirection,
};

use crate::boundary;
use crate::layout::{self, LayoutMetrics};
use crate::snapshot::Snapshot;
use crate::tree::{ElementData, NodeKind, Tree};

/// An editable rich-text document with a monospace layout.
#[derive(Debug)]
pub struct TextDocument {
    tree: RefCell<Tree>,
    cache: RefCell<Option<Rc<Snapshot>>>,
    metrics: LayoutMetrics,
    viewport: Cell<Option<Rect>>,
    revealed: Cell<Option<(Rect, CursorAlignOnScroll)>>,
}

impl Default for TextDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDocument {
    /// Empty document whose root is a plain block.
    pub fn new() -> Self {
        Self::with_root(ElementData::block())
    }

    pub fn with_root(root: ElementData) -> Self {
        Self {
            tree: RefCell::new(Tree::new(root)),
            cache: RefCell::new(None),
            metrics: LayoutMetrics::default(),
            viewport: Cell::new(None),
            revealed: Cell::new(None),
        }
    }

    /// Document with one block paragraph per entry.
    pub fn from_paragraphs(paragraphs: &[&str]) -> Self {
        let doc = Self::new();
        let root = doc.root();
        for text in paragraphs {
            doc.append_paragraph(root, text);
        }
        doc
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: LayoutMetrics) -> Self {
        self.metrics = metrics;
        self.invalidate();
        self
    }

    pub fn metrics(&self) -> LayoutMetrics {
        self.metrics
    }

    pub fn root(&self) -> NodeId {
        self.tree.borrow().root()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.borrow().parent(node)
    }

    pub fn append_element(&self, parent: NodeId, data: ElementData) -> Option<NodeId> {
        let id = self
            .tree
            .borrow_mut()
            .append(parent, NodeKind::Element(data))?;
        self.invalidate();
        Some(id)
    }

    pub fn append_text(&self, parent: NodeId, text: &str) -> Option<NodeId> {
        let id = self
            .tree
            .borrow_mut()
            .append(parent, NodeKind::Text(text.to_owned()))?;
        self.invalidate();
        Some(id)
    }

    /// Append a block holding one text node; returns the text node.
    pub fn append_paragraph(&self, parent: NodeId, text: &str) -> Option<NodeId> {
        let block = self.append_element(parent, ElementData::block())?;
        self.append_text(block, text)
    }

    /// Text nodes in document order.
    pub fn text_nodes(&self) -> Vec<NodeId> {
        self.snapshot().segments().map(|(_, s)| s.node).collect()
    }

    pub fn text(&self, node: NodeId) -> Option<String> {
        self.tree.borrow().text(node).map(str::to_owned)
    }

    /// Update an element's attributes in place.
    pub fn update_element(&self, node: NodeId, f: impl FnOnce(&mut ElementData)) -> bool {
        let updated = match self.tree.borrow_mut().element_mut(node) {
            Some(data) => {
                f(data);
                true
            }
            None => false,
        };
        if updated {
            self.invalidate();
        }
        updated
    }

    /// Detach and drop a subtree.
    ///
    /// Call the selection's `node_will_be_removed` hook first; once this
    /// returns, positions inside the subtree no longer resolve.
    pub fn remove_node(&self, node: NodeId) -> bool {
        let removed = self.tree.borrow_mut().remove(node);
        if removed {
            tracing::trace!(node = node.0, "document.remove_node");
            self.invalidate();
        }
        removed
    }

    /// Replace `old_len` bytes at `offset` in a text node.
    ///
    /// Returns `false` if the node is not a text node or the range does not
    /// fall on character boundaries.
    pub fn replace_text(&self, node: NodeId, offset: usize, old_len: usize, new: &str) -> bool {
        let replaced = {
            let mut tree = self.tree.borrow_mut();
            match tree.text_mut(node) {
                Some(text)
                    if offset
                        .checked_add(old_len)
                        .is_some_and(|end| end <= text.len())
                        && text.is_char_boundary(offset)
                        && text.is_char_boundary(offset + old_len) =>
                {
                    text.replace_range(offset..offset + old_len, new);
                    true
                }
                _ => false,
            }
        };
        if replaced {
            tracing::trace!(
                node = node.0,
                offset,
                old_len,
                new_len = new.len(),
                "document.replace_text"
            );
            self.invalidate();
        }
        replaced
    }

    /// Replace the whole content of a text node.
    pub fn set_text(&self, node: NodeId, text: &str) -> bool {
        let len = self.tree.borrow().text(node).map(str::len);
        match len {
            Some(len) => self.replace_text(node, 0, len, text),
            None => false,
        }
    }

    /// Visible part of the document, used for clipping.
    pub fn set_viewport(&self, viewport: Option<Rect>) {
        self.viewport.set(viewport);
    }

    /// Most recent request to scroll a rectangle into view.
    pub fn take_revealed(&self) -> Option<(Rect, CursorAlignOnScroll)> {
        self.revealed.take()
    }

    fn invalidate(&self) {
        self.cache.borrow_mut().take();
    }

    fn snapshot(&self) -> Rc<Snapshot> {
        if let Some(snap) = self.cache.borrow().as_ref() {
            return Rc::clone(snap);
        }
        let snap = Rc::new(Snapshot::build(&self.tree.borrow(), &self.metrics));
        *self.cache.borrow_mut() = Some(Rc::clone(&snap));
        snap
    }

    fn cursor(snap: &Snapshot, pos: Position) -> Option<boundary::Cursor> {
        let (pi, byte) = snap.locate(pos)?;
        let para = snap.paragraphs.get(pi)?;
        Some((pi, para.grapheme_floor(byte)))
    }
}

impl DocumentModel for TextDocument {
    fn contains_node(&self, node: NodeId) -> bool {
        self.tree.borrow().contains(node)
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.tree.borrow().is_inclusive_ancestor(ancestor, node)
    }

    fn compare_positions(&self, a: Position, b: Position) -> Option<Ordering> {
        self.snapshot().compare(a, b)
    }

    fn canonical_position(&self, pos: Position) -> Option<Position> {
        let snap = self.snapshot();
        let (pi, byte) = snap.locate(pos)?;
        snap.position_at(pi, byte)
    }

    fn next_position(
        &self,
        pos: Position,
        granularity: Granularity,
        direction: LogicalDirection,
    ) -> Option<Position> {
        let snap = self.snapshot();
        let at = Self::cursor(&snap, pos)?;
        let (pi, g) = boundary::step(&snap, &self.metrics, at, granularity, direction)?;
        snap.position_at_grapheme(pi, g)
    }

    fn enclosing_block_direction(&self, pos: Position) -> TextDirection {
        let snap = self.snapshot();
        snap.locate(pos)
            .and_then(|(pi, _)| snap.paragraphs.get(pi))
            .map_or(TextDirection::Ltr, |p| p.direction())
    }

    fn bidi_runs(&self, pos: Position) -> Vec<BidiRun> {
        let snap = self.snapshot();
        let Some((pi, _)) = snap.locate(pos) else {
            return Vec::new();
        };
        let Some(para) = snap.paragraphs.get(pi) else {
            return Vec::new();
        };
        let levels = &para.bidi.levels;
        let mut runs = Vec::new();
        let mut start = 0;
        while start < levels.len() {
            let level = levels[start];
            let end = levels[start..]
                .iter()
                .position(|&l| l != level)
                .map_or(levels.len(), |n| start + n);
            if let (Some(s), Some(e)) = (
                snap.position_at_grapheme(pi, start),
                snap.position_at_grapheme(pi, end),
            ) {
                runs.push(BidiRun {
                    start: s,
                    end: e,
                    level,
                });
            }
            start = end;
        }
        runs
    }

    fn editable_root(&self, pos: Position) -> Option<NodeId> {
        let tree = self.tree.borrow();
        if !tree.contains(pos.node) {
            return None;
        }
        let mut root = None;
        for ancestor in std::iter::once(pos.node).chain(tree.ancestors(pos.node)) {
            match tree.element(ancestor).and_then(|e| e.editable) {
                Some(false) => break,
                Some(true) => root = Some(ancestor),
                None => {}
            }
        }
        root
    }

    fn root_node(&self) -> Option<NodeId> {
        Some(self.root())
    }

    fn first_position_in(&self, node: NodeId) -> Option<Position> {
        let snap = self.snapshot();
        let tree = self.tree.borrow();
        snap.segments()
            .find(|(_, s)| tree.is_inclusive_ancestor(node, s.node))
            .map(|(_, s)| Position::new(s.node, 0))
    }

    fn last_position_in(&self, node: NodeId) -> Option<Position> {
        let snap = self.snapshot();
        let tree = self.tree.borrow();
        snap.segments()
            .filter(|(_, s)| tree.is_inclusive_ancestor(node, s.node))
            .last()
            .map(|(_, s)| Position::new(s.node, s.len))
    }

    fn position_before_node(&self, node: NodeId) -> Option<Position> {
        let snap = self.snapshot();
        let at = snap.preorder_index(node)?;
        snap.segments()
            .filter(|(_, s)| snap.preorder_index(s.node).is_some_and(|i| i < at))
            .last()
            .map(|(_, s)| Position::new(s.node, s.len))
    }

    fn position_after_node(&self, node: NodeId) -> Option<Position> {
        let snap = self.snapshot();
        let tree = self.tree.borrow();
        let at = snap.preorder_index(node)?;
        snap.segments()
            .find(|(_, s)| {
                snap.preorder_index(s.node).is_some_and(|i| i > at)
                    && !tree.is_inclusive_ancestor(node, s.node)
            })
            .map(|(_, s)| Position::new(s.node, 0))
    }

    fn position_replacing_node(&self, node: NodeId) -> Option<Position> {
        let candidate = self
            .position_before_node(node)
            .or_else(|| self.position_after_node(node))?;
        let mut pruned = self.tree.borrow().clone();
        if !pruned.remove(node) {
            return Some(candidate);
        }
        let snap = Snapshot::build(&pruned, &self.metrics);
        let (pi, byte) = snap.locate(candidate)?;
        snap.position_at(pi, byte)
    }

    fn text_between(&self, start: Position, end: Position) -> String {
        let snap = self.snapshot();
        let (Some((sp, sb)), Some((ep, eb))) = (snap.locate(start), snap.locate(end)) else {
            return String::new();
        };
        if (sp, sb) >= (ep, eb) {
            return String::new();
        }
        let mut out = String::new();
        for pi in sp..=ep {
            let Some(para) = snap.paragraphs.get(pi) else {
                break;
            };
            let from = if pi == sp { sb } else { 0 };
            let to = if pi == ep { eb } else { para.text.len() };
            if pi > sp {
                out.push('\n');
            }
            out.push_str(para.text.get(from..to).unwrap_or_default());
        }
        out
    }

    fn style_at(&self, pos: Position) -> Option<Rc<EditingStyle>> {
        let tree = self.tree.borrow();
        if !tree.contains(pos.node) {
            return None;
        }
        let chain: Vec<NodeId> = std::iter::once(pos.node)
            .chain(tree.ancestors(pos.node))
            .collect();
        let mut style = EditingStyle::new();
        for node in chain.into_iter().rev() {
            if let Some(element) = tree.element(node) {
                style.merge(&element.style);
            }
        }
        (!style.is_empty()).then(|| Rc::new(style))
    }

    fn is_in_password_field(&self, pos: Position) -> bool {
        let tree = self.tree.borrow();
        std::iter::once(pos.node)
            .chain(tree.ancestors(pos.node))
            .any(|n| tree.element(n).is_some_and(|e| e.password))
    }
}

impl LayoutProvider for TextDocument {
    fn local_caret_rect(&self, pos: Position, affinity: Affinity) -> Option<Rect> {
        let snap = self.snapshot();
        let at = Self::cursor(&snap, pos)?;
        layout::local_caret_rect(&snap, &self.metrics, at, affinity == Affinity::Upstream)
    }

    fn absolute_transform(&self, node: NodeId) -> Transform {
        let snap = self.snapshot();
        match snap.locate(Position::new(node, 0)) {
            Some((pi, _)) => layout::paragraph_transform(&snap, &self.metrics, pi),
            None => Transform::translation(self.metrics.origin.x, self.metrics.origin.y),
        }
    }

    fn position_on_adjacent_line(
        &self,
        pos: Position,
        affinity: Affinity,
        direction: VerticalDirection,
        x: i32,
    ) -> Option<Position> {
        let snap = self.snapshot();
        let at = Self::cursor(&snap, pos)?;
        let (pi, g) = layout::adjacent_line_at_x(
            &snap,
            &self.metrics,
            at,
            affinity == Affinity::Upstream,
            direction == VerticalDirection::Down,
            x,
        )?;
        snap.position_at_grapheme(pi, g)
    }

    fn selection_rects(&self, start: Position, end: Position) -> Vec<Rect> {
        let snap = self.snapshot();
        match (Self::cursor(&snap, start), Self::cursor(&snap, end)) {
            (Some(s), Some(e)) => layout::selection_rects(&snap, &self.metrics, s, e),
            _ => Vec::new(),
        }
    }

    fn grapheme_advance(&self, pos: Position) -> Option<i32> {
        let snap = self.snapshot();
        let (pi, g) = Self::cursor(&snap, pos)?;
        let para = snap.paragraphs.get(pi)?;
        (g < para.grapheme_count()).then_some(self.metrics.char_width)
    }

    fn visible_content_rect(&self) -> Option<Rect> {
        self.viewport.get()
    }

    fn reveal_rect(&self, rect: Rect, align: CursorAlignOnScroll) {
        self.revealed.set(Some((rect, align)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replacing_position_is_canonical_without_the_node() {
        let doc = TextDocument::new();
        let p = doc.append_element(doc.root(), ElementData::block()).unwrap();
        let a = doc.append_text(p, "ab").unwrap();
        let b = doc.append_text(p, "cd").unwrap();
        let c = doc.append_text(p, "ef").unwrap();
        let q = doc.append_paragraph(doc.root(), "gh").unwrap();

        assert_eq!(doc.position_replacing_node(b), Some(Position::new(c, 0)));
        assert_eq!(doc.position_replacing_node(a), Some(Position::new(b, 0)));
        assert_eq!(doc.position_replacing_node(q), Some(Position::new(c, 2)));
        assert!(doc.contains_node(b), "the query leaves the tree alone");
    }

    #[test]
    fn canonical_position_prefers_the_later_node() {
        let doc = TextDocument::new();
        let p = doc.append_element(doc.root(), ElementData::block()).unwrap();
        let a = doc.append_text(p, "ab").unwrap();
        let b = doc.append_text(p, "cd").unwrap();
        assert_eq!(
            doc.canonical_position(Position::new(a, 2)),
            Some(Position::new(b, 0))
        );
        assert_eq!(
            doc.compare_positions(Position::new(a, 2), Position::new(b, 0)),
            Some(Ordering::Equal)
        );
        assert_eq!(doc.canonical_position(Position::new(p, 0)), None);
    }

    #[test]
    fn editable_root_is_the_highest_editable_ancestor() {
        let doc = TextDocument::new();
        let outer = doc
            .append_element(doc.root(), ElementData::block().editable(true))
            .unwrap();
        let inner = doc
            .append_element(outer, ElementData::block().editable(true))
            .unwrap();
        let t = doc.append_text(inner, "x").unwrap();
        let off = doc
            .append_element(outer, ElementData::inline().editable(false))
            .unwrap();
        let u = doc.append_text(off, "y").unwrap();
        assert_eq!(doc.editable_root(Position::new(t, 0)), Some(outer));
        assert_eq!(doc.editable_root(Position::new(u, 0)), None);
    }

    #[test]
    fn positions_around_a_removed_subtree() {
        let doc = TextDocument::from_paragraphs(&["one", "two", "three"]);
        let nodes = doc.text_nodes();
        let middle = doc.parent(nodes[1]).unwrap();
        assert_eq!(
            doc.position_before_node(middle),
            Some(Position::new(nodes[0], 3))
        );
        assert_eq!(
            doc.position_after_node(middle),
            Some(Position::new(nodes[2], 0))
        );
        assert!(doc.remove_node(middle));
        assert!(!doc.contains_node(nodes[1]));
        assert_eq!(doc.text_nodes(), vec![nodes[0], nodes[2]]);
    }

    #[test]
    fn text_between_joins_paragraphs() {
        let doc = TextDocument::from_paragraphs(&["hello", "world"]);
        let n = doc.text_nodes();
        assert_eq!(
            doc.text_between(Position::new(n[0], 3), Position::new(n[1], 2)),
            "lo\nwo"
        );
    }

    #[test]
    fn replace_text_rejects_split_characters() {
        let doc = TextDocument::from_paragraphs(&["h\u{e9}llo"]);
        let n = doc.text_nodes()[0];
        assert!(!doc.replace_text(n, 2, 1, "x"));
        assert!(doc.replace_text(n, 1, 2, "e"));
        assert_eq!(doc.text(n).as_deref(), Some("hello"));
    }

    #[test]
    fn style_merges_outermost_first() {
        let doc = TextDocument::new();
        let p = doc
            .append_element(
                doc.root(),
                ElementData::block().style(EditingStyle::new().with("color", "red")),
            )
            .unwrap();
        let b = doc
            .append_element(
                p,
                ElementData::inline()
                    .style(EditingStyle::new().with("color", "blue").with("font-weight", "bold")),
            )
            .unwrap();
        let t = doc.append_text(b, "x").unwrap();
        let plain = doc.append_paragraph(doc.root(), "y").unwrap();
        let style = doc.style_at(Position::new(t, 0)).unwrap();
        assert_eq!(style.get("color"), Some("blue"));
        assert_eq!(style.get("font-weight"), Some("bold"));
        assert!(doc.style_at(Position::new(plain, 0)).is_none());
    }

    #[test]
    fn bidi_runs_cover_the_paragraph() {
        let doc = TextDocument::from_paragraphs(&["ab \u{05D0}\u{05D1} cd"]);
        let n = doc.text_nodes()[0];
        let runs = doc.bidi_runs(Position::new(n, 0));
        let levels: Vec<u8> = runs.iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![0, 1, 0]);
        assert_eq!(runs[1].start, Position::new(n, 3));
        assert_eq!(runs[1].end, Position::new(n, 7));
    }
}
