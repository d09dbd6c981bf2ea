#![forbid(unsafe_code)]

//! Flattened view of the tree: paragraphs of inline text, their grapheme
//! boundaries, bidi levels and wrapped lines.
//!
//! A snapshot is rebuilt lazily after every mutation and shared through an
//! `Rc`, so queries never observe a half-updated layout.

use std::cmp::Ordering;
use std::ops::Range;

use fsel_core::{NodeId, Position, TextDirection};
use unicode_segmentation::UnicodeSegmentation;

use crate::bidi::{ParagraphBidi, reorder_line};
use crate::layout::LayoutMetrics;
use crate::tree::Tree;

/// One text node's slice of its paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segment {
    pub(crate) node: NodeId,
    pub(crate) start: usize,
    pub(crate) len: usize,
}

impl Segment {
    pub(crate) fn end(&self) -> usize {
        self.start + self.len
    }
}

/// A wrapped line, in grapheme indices of its paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LineBox {
    pub(crate) graphemes: Range<usize>,
    /// Logical grapheme indices (paragraph-relative) in visual order.
    pub(crate) visual: Vec<usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct Paragraph {
    pub(crate) text: String,
    pub(crate) segments: Vec<Segment>,
    /// Byte offset of every grapheme boundary, including `0` and `text.len()`.
    pub(crate) boundaries: Vec<usize>,
    pub(crate) bidi: ParagraphBidi,
    pub(crate) lines: Vec<LineBox>,
    /// Top of the paragraph box, relative to the document origin.
    pub(crate) y: i32,
}

impl Paragraph {
    pub(crate) fn grapheme_count(&self) -> usize {
        self.boundaries.len().saturating_sub(1)
    }

    pub(crate) fn grapheme(&self, idx: usize) -> &str {
        match (self.boundaries.get(idx), self.boundaries.get(idx + 1)) {
            (Some(&a), Some(&b)) => &self.text[a..b],
            _ => "",
        }
    }

    /// Grapheme index of the boundary at or before `offset`.
    pub(crate) fn grapheme_floor(&self, offset: usize) -> usize {
        match self.boundaries.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }

    pub(crate) fn byte_of(&self, grapheme: usize) -> usize {
        self.boundaries
            .get(grapheme)
            .copied()
            .unwrap_or(self.text.len())
    }

    pub(crate) fn direction(&self) -> TextDirection {
        self.bidi.direction
    }

    /// Line containing the boundary before grapheme `g`.
    ///
    /// A boundary shared by two lines belongs to the later one unless
    /// `upstream` is set.
    pub(crate) fn line_of(&self, g: usize, upstream: bool) -> usize {
        let last = self.lines.len().saturating_sub(1);
        for (i, line) in self.lines.iter().enumerate() {
            if upstream && i > 0 && g == line.graphemes.start {
                return i - 1;
            }
            if g < line.graphemes.end || i == last {
                return i;
            }
        }
        last
    }
}

/// Immutable flattened document.
#[derive(Debug, Clone, Default)]
pub(crate) struct Snapshot {
    pub(crate) paragraphs: Vec<Paragraph>,
    /// Pre-order index by node id; `usize::MAX` for removed slots.
    pub(crate) order: Vec<usize>,
    /// `(paragraph, line)` for every line in document order.
    pub(crate) lines: Vec<(usize, usize)>,
}

impl Snapshot {
    pub(crate) fn build(tree: &Tree, metrics: &LayoutMetrics) -> Self {
        let preorder = tree.preorder();
        let mut order = vec![usize::MAX; tree.slot_count()];
        for (i, id) in preorder.iter().enumerate() {
            if let Some(slot) = order.get_mut(id.0 as usize) {
                *slot = i;
            }
        }

        let mut groups: Vec<(NodeId, Vec<NodeId>)> = Vec::new();
        for &id in &preorder {
            if tree.text(id).is_none() {
                continue;
            }
            let block = tree.containing_block(id);
            match groups.last_mut() {
                // A nested block in between already opened a new group.
                Some((b, members)) if *b == block => members.push(id),
                _ => groups.push((block, vec![id])),
            }
        }

        let mut paragraphs = Vec::with_capacity(groups.len());
        let mut lines = Vec::new();
        let mut y = 0i32;
        for (block, members) in groups {
            let mut text = String::new();
            let mut segments = Vec::with_capacity(members.len());
            for node in members {
                let t = tree.text(node).unwrap_or_default();
                segments.push(Segment {
                    node,
                    start: text.len(),
                    len: t.len(),
                });
                text.push_str(t);
            }
            let mut boundaries: Vec<usize> = text.grapheme_indices(true).map(|(i, _)| i).collect();
            let bidi = ParagraphBidi::analyze(&text, &boundaries, explicit_direction(tree, block));
            boundaries.push(text.len());

            let mut para = Paragraph {
                text,
                segments,
                boundaries,
                bidi,
                lines: Vec::new(),
                y,
            };
            para.lines = wrap_lines(&para, metrics.wrap_columns);
            let pi = paragraphs.len();
            for li in 0..para.lines.len() {
                lines.push((pi, li));
            }
            let line_count = i32::try_from(para.lines.len()).unwrap_or(i32::MAX);
            y = y.saturating_add(line_count.saturating_mul(metrics.line_height));
            paragraphs.push(para);
        }

        Self {
            paragraphs,
            order,
            lines,
        }
    }

    pub(crate) fn preorder_index(&self, node: NodeId) -> Option<usize> {
        self.order
            .get(node.0 as usize)
            .copied()
            .filter(|&i| i != usize::MAX)
    }

    /// Map a position to `(paragraph, byte offset)`, snapping to a grapheme
    /// boundary.
    pub(crate) fn locate(&self, pos: Position) -> Option<(usize, usize)> {
        for (pi, para) in self.paragraphs.iter().enumerate() {
            if let Some(seg) = para.segments.iter().find(|s| s.node == pos.node) {
                let raw = seg.start + pos.offset.min(seg.len);
                let g = para.grapheme_floor(raw);
                return Some((pi, para.byte_of(g)));
            }
        }
        None
    }

    /// Canonical position for a paragraph offset.
    ///
    /// A boundary shared by two text nodes maps to the start of the later
    /// node, except at the paragraph end.
    pub(crate) fn position_at(&self, pi: usize, offset: usize) -> Option<Position> {
        let para = self.paragraphs.get(pi)?;
        let seg = para
            .segments
            .iter()
            .find(|s| s.start <= offset && offset < s.end())
            .or_else(|| para.segments.iter().rev().find(|s| s.start <= offset))?;
        Some(Position::new(seg.node, (offset - seg.start).min(seg.len)))
    }

    pub(crate) fn position_at_grapheme(&self, pi: usize, g: usize) -> Option<Position> {
        let para = self.paragraphs.get(pi)?;
        self.position_at(pi, para.byte_of(g))
    }

    pub(crate) fn compare(&self, a: Position, b: Position) -> Option<Ordering> {
        let a = self.locate(a)?;
        let b = self.locate(b)?;
        Some(a.cmp(&b))
    }

    /// Segments in document order as `(paragraph, segment)`.
    pub(crate) fn segments(&self) -> impl Iterator<Item = (usize, &Segment)> {
        self.paragraphs
            .iter()
            .enumerate()
            .flat_map(|(pi, p)| p.segments.iter().map(move |s| (pi, s)))
    }

    /// Index into `self.lines` of a paragraph-local line.
    pub(crate) fn global_line(&self, pi: usize, li: usize) -> Option<usize> {
        self.lines.iter().position(|&(p, l)| p == pi && l == li)
    }
}

fn explicit_direction(tree: &Tree, block: NodeId) -> Option<TextDirection> {
    std::iter::once(block)
        .chain(tree.ancestors(block))
        .find_map(|n| tree.element(n).and_then(|e| e.dir))
}

fn is_space(g: &str) -> bool {
    !g.is_empty() && g.chars().all(char::is_whitespace)
}

/// Greedy wrap at `columns` graphemes, breaking after the last whitespace
/// that fits; words longer than a line are split hard.
fn wrap_lines(para: &Paragraph, columns: usize) -> Vec<LineBox> {
    let n = para.grapheme_count();
    let columns = columns.max(1);
    let mut ranges = Vec::new();
    let mut start = 0usize;
    while start < n {
        if n - start <= columns {
            ranges.push(start..n);
            break;
        }
        let limit = start + columns;
        let brk = (start..limit)
            .rev()
            .find(|&i| is_space(para.grapheme(i)))
            .map(|i| i + 1)
            .filter(|&e| e > start)
            .unwrap_or(limit);
        ranges.push(start..brk);
        start = brk;
    }
    if ranges.is_empty() {
        ranges.push(0..0);
    }

    let base = para.bidi.base_level();
    ranges
        .into_iter()
        .map(|range| {
            let levels = para.bidi.levels.get(range.clone()).unwrap_or(&[]);
            let trailing_ws = range
                .clone()
                .rev()
                .take_while(|&g| is_space(para.grapheme(g)))
                .count();
            let visual = reorder_line(levels, trailing_ws, base)
                .into_iter()
                .map(|i| i + range.start)
                .collect();
            LineBox {
                graphemes: range,
                visual,
            }
        })
        .collect()
}
