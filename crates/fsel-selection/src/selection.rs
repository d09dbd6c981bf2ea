#![forbid(unsafe_code)]

//! The selection value object.
//!
//! A [`Selection`] is immutable once built: the controller swaps a whole new
//! value in on every change and readers holding the previous `Rc` keep a
//! consistent snapshot.
//!
//! # Invariants
//!
//! 1. `start <= end` in document order.
//! 2. `start == end` iff the type is [`SelectionType::Caret`], iff
//!    `base == extent`.
//! 3. All four endpoints are `None` iff the type is [`SelectionType::None`].
//! 4. Endpoints are canonical positions of the document they were built
//!    against.

use std::cmp::Ordering;
use std::fmt;

use fsel_core::{Affinity, DocumentModel, Granularity, LogicalDirection, Position};

/// Shape of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum SelectionType {
    #[default]
    None,
    Caret,
    Range,
}

impl SelectionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            SelectionType::None => "none",
            SelectionType::Caret => "caret",
            SelectionType::Range => "range",
        }
    }
}

/// An ordered `[start, end]` pair without direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionRange {
    pub start: Position,
    pub end: Position,
}

impl SelectionRange {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for SelectionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Base/extent pair with its normalized start/end.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct Selection {
    base: Option<Position>,
    extent: Option<Position>,
    start: Option<Position>,
    end: Option<Position>,
    affinity: Affinity,
    kind: SelectionType,
    base_is_first: bool,
    is_directional: bool,
}

impl Selection {
    /// The empty selection.
    pub fn none() -> Self {
        Self {
            base_is_first: true,
            ..Self::default()
        }
    }

    /// Build from a base and an extent.
    ///
    /// Both ends are canonicalized against `doc`. An end that does not
    /// resolve is dropped: with one survivor the result is a caret there,
    /// with none it is [`Selection::none`]. Ranges always carry downstream
    /// affinity.
    pub fn new<D>(base: Position, extent: Position, affinity: Affinity, doc: &D) -> Self
    where
        D: DocumentModel + ?Sized,
    {
        let base = doc.canonical_position(base);
        let extent = doc.canonical_position(extent);
        let (base, extent) = match (base, extent) {
            (Some(b), Some(e)) => (b, e),
            (Some(p), None) | (None, Some(p)) => (p, p),
            (None, None) => return Self::none(),
        };
        let order = if base == extent {
            Ordering::Equal
        } else {
            doc.compare_positions(base, extent)
                .unwrap_or(Ordering::Equal)
        };
        match order {
            Ordering::Equal => Self {
                base: Some(base),
                extent: Some(base),
                start: Some(base),
                end: Some(base),
                affinity,
                kind: SelectionType::Caret,
                base_is_first: true,
                is_directional: false,
            },
            Ordering::Less | Ordering::Greater => {
                let base_is_first = order == Ordering::Less;
                let (start, end) = if base_is_first {
                    (base, extent)
                } else {
                    (extent, base)
                };
                Self {
                    base: Some(base),
                    extent: Some(extent),
                    start: Some(start),
                    end: Some(end),
                    affinity: Affinity::Downstream,
                    kind: SelectionType::Range,
                    base_is_first,
                    is_directional: false,
                }
            }
        }
    }

    /// A caret at `pos`.
    pub fn caret<D>(pos: Position, affinity: Affinity, doc: &D) -> Self
    where
        D: DocumentModel + ?Sized,
    {
        Self::new(pos, pos, affinity, doc)
    }

    /// A caret at `pos` taken as-is, for positions that must not be
    /// re-canonicalized against a document about to change.
    pub(crate) fn caret_unchecked(pos: Position, affinity: Affinity) -> Self {
        Self {
            base: Some(pos),
            extent: Some(pos),
            start: Some(pos),
            end: Some(pos),
            affinity,
            kind: SelectionType::Caret,
            base_is_first: true,
            is_directional: false,
        }
    }

    /// A forward selection over `range`.
    pub fn from_range<D>(range: SelectionRange, affinity: Affinity, doc: &D) -> Self
    where
        D: DocumentModel + ?Sized,
    {
        Self::new(range.start, range.end, affinity, doc)
    }

    #[must_use]
    pub fn with_directional(mut self, directional: bool) -> Self {
        self.is_directional = directional;
        self
    }

    pub fn base(&self) -> Option<Position> {
        self.base
    }

    pub fn extent(&self) -> Option<Position> {
        self.extent
    }

    pub fn start(&self) -> Option<Position> {
        self.start
    }

    pub fn end(&self) -> Option<Position> {
        self.end
    }

    pub fn affinity(&self) -> Affinity {
        self.affinity
    }

    pub fn selection_type(&self) -> SelectionType {
        self.kind
    }

    pub fn is_none(&self) -> bool {
        self.kind == SelectionType::None
    }

    pub fn is_caret(&self) -> bool {
        self.kind == SelectionType::Caret
    }

    pub fn is_range(&self) -> bool {
        self.kind == SelectionType::Range
    }

    /// Whether the base precedes the extent. Carets and `None` report `true`.
    pub fn is_base_first(&self) -> bool {
        self.base_is_first
    }

    /// Whether extension keeps the base fixed regardless of the requested
    /// direction.
    pub fn is_directional(&self) -> bool {
        self.is_directional
    }

    pub fn to_normalized_range(&self) -> Option<SelectionRange> {
        Some(SelectionRange::new(self.start?, self.end?))
    }

    /// Grow start and end outward to `granularity` boundaries.
    ///
    /// `Character` returns the selection unchanged. Line, sentence and
    /// paragraph map onto their boundary granularities; words are found by
    /// stepping out and back.
    pub fn expand_to<D>(&self, granularity: Granularity, doc: &D) -> Selection
    where
        D: DocumentModel + ?Sized,
    {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return self.clone();
        };
        let boundary = match granularity {
            Granularity::Character => return self.clone(),
            Granularity::Word => None,
            Granularity::Sentence | Granularity::SentenceBoundary => {
                Some(Granularity::SentenceBoundary)
            }
            Granularity::Line | Granularity::LineBoundary => Some(Granularity::LineBoundary),
            Granularity::Paragraph | Granularity::ParagraphBoundary => {
                Some(Granularity::ParagraphBoundary)
            }
            Granularity::DocumentBoundary => Some(Granularity::DocumentBoundary),
        };
        let (new_start, new_end) = match boundary {
            Some(g) => (
                doc.next_position(start, g, LogicalDirection::Backward)
                    .unwrap_or(start),
                doc.next_position(end, g, LogicalDirection::Forward)
                    .unwrap_or(end),
            ),
            None => (word_start(doc, start), word_end(doc, end)),
        };
        let expanded = if self.base_is_first {
            Selection::new(new_start, new_end, self.affinity, doc)
        } else {
            Selection::new(new_end, new_start, self.affinity, doc)
        };
        expanded.with_directional(self.is_directional)
    }
}

fn word_start<D: DocumentModel + ?Sized>(doc: &D, pos: Position) -> Position {
    doc.next_position(pos, Granularity::Word, LogicalDirection::Forward)
        .and_then(|after| doc.next_position(after, Granularity::Word, LogicalDirection::Backward))
        .filter(|&cand| doc.compare_positions(cand, pos) != Some(Ordering::Greater))
        .or_else(|| doc.next_position(pos, Granularity::Word, LogicalDirection::Backward))
        .unwrap_or(pos)
}

fn word_end<D: DocumentModel + ?Sized>(doc: &D, pos: Position) -> Position {
    doc.next_position(pos, Granularity::Word, LogicalDirection::Backward)
        .and_then(|before| doc.next_position(before, Granularity::Word, LogicalDirection::Forward))
        .filter(|&cand| doc.compare_positions(cand, pos) != Some(Ordering::Less))
        .or_else(|| doc.next_position(pos, Granularity::Word, LogicalDirection::Forward))
        .unwrap_or(pos)
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.base, self.extent) {
            (SelectionType::Caret, Some(pos), _) => write!(f, "caret {pos} ({:?})", self.affinity),
            (SelectionType::Range, Some(base), Some(extent)) => {
                write!(f, "range {base} -> {extent}")?;
                if self.is_directional {
                    f.write_str(" directional")?;
                }
                Ok(())
            }
            _ => f.write_str("none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsel_text::TextDocument;

    fn doc() -> (TextDocument, fsel_core::NodeId) {
        let doc = TextDocument::from_paragraphs(&["hello world. Second one."]);
        let node = doc.text_nodes()[0];
        (doc, node)
    }

    #[test]
    fn backward_pair_normalizes() {
        let (doc, n) = doc();
        let sel = Selection::new(Position::new(n, 8), Position::new(n, 2), Affinity::Upstream, &doc);
        assert!(sel.is_range());
        assert!(!sel.is_base_first());
        assert_eq!(sel.start(), Some(Position::new(n, 2)));
        assert_eq!(sel.end(), Some(Position::new(n, 8)));
        assert_eq!(sel.affinity(), Affinity::Downstream);
    }

    #[test]
    fn equal_ends_make_a_caret() {
        let (doc, n) = doc();
        let sel = Selection::caret(Position::new(n, 3), Affinity::Upstream, &doc);
        assert!(sel.is_caret());
        assert_eq!(sel.base(), sel.extent());
        assert_eq!(sel.affinity(), Affinity::Upstream);
        assert_eq!(sel.to_string(), format!("caret {n}@3 (Upstream)"));
    }

    #[test]
    fn unresolvable_ends_degrade() {
        let (doc, n) = doc();
        let bogus = Position::new(fsel_core::NodeId(999), 0);
        let one = Selection::new(bogus, Position::new(n, 4), Affinity::Downstream, &doc);
        assert!(one.is_caret());
        assert_eq!(one.start(), Some(Position::new(n, 4)));
        let none = Selection::new(bogus, bogus, Affinity::Downstream, &doc);
        assert!(none.is_none());
        assert_eq!(none, Selection::none());
        assert_eq!(none.to_normalized_range(), None);
    }

    #[test]
    fn expand_to_word_and_sentence() {
        let (doc, n) = doc();
        let caret = Selection::caret(Position::new(n, 2), Affinity::Downstream, &doc);
        let word = caret.expand_to(Granularity::Word, &doc);
        assert_eq!(
            word.to_normalized_range(),
            Some(SelectionRange::new(Position::new(n, 0), Position::new(n, 5)))
        );
        let sentence = caret.expand_to(Granularity::Sentence, &doc);
        assert_eq!(
            sentence.to_normalized_range(),
            Some(SelectionRange::new(Position::new(n, 0), Position::new(n, 12)))
        );
        let para = caret.expand_to(Granularity::Paragraph, &doc);
        assert_eq!(para.end(), Some(Position::new(n, 24)));
        assert_eq!(caret.expand_to(Granularity::Character, &doc), caret);
    }
}
