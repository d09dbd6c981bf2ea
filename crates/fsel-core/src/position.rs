#![forbid(unsafe_code)]

//! Document positions and the vocabulary used to move them.

use std::fmt;

/// Opaque handle to a node in the document tree.
///
/// Handles are owned by the document collaborator; the engine only compares
/// and forwards them and never assumes the node is still alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A boundary point: a byte offset inside a text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    #[inline]
    pub const fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.node, self.offset)
    }
}

/// Which line a position belongs to when it sits exactly on a soft wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Affinity {
    /// End of the previous line.
    Upstream,
    /// Start of the next line.
    #[default]
    Downstream,
}

/// Base direction of a block or bidi run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    #[inline]
    pub const fn is_rtl(self) -> bool {
        matches!(self, TextDirection::Rtl)
    }
}

/// Direction in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalDirection {
    Forward,
    Backward,
}

/// Requested direction of a horizontal selection change.
///
/// `Left`/`Right` are visual and resolved against the enclosing block
/// direction; `Forward`/`Backward` are always document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectionDirection {
    Forward,
    Backward,
    Right,
    Left,
}

impl SelectionDirection {
    /// Resolve to document order given the block direction.
    pub const fn to_logical(self, block: TextDirection) -> LogicalDirection {
        match (self, block) {
            (SelectionDirection::Forward, _) => LogicalDirection::Forward,
            (SelectionDirection::Backward, _) => LogicalDirection::Backward,
            (SelectionDirection::Right, TextDirection::Ltr)
            | (SelectionDirection::Left, TextDirection::Rtl) => LogicalDirection::Forward,
            (SelectionDirection::Right, TextDirection::Rtl)
            | (SelectionDirection::Left, TextDirection::Ltr) => LogicalDirection::Backward,
        }
    }
}

/// Direction of a block-axis (line to line) move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VerticalDirection {
    Up,
    Down,
}

/// Unit of movement or extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Granularity {
    #[default]
    Character,
    Word,
    Sentence,
    Line,
    Paragraph,
    SentenceBoundary,
    LineBoundary,
    ParagraphBoundary,
    DocumentBoundary,
}

impl Granularity {
    /// Boundary granularities jump to an edge instead of stepping over a unit.
    pub const fn is_boundary(self) -> bool {
        matches!(
            self,
            Granularity::SentenceBoundary
                | Granularity::LineBoundary
                | Granularity::ParagraphBoundary
                | Granularity::DocumentBoundary
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Granularity::Character => "character",
            Granularity::Word => "word",
            Granularity::Sentence => "sentence",
            Granularity::Line => "line",
            Granularity::Paragraph => "paragraph",
            Granularity::SentenceBoundary => "sentence_boundary",
            Granularity::LineBoundary => "line_boundary",
            Granularity::ParagraphBoundary => "paragraph_boundary",
            Granularity::DocumentBoundary => "document_boundary",
        }
    }
}

/// A maximal run of text at one bidi embedding level inside a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidiRun {
    pub start: Position,
    pub end: Position,
    pub level: u8,
}

impl BidiRun {
    #[inline]
    pub const fn is_rtl(&self) -> bool {
        self.level % 2 == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visual_directions_follow_block_direction() {
        use LogicalDirection::*;
        assert_eq!(SelectionDirection::Right.to_logical(TextDirection::Ltr), Forward);
        assert_eq!(SelectionDirection::Right.to_logical(TextDirection::Rtl), Backward);
        assert_eq!(SelectionDirection::Left.to_logical(TextDirection::Rtl), Forward);
        assert_eq!(SelectionDirection::Backward.to_logical(TextDirection::Rtl), Backward);
    }

    #[test]
    fn boundary_granularities() {
        assert!(Granularity::DocumentBoundary.is_boundary());
        assert!(!Granularity::Word.is_boundary());
        assert_eq!(Granularity::default(), Granularity::Character);
    }
}
