#![forbid(unsafe_code)]

//! Granularity stepping over a [`Snapshot`].
//!
//! Word movement uses the same three grapheme classes as a terminal text
//! cursor (whitespace, word characters, punctuation). Positions are
//! `(paragraph, grapheme)` pairs; crossing a paragraph edge counts as one
//! step.

use fsel_core::{Granularity, LogicalDirection};
use unicode_segmentation::UnicodeSegmentation;

use crate::layout::{self, LayoutMetrics};
use crate::snapshot::{Paragraph, Snapshot};

/// `(paragraph index, grapheme index)`.
pub(crate) type Cursor = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GraphemeClass {
    Space,
    Word,
    Punct,
}

fn grapheme_class(g: &str) -> GraphemeClass {
    if g.chars().all(char::is_whitespace) {
        GraphemeClass::Space
    } else if g.chars().any(char::is_alphanumeric) {
        GraphemeClass::Word
    } else {
        GraphemeClass::Punct
    }
}

/// Step `at` by one unit. `None` when nothing lies in that direction.
pub(crate) fn step(
    snap: &Snapshot,
    metrics: &LayoutMetrics,
    at: Cursor,
    granularity: Granularity,
    direction: LogicalDirection,
) -> Option<Cursor> {
    let forward = direction == LogicalDirection::Forward;
    let para = snap.paragraphs.get(at.0)?;
    let (pi, g) = (at.0, at.1.min(para.grapheme_count()));
    let next = match granularity {
        Granularity::Character => character(snap, pi, g, forward),
        Granularity::Word => word(snap, pi, g, forward),
        Granularity::Sentence => sentence(snap, pi, g, forward),
        Granularity::Line => layout::adjacent_line_cursor(snap, metrics, (pi, g), forward),
        Granularity::Paragraph => paragraph(snap, pi, g, forward),
        Granularity::SentenceBoundary => Some((pi, sentence_boundary(para, g, forward))),
        Granularity::LineBoundary => Some((pi, line_boundary(para, g, forward))),
        Granularity::ParagraphBoundary => {
            Some((pi, if forward { para.grapheme_count() } else { 0 }))
        }
        Granularity::DocumentBoundary => {
            if forward {
                let last = snap.paragraphs.len() - 1;
                Some((last, snap.paragraphs[last].grapheme_count()))
            } else {
                Some((0, 0))
            }
        }
    };
    match next {
        Some(n) if !granularity.is_boundary() && n == (pi, g) => None,
        other => other,
    }
}

fn previous_paragraph_end(snap: &Snapshot, pi: usize) -> Option<Cursor> {
    let prev = pi.checked_sub(1)?;
    Some((prev, snap.paragraphs[prev].grapheme_count()))
}

fn next_paragraph_start(snap: &Snapshot, pi: usize) -> Option<Cursor> {
    (pi + 1 < snap.paragraphs.len()).then_some((pi + 1, 0))
}

fn character(snap: &Snapshot, pi: usize, g: usize, forward: bool) -> Option<Cursor> {
    let n = snap.paragraphs[pi].grapheme_count();
    if forward {
        if g < n {
            Some((pi, g + 1))
        } else {
            next_paragraph_start(snap, pi)
        }
    } else if g > 0 {
        Some((pi, g - 1))
    } else {
        previous_paragraph_end(snap, pi)
    }
}

fn word(snap: &Snapshot, pi: usize, g: usize, forward: bool) -> Option<Cursor> {
    let para = &snap.paragraphs[pi];
    let n = para.grapheme_count();
    let class = |i: usize| grapheme_class(para.grapheme(i));
    if forward {
        if g >= n {
            return next_paragraph_start(snap, pi);
        }
        let mut pos = g;
        while pos < n && class(pos) == GraphemeClass::Space {
            pos += 1;
        }
        if pos < n {
            let target = class(pos);
            while pos < n && class(pos) == target {
                pos += 1;
            }
        }
        Some((pi, pos))
    } else {
        if g == 0 {
            return previous_paragraph_end(snap, pi);
        }
        let mut pos = g;
        while pos > 0 && class(pos - 1) == GraphemeClass::Space {
            pos -= 1;
        }
        if pos > 0 {
            let target = class(pos - 1);
            while pos > 0 && class(pos - 1) == target {
                pos -= 1;
            }
        }
        Some((pi, pos))
    }
}

/// Sentence spans of a paragraph as `(start, trimmed end)` grapheme indices.
fn sentences(para: &Paragraph) -> Vec<(usize, usize)> {
    para.text
        .split_sentence_bound_indices()
        .map(|(start, s)| {
            let end = start + s.trim_end().len();
            (para.grapheme_floor(start), para.grapheme_floor(end))
        })
        .collect()
}

fn sentence(snap: &Snapshot, pi: usize, g: usize, forward: bool) -> Option<Cursor> {
    let para = &snap.paragraphs[pi];
    let spans = sentences(para);
    if forward {
        if g >= para.grapheme_count() {
            let next = next_paragraph_start(snap, pi)?;
            let first_end = sentences(&snap.paragraphs[next.0])
                .first()
                .map_or(0, |&(_, e)| e);
            return Some((next.0, first_end));
        }
        let target = spans
            .iter()
            .map(|&(_, end)| end)
            .find(|&end| end > g)
            .unwrap_or(para.grapheme_count());
        Some((pi, target))
    } else {
        if g == 0 {
            let prev = pi.checked_sub(1)?;
            let last_start = sentences(&snap.paragraphs[prev])
                .last()
                .map_or(0, |&(s, _)| s);
            return Some((prev, last_start));
        }
        let target = spans
            .iter()
            .rev()
            .map(|&(start, _)| start)
            .find(|&start| start < g)
            .unwrap_or(0);
        Some((pi, target))
    }
}

fn sentence_boundary(para: &Paragraph, g: usize, forward: bool) -> usize {
    let spans = sentences(para);
    let current = spans
        .iter()
        .rev()
        .find(|&&(start, _)| start <= g)
        .copied()
        .unwrap_or((0, 0));
    if forward {
        current.1.max(g)
    } else {
        current.0
    }
}

fn line_boundary(para: &Paragraph, g: usize, forward: bool) -> usize {
    let li = para.line_of(g, false);
    let Some(line) = para.lines.get(li) else {
        return g;
    };
    if !forward {
        return line.graphemes.start;
    }
    let end = line.graphemes.end;
    let wrapped = li + 1 < para.lines.len();
    if wrapped && end > line.graphemes.start && para.grapheme(end - 1).chars().all(char::is_whitespace)
    {
        end - 1
    } else {
        end
    }
}

fn paragraph(snap: &Snapshot, pi: usize, g: usize, forward: bool) -> Option<Cursor> {
    if forward {
        next_paragraph_start(snap, pi).or(Some((pi, snap.paragraphs[pi].grapheme_count())))
    } else if g > 0 {
        Some((pi, 0))
    } else {
        pi.checked_sub(1).map(|p| (p, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{ElementData, NodeKind, Tree};

    fn snapshot(paragraphs: &[&str], columns: usize) -> (Snapshot, LayoutMetrics) {
        let mut tree = Tree::new(ElementData::block());
        for text in paragraphs {
            let p = tree
                .append(tree.root(), NodeKind::Element(ElementData::block()))
                .unwrap();
            tree.append(p, NodeKind::Text((*text).into())).unwrap();
        }
        let metrics = LayoutMetrics {
            wrap_columns: columns,
            ..LayoutMetrics::default()
        };
        (Snapshot::build(&tree, &metrics), metrics)
    }

    fn fwd(snap: &(Snapshot, LayoutMetrics), at: Cursor, g: Granularity) -> Option<Cursor> {
        step(&snap.0, &snap.1, at, g, LogicalDirection::Forward)
    }

    fn back(snap: &(Snapshot, LayoutMetrics), at: Cursor, g: Granularity) -> Option<Cursor> {
        step(&snap.0, &snap.1, at, g, LogicalDirection::Backward)
    }

    #[test]
    fn character_crosses_paragraphs() {
        let s = snapshot(&["ab", "cd"], 80);
        assert_eq!(fwd(&s, (0, 1), Granularity::Character), Some((0, 2)));
        assert_eq!(fwd(&s, (0, 2), Granularity::Character), Some((1, 0)));
        assert_eq!(back(&s, (1, 0), Granularity::Character), Some((0, 2)));
        assert_eq!(back(&s, (0, 0), Granularity::Character), None);
        assert_eq!(fwd(&s, (1, 2), Granularity::Character), None);
    }

    #[test]
    fn word_movement_respects_classes() {
        let s = snapshot(&["hello, world"], 80);
        assert_eq!(fwd(&s, (0, 0), Granularity::Word), Some((0, 5)));
        assert_eq!(fwd(&s, (0, 5), Granularity::Word), Some((0, 6)));
        assert_eq!(fwd(&s, (0, 6), Granularity::Word), Some((0, 12)));
        assert_eq!(back(&s, (0, 12), Granularity::Word), Some((0, 7)));
        assert_eq!(back(&s, (0, 7), Granularity::Word), Some((0, 5)));
    }

    #[test]
    fn sentences_end_before_trailing_space() {
        let s = snapshot(&["One two. Three four."], 80);
        assert_eq!(fwd(&s, (0, 0), Granularity::Sentence), Some((0, 8)));
        assert_eq!(fwd(&s, (0, 8), Granularity::Sentence), Some((0, 20)));
        assert_eq!(back(&s, (0, 20), Granularity::Sentence), Some((0, 9)));
        assert_eq!(back(&s, (0, 9), Granularity::Sentence), Some((0, 0)));
        assert_eq!(
            fwd(&s, (0, 3), Granularity::SentenceBoundary),
            Some((0, 8))
        );
    }

    #[test]
    fn line_boundaries_on_wrapped_paragraph() {
        let s = snapshot(&["aaa bbb ccc"], 5);
        assert_eq!(fwd(&s, (0, 1), Granularity::LineBoundary), Some((0, 3)));
        assert_eq!(back(&s, (0, 6), Granularity::LineBoundary), Some((0, 4)));
        assert_eq!(fwd(&s, (0, 9), Granularity::LineBoundary), Some((0, 11)));
    }

    #[test]
    fn paragraph_and_document_edges() {
        let s = snapshot(&["ab", "cd", "ef"], 80);
        assert_eq!(fwd(&s, (0, 1), Granularity::Paragraph), Some((1, 0)));
        assert_eq!(fwd(&s, (2, 0), Granularity::Paragraph), Some((2, 2)));
        assert_eq!(back(&s, (1, 1), Granularity::Paragraph), Some((1, 0)));
        assert_eq!(back(&s, (1, 0), Granularity::Paragraph), Some((0, 0)));
        assert_eq!(fwd(&s, (0, 0), Granularity::DocumentBoundary), Some((2, 2)));
        assert_eq!(back(&s, (2, 1), Granularity::DocumentBoundary), Some((0, 0)));
        assert_eq!(
            back(&s, (0, 0), Granularity::DocumentBoundary),
            Some((0, 0)),
            "boundary granularities may stay put"
        );
    }
}
