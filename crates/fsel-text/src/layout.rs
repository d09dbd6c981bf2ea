#![forbid(unsafe_code)]

//! Monospace line layout.
//!
//! Every grapheme occupies one `char_width` cell. Lines stack vertically in
//! document order starting at `origin`; within a line, cells follow the
//! visual order computed by the bidi pass. Caret x coordinates are edges
//! between cells.

use fsel_core::{Point, Rect, Transform};

use crate::boundary::Cursor;
use crate::snapshot::{Paragraph, Snapshot};

/// Fixed metrics of the monospace layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutMetrics {
    /// Advance of one grapheme cell.
    pub char_width: i32,
    /// Height of one line box.
    pub line_height: i32,
    /// Graphemes per line before soft wrapping.
    pub wrap_columns: usize,
    /// Absolute position of the first line's top-left corner.
    pub origin: Point,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            char_width: 8,
            line_height: 16,
            wrap_columns: 80,
            origin: Point::new(0, 0),
        }
    }
}

fn slot_of(para: &Paragraph, li: usize, g: usize) -> Option<usize> {
    para.lines.get(li)?.visual.iter().position(|&v| v == g)
}

/// Local x of the caret at boundary `g` on line `li`.
///
/// The caret hugs the grapheme after it (downstream) or before it
/// (upstream); which side of that grapheme's cell depends on its level.
pub(crate) fn caret_x(para: &Paragraph, li: usize, g: usize, upstream: bool, cw: i32) -> i32 {
    let Some(line) = para.lines.get(li) else {
        return 0;
    };
    let (a, b) = (line.graphemes.start, line.graphemes.end);
    if a == b {
        return 0;
    }
    let (k, leading) = if (upstream && g > a) || g >= b {
        (g - 1, false)
    } else {
        (g.max(a), true)
    };
    let Some(slot) = slot_of(para, li, k) else {
        return 0;
    };
    let rtl = para
        .bidi
        .levels
        .get(k)
        .is_some_and(|level| level % 2 == 1);
    let edge = if leading != rtl { slot } else { slot + 1 };
    i32::try_from(edge).unwrap_or(i32::MAX).saturating_mul(cw)
}

/// Local-to-absolute transform of a paragraph box.
pub(crate) fn paragraph_transform(snap: &Snapshot, metrics: &LayoutMetrics, pi: usize) -> Transform {
    let y = snap.paragraphs.get(pi).map_or(0, |p| p.y);
    Transform::translation(metrics.origin.x, metrics.origin.y.saturating_add(y))
}

fn line_top(li: usize, metrics: &LayoutMetrics) -> i32 {
    i32::try_from(li)
        .unwrap_or(i32::MAX)
        .saturating_mul(metrics.line_height)
}

/// Caret rectangle relative to the paragraph box.
pub(crate) fn local_caret_rect(
    snap: &Snapshot,
    metrics: &LayoutMetrics,
    at: Cursor,
    upstream: bool,
) -> Option<Rect> {
    let para = snap.paragraphs.get(at.0)?;
    let li = para.line_of(at.1, upstream);
    let x = caret_x(para, li, at.1, upstream, metrics.char_width);
    Some(Rect::new(x, line_top(li, metrics), 1, metrics.line_height))
}

/// Cursor on the line above or below `at` whose caret is nearest to the
/// absolute `x`.
pub(crate) fn adjacent_line_at_x(
    snap: &Snapshot,
    metrics: &LayoutMetrics,
    at: Cursor,
    upstream: bool,
    forward: bool,
    x: i32,
) -> Option<Cursor> {
    let para = snap.paragraphs.get(at.0)?;
    let current = snap.global_line(at.0, para.line_of(at.1, upstream))?;
    let target = if forward {
        current + 1
    } else {
        current.checked_sub(1)?
    };
    let &(tpi, tli) = snap.lines.get(target)?;
    let tpara = snap.paragraphs.get(tpi)?;
    let line = tpara.lines.get(tli)?;
    let (a, mut b) = (line.graphemes.start, line.graphemes.end);
    // The end of a wrapped line is the start of the next one.
    if tli + 1 < tpara.lines.len() && b > a {
        b -= 1;
    }
    (a..=b)
        .min_by_key(|&c| {
            let cx = metrics
                .origin
                .x
                .saturating_add(caret_x(tpara, tli, c, false, metrics.char_width));
            (cx - x).unsigned_abs()
        })
        .map(|c| (tpi, c))
}

/// Line step that keeps the caret's own x.
pub(crate) fn adjacent_line_cursor(
    snap: &Snapshot,
    metrics: &LayoutMetrics,
    at: Cursor,
    forward: bool,
) -> Option<Cursor> {
    let local = local_caret_rect(snap, metrics, at, false)?;
    let x = paragraph_transform(snap, metrics, at.0).map_rect(local).x;
    adjacent_line_at_x(snap, metrics, at, false, forward, x)
}

/// Absolute highlight rectangles for the ordered range `[start, end)`.
///
/// Visually contiguous cells on a line merge into one rectangle, so a range
/// crossing a bidi run boundary may produce several per line.
pub(crate) fn selection_rects(
    snap: &Snapshot,
    metrics: &LayoutMetrics,
    start: Cursor,
    end: Cursor,
) -> Vec<Rect> {
    let mut rects = Vec::new();
    if start >= end {
        return rects;
    }
    let cw = metrics.char_width;
    for &(pi, li) in &snap.lines {
        if pi < start.0 || pi > end.0 {
            continue;
        }
        let Some(para) = snap.paragraphs.get(pi) else {
            continue;
        };
        let Some(line) = para.lines.get(li) else {
            continue;
        };
        let lo = if pi == start.0 { start.1 } else { 0 };
        let hi = if pi == end.0 {
            end.1
        } else {
            para.grapheme_count()
        };
        let from = lo.max(line.graphemes.start);
        let to = hi.min(line.graphemes.end);
        if from >= to {
            continue;
        }
        let mut slots: Vec<usize> = (from..to)
            .filter_map(|g| slot_of(para, li, g))
            .collect();
        slots.sort_unstable();

        let top = metrics
            .origin
            .y
            .saturating_add(para.y)
            .saturating_add(line_top(li, metrics));
        let mut run: Option<(usize, usize)> = None;
        let flush = |run: (usize, usize), rects: &mut Vec<Rect>| {
            let x = i32::try_from(run.0).unwrap_or(i32::MAX).saturating_mul(cw);
            let w = i32::try_from(run.1 - run.0 + 1)
                .unwrap_or(i32::MAX)
                .saturating_mul(cw);
            rects.push(Rect::new(
                metrics.origin.x.saturating_add(x),
                top,
                w,
                metrics.line_height,
            ));
        };
        for slot in slots {
            run = match run {
                Some((s, e)) if slot == e + 1 => Some((s, slot)),
                Some(r) => {
                    flush(r, &mut rects);
                    Some((slot, slot))
                }
                None => Some((slot, slot)),
            };
        }
        if let Some(r) = run {
            flush(r, &mut rects);
        }
    }
    rects
}
