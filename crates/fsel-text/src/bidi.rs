#![forbid(unsafe_code)]

//! Bidi analysis for a paragraph.
//!
//! Embedding levels come from `unicode-bidi`; line reordering (rules L1 and
//! L2) is done here on grapheme granularity so that a cluster never splits.

use fsel_core::TextDirection;
use unicode_bidi::{BidiInfo, Level};

/// Resolved levels for one paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParagraphBidi {
    pub(crate) direction: TextDirection,
    /// Embedding level per grapheme, in logical order.
    pub(crate) levels: Vec<u8>,
}

impl ParagraphBidi {
    /// Analyze `text` whose grapheme starts are `grapheme_starts`.
    ///
    /// `explicit` forces the base direction; otherwise the first strong
    /// character decides, defaulting to left-to-right.
    pub(crate) fn analyze(
        text: &str,
        grapheme_starts: &[usize],
        explicit: Option<TextDirection>,
    ) -> Self {
        let default_level = explicit.map(|d| match d {
            TextDirection::Ltr => Level::ltr(),
            TextDirection::Rtl => Level::rtl(),
        });
        if text.is_empty() {
            return Self {
                direction: explicit.unwrap_or_default(),
                levels: Vec::new(),
            };
        }
        let info = BidiInfo::new(text, default_level);
        let direction = match explicit {
            Some(d) => d,
            None => match info.paragraphs.first() {
                Some(p) if p.level.is_rtl() => TextDirection::Rtl,
                _ => TextDirection::Ltr,
            },
        };
        let levels = grapheme_starts
            .iter()
            .map(|&b| info.levels.get(b).map_or(0, |l| l.number()))
            .collect();
        Self { direction, levels }
    }

    pub(crate) fn base_level(&self) -> u8 {
        match self.direction {
            TextDirection::Ltr => 0,
            TextDirection::Rtl => 1,
        }
    }
}

/// Visual order of a line's graphemes.
///
/// `levels` are the logical-order levels of the graphemes on the line and
/// `trailing_ws` how many of the last graphemes are whitespace (reset to the
/// paragraph level per rule L1). Returns logical indices in left-to-right
/// visual order.
pub(crate) fn reorder_line(levels: &[u8], trailing_ws: usize, base_level: u8) -> Vec<usize> {
    let n = levels.len();
    let mut levels = levels.to_vec();
    for level in levels.iter_mut().skip(n.saturating_sub(trailing_ws)) {
        *level = base_level;
    }
    let mut order: Vec<usize> = (0..n).collect();
    let Some(&highest) = levels.iter().max() else {
        return order;
    };
    let lowest_odd = levels
        .iter()
        .copied()
        .filter(|l| l % 2 == 1)
        .min()
        .unwrap_or(highest + 1);

    // Rule L2: from the highest level down to the lowest odd level, reverse
    // every maximal sequence at that level or higher.
    let mut level = highest;
    while level >= lowest_odd && level > 0 {
        let mut i = 0;
        while i < n {
            if levels[order[i]] >= level {
                let start = i;
                while i < n && levels[order[i]] >= level {
                    i += 1;
                }
                order[start..i].reverse();
            } else {
                i += 1;
            }
        }
        level -= 1;
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use unicode_segmentation::UnicodeSegmentation;

    fn starts(text: &str) -> Vec<usize> {
        text.grapheme_indices(true).map(|(i, _)| i).collect()
    }

    #[test]
    fn pure_ltr_is_identity() {
        let text = "hello";
        let bidi = ParagraphBidi::analyze(text, &starts(text), None);
        assert_eq!(bidi.direction, TextDirection::Ltr);
        assert_eq!(reorder_line(&bidi.levels, 0, 0), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn hebrew_paragraph_auto_detects_rtl() {
        let text = "\u{05D0}\u{05D1}\u{05D2}";
        let bidi = ParagraphBidi::analyze(text, &starts(text), None);
        assert_eq!(bidi.direction, TextDirection::Rtl);
        assert_eq!(reorder_line(&bidi.levels, 0, 1), vec![2, 1, 0]);
    }

    #[test]
    fn embedded_run_is_reversed_in_place() {
        let text = "ab \u{05D0}\u{05D1}\u{05D2} cd";
        let bidi = ParagraphBidi::analyze(text, &starts(text), None);
        assert_eq!(bidi.levels, vec![0, 0, 0, 1, 1, 1, 0, 0, 0]);
        assert_eq!(
            reorder_line(&bidi.levels, 0, 0),
            vec![0, 1, 2, 5, 4, 3, 6, 7, 8]
        );
    }

    #[test]
    fn explicit_direction_wins() {
        let text = "abc";
        let bidi = ParagraphBidi::analyze(text, &starts(text), Some(TextDirection::Rtl));
        assert_eq!(bidi.direction, TextDirection::Rtl);
        assert_eq!(bidi.base_level(), 1);
    }
}
