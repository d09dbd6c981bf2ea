#![forbid(unsafe_code)]

//! Endpoint adjustment at bidi run boundaries.
//!
//! A logical position on the edge of an embedded run shows up at two visual
//! places. When the user starts a selection on such an edge and drags into
//! the run, the visual anchor they see is the run's far logical edge, so the
//! base moves there. The unadjusted base is remembered by the controller
//! and restored once the extent leaves the run.

use std::cmp::Ordering;

use fsel_core::{DocumentModel, Position};

/// The base to use for `(base, extent)`, or `None` when no adjustment
/// applies.
///
/// Applies only when `extent` lies strictly inside a run whose direction
/// differs from its paragraph and `base` sits exactly on one edge of that
/// run.
pub(crate) fn adjusted_base<D>(doc: &D, base: Position, extent: Position) -> Option<Position>
where
    D: DocumentModel + ?Sized,
{
    let paragraph_rtl = doc.enclosing_block_direction(extent).is_rtl();
    let run = doc.bidi_runs(extent).into_iter().find(|run| {
        doc.compare_positions(run.start, extent) == Some(Ordering::Less)
            && doc.compare_positions(extent, run.end) == Some(Ordering::Less)
    })?;
    if run.is_rtl() == paragraph_rtl {
        return None;
    }
    if doc.compare_positions(base, run.start) == Some(Ordering::Equal) {
        Some(run.end)
    } else if doc.compare_positions(base, run.end) == Some(Ordering::Equal) {
        Some(run.start)
    } else {
        None
    }
}
