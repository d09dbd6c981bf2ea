#![forbid(unsafe_code)]

//! Core: geometry, positions, and collaborator contracts.
//!
//! # Role in fsel
//! `fsel-core` is the shared vocabulary. It owns the value types every other
//! crate speaks ([`Position`], [`Granularity`], [`Rect`]) and the traits the
//! selection engine consumes from the outside world: [`DocumentModel`] for
//! tree queries and granularity stepping, [`LayoutProvider`] for caret
//! geometry.
//!
//! # How it fits in the system
//! `fsel-text` implements both contracts for an in-memory document;
//! `fsel-selection` drives them. Nothing here performs layout or owns a tree.

pub mod geometry;
pub mod host;
pub mod position;
pub mod style;

pub use geometry::{Point, Rect, Transform};
pub use host::{CursorAlignOnScroll, DocumentModel, EditingFrame, LayoutProvider};
pub use position::{
    Affinity, BidiRun, Granularity, LogicalDirection, NodeId, Position, SelectionDirection,
    TextDirection, VerticalDirection,
};
pub use style::EditingStyle;
