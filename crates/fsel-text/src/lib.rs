#![forbid(unsafe_code)]

//! Text: a reference editable document for the selection engine.
//!
//! # Role in fsel
//! `fsel-text` is the stand-in for a browser's DOM and render tree. It owns
//! an arena of block/inline elements and text nodes and answers every query
//! the engine makes through [`fsel_core::DocumentModel`] and
//! [`fsel_core::LayoutProvider`].
//!
//! # Primary responsibilities
//! - **Tree**: elements with editability, direction, style and password
//!   attributes; text nodes holding UTF-8.
//! - **Stepping**: grapheme clusters, word runs, sentences, wrapped lines,
//!   paragraphs and document edges.
//! - **Bidi**: paragraph direction and per-grapheme embedding levels from
//!   `unicode-bidi`, reordered line by line.
//! - **Layout**: fixed-cell metrics, greedy word wrap, caret and highlight
//!   rectangles, nearest-x hit testing.
//!
//! # Example
//! ```
//! use fsel_core::{DocumentModel, Granularity, LogicalDirection, Position};
//! use fsel_text::TextDocument;
//!
//! let doc = TextDocument::from_paragraphs(&["hello world"]);
//! let text = doc.text_nodes()[0];
//! let next = doc.next_position(
//!     Position::new(text, 0),
//!     Granularity::Word,
//!     LogicalDirection::Forward,
//! );
//! assert_eq!(next, Some(Position::new(text, 5)));
//! ```

mod bidi;
mod boundary;
pub mod document;
pub mod layout;
mod snapshot;
pub mod tree;

pub use document::TextDocument;
pub use layout::LayoutMetrics;
pub use tree::{Display, ElementData};
