#![forbid(unsafe_code)]

//! Selection: the caret and selection state machine.
//!
//! # Role in fsel
//! `fsel-selection` owns "where is the caret, what is selected" for one
//! document. It turns user intents (move by word, extend to line end, select
//! all, go down a page) into new [`Selection`] values, keeps them valid as
//! the document mutates, and tracks caret geometry and blink state for
//! painting.
//!
//! # How it fits in the system
//! The controller reads the document and layout through the
//! [`fsel_core::EditingFrame`] contracts and reports back through the
//! embedder hooks in [`host`]. `fsel-text` provides a reference frame; any
//! other implementation of the two traits works the same way.
//!
//! # Example
//! ```
//! use std::rc::Rc;
//!
//! use fsel_core::{Granularity, Position, SelectionDirection};
//! use fsel_selection::{Alteration, SelectionController};
//! use fsel_text::{ElementData, TextDocument};
//!
//! let doc = Rc::new(TextDocument::with_root(ElementData::block().editable(true)));
//! let text = doc.append_paragraph(doc.root(), "hello world").unwrap();
//!
//! let mut selection = SelectionController::new(&doc);
//! selection.move_to(Position::new(text, 0), true);
//! selection.modify(
//!     Alteration::Extend,
//!     SelectionDirection::Forward,
//!     Granularity::Word,
//!     true,
//! );
//! assert_eq!(selection.selected_text(), "hello");
//! ```
//!
//! # Feature flags
//! - `tracing` (default): `selection.commit` and `selection.modify` spans,
//!   no-op and mutation-hook events.
//! - `config`: load [`SelectionConfig`] from TOML or JSON.

mod bidi;
pub mod caret;
pub mod config;
pub mod controller;
pub mod host;
pub mod options;
pub mod selection;

pub use caret::{CaretBlinker, CaretCanvas, CaretState, DragCaret};
pub use config::{BidiConfig, CaretConfig, ConfigError, EditingBehavior, SelectionConfig};
pub use controller::SelectionController;
pub use host::{EditingPolicy, FocusController, SelectionChange, SelectionObserver};
pub use options::{Alteration, SetSelectionOptions};
pub use selection::{Selection, SelectionRange, SelectionType};
