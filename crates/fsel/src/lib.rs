#![forbid(unsafe_code)]

//! fsel public facade crate.
//!
//! Re-exports the value types, the selection engine and the reference
//! document, and offers [`Editor`]: a document paired with its selection
//! controller that routes mutations through the controller's hooks in the
//! right order.

use std::fmt;
use std::rc::Rc;

// --- Core re-exports -------------------------------------------------------

pub use fsel_core::{
    Affinity, CursorAlignOnScroll, DocumentModel, EditingFrame, EditingStyle, Granularity,
    LayoutProvider, LogicalDirection, NodeId, Point, Position, Rect, SelectionDirection,
    TextDirection, Transform, VerticalDirection,
};

// --- Engine re-exports -----------------------------------------------------

pub use fsel_selection::{
    Alteration, CaretCanvas, ConfigError, EditingBehavior, EditingPolicy, FocusController,
    Selection, SelectionChange, SelectionConfig, SelectionController, SelectionObserver,
    SelectionRange, SelectionType, SetSelectionOptions,
};

// --- Document re-exports ---------------------------------------------------

pub use fsel_text::{ElementData, LayoutMetrics, TextDocument};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for fsel.
#[derive(Debug)]
pub enum Error {
    /// Configuration could not be loaded or failed validation.
    Config(ConfigError),
    /// A document edit did not apply (unknown node or bad range).
    Edit(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Edit(msg) => write!(f, "edit rejected: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Edit(_) => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Standard result type for fsel APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Editor ----------------------------------------------------------------

/// A [`TextDocument`] with the selection controller bound to it.
///
/// Edits made through the editor notify the controller before a subtree is
/// detached and after text is replaced, so the selection never points into
/// content that no longer exists.
pub struct Editor {
    document: Rc<TextDocument>,
    selection: SelectionController,
}

impl Editor {
    pub fn new(document: TextDocument) -> Self {
        Self::with_config(document, SelectionConfig::default())
    }

    pub fn with_config(document: TextDocument, config: SelectionConfig) -> Self {
        let document = Rc::new(document);
        let selection = SelectionController::with_config(&document, config);
        Self {
            document,
            selection,
        }
    }

    /// Editable document with one paragraph per entry.
    pub fn from_paragraphs(paragraphs: &[&str]) -> Self {
        let document = TextDocument::with_root(ElementData::block().editable(true));
        let root = document.root();
        for text in paragraphs {
            document.append_paragraph(root, text);
        }
        Self::new(document)
    }

    /// Build with a configuration read from TOML.
    #[cfg(feature = "config")]
    pub fn from_toml_config(document: TextDocument, toml: &str) -> Result<Self> {
        let config = SelectionConfig::from_toml_str(toml)?;
        Ok(Self::with_config(document, config))
    }

    pub fn document(&self) -> &TextDocument {
        &self.document
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionController {
        &mut self.selection
    }

    /// Detach `node` and its subtree.
    pub fn remove_node(&mut self, node: NodeId) -> Result<()> {
        if !self.document.contains_node(node) {
            return Err(Error::Edit(format!("no node {node}")));
        }
        self.selection.node_will_be_removed(node);
        if self.document.remove_node(node) {
            Ok(())
        } else {
            Err(Error::Edit(format!("cannot remove {node}")))
        }
    }

    /// Replace `old_len` bytes at `offset` in text node `node` with `text`.
    pub fn replace_text(&mut self, node: NodeId, offset: usize, old_len: usize, text: &str) -> Result<()> {
        if !self.document.replace_text(node, offset, old_len, text) {
            return Err(Error::Edit(format!(
                "cannot replace {old_len} bytes at {node}@{offset}"
            )));
        }
        self.selection
            .text_was_replaced(node, offset, old_len, text.len());
        Ok(())
    }

    /// Swap the selected text for `text` through [`Self::replace_text`].
    ///
    /// A scripting aid for driving the mutation hooks in tests and demos,
    /// not an editing command: no undo, no style handling, and only ranges
    /// inside a single text node. Leaves a caret after the inserted text.
    pub fn insert_text(&mut self, text: &str) -> Result<()> {
        let Some(range) = self.selection.to_normalized_range() else {
            return Err(Error::Edit("nothing selected".into()));
        };
        if range.start.node != range.end.node {
            return Err(Error::Edit("range spans several text nodes".into()));
        }
        if self.selection.is_range() && !self.selection.should_delete_selection(self.selection.selection()) {
            return Err(Error::Edit("deletion vetoed".into()));
        }
        let node = range.start.node;
        let old_len = range.end.offset - range.start.offset;
        self.replace_text(node, range.start.offset, old_len, text)?;
        self.selection
            .move_to(Position::new(node, range.start.offset + text.len()), true);
        Ok(())
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

// --- Prelude ----------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Affinity, Alteration, Editor, Error, Granularity, Position, Result, Selection,
        SelectionController, SelectionDirection, SetSelectionOptions, TextDocument,
        VerticalDirection,
    };

    pub use crate::{core, selection, text};
}

pub use fsel_core as core;
pub use fsel_selection as selection;
pub use fsel_text as text;
