#![forbid(unsafe_code)]

//! End-to-end editing through the facade.
//!
//! Run:
//!   cargo test -p fsel --test editor_e2e

use fsel::prelude::*;
use fsel::{DocumentModel, EditingBehavior, SelectionConfig};

#[test]
fn typing_replaces_the_selection() {
    let mut editor = Editor::from_paragraphs(&["hello world"]);
    let node = editor.document().text_nodes()[0];

    let sel = editor.selection_mut();
    sel.move_to(Position::new(node, 6), true);
    sel.modify(
        Alteration::Extend,
        SelectionDirection::Forward,
        Granularity::Word,
        true,
    );
    assert_eq!(editor.selection().selected_text(), "world");

    editor.insert_text("there").unwrap();
    assert_eq!(editor.document().text(node).as_deref(), Some("hello there"));
    assert!(editor.selection().is_caret());
    assert_eq!(editor.selection().selection().start(), Some(Position::new(node, 11)));

    editor.insert_text("!").unwrap();
    assert_eq!(editor.document().text(node).as_deref(), Some("hello there!"));
}

#[test]
fn edits_before_the_selection_keep_it_on_the_same_text() {
    let mut editor = Editor::from_paragraphs(&["abcdefghij"]);
    let node = editor.document().text_nodes()[0];
    editor
        .selection_mut()
        .move_to_range(Position::new(node, 5), Position::new(node, 8), false);

    editor.replace_text(node, 0, 2, "XYZW").unwrap();
    assert_eq!(editor.selection().selected_text(), "fgh");
}

#[test]
fn removing_a_paragraph_moves_the_caret_out() {
    let mut editor = Editor::from_paragraphs(&["one", "two", "three"]);
    let nodes = editor.document().text_nodes();
    editor
        .selection_mut()
        .move_to(Position::new(nodes[1], 1), false);

    let block = editor.document().parent(nodes[1]).unwrap();
    editor.remove_node(block).unwrap();
    assert!(!editor.document().contains_node(nodes[1]));
    assert_eq!(
        editor.selection().selection().start(),
        Some(Position::new(nodes[0], 3))
    );

    let err = editor.remove_node(block).unwrap_err();
    assert!(err.to_string().starts_with("edit rejected"), "{err}");
}

#[test]
fn rejected_edits_leave_everything_alone() {
    let mut editor = Editor::from_paragraphs(&["h\u{e9}llo"]);
    let node = editor.document().text_nodes()[0];
    editor
        .selection_mut()
        .move_to(Position::new(node, 4), false);

    assert!(matches!(
        editor.replace_text(node, 2, 1, "x"),
        Err(Error::Edit(_))
    ));
    assert_eq!(editor.document().text(node).as_deref(), Some("h\u{e9}llo"));
    assert_eq!(
        editor.selection().selection().start(),
        Some(Position::new(node, 4))
    );

    editor.selection_mut().clear();
    assert!(editor.insert_text("x").is_err(), "nothing selected");
}

#[test]
fn mac_behavior_through_config() {
    let config = SelectionConfig {
        behavior: EditingBehavior::Mac,
        ..SelectionConfig::default()
    };
    let document = TextDocument::with_root(fsel::ElementData::block().editable(true));
    let node = document.append_paragraph(document.root(), "alpha beta").unwrap();
    let mut editor = Editor::with_config(document, config);

    editor
        .selection_mut()
        .move_to_range(Position::new(node, 2), Position::new(node, 4), false);
    assert!(editor.selection().selection().is_directional());
}

#[cfg(feature = "config")]
#[test]
fn toml_config_errors_surface_as_facade_errors() {
    let err = Editor::from_toml_config(TextDocument::new(), "[caret]\nwidth = 0\n").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(std::error::Error::source(&err).is_some());

    let editor = Editor::from_toml_config(TextDocument::new(), "behavior = \"windows\"\n").unwrap();
    assert_eq!(editor.selection().config().behavior, EditingBehavior::Windows);
}
