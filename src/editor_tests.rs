use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::collab::{ChangeListener, CodeHighlighter, TableCollaborator, UndoStore};
use crate::document::inline::has_real_text;
use crate::document::{Inline, List, ListItem, Table};

fn editor(blocks: Vec<Block>) -> Editor {
    Editor::from_blocks(blocks)
}

fn bullet(items: Vec<ListItem>) -> Block {
    Block::List(List::bullet(items))
}

fn place(editor: &mut Editor, stop: usize, offset: usize) {
    let node = editor.stops()[stop].node;
    assert!(editor.set_cursor(Position::new(node, offset)));
}

fn assert_cursor(editor: &Editor, stop: usize, offset: usize) {
    assert_eq!(
        editor.cursor(),
        Position::new(editor.stops()[stop].node, offset)
    );
}

fn assert_canonical(editor: &Editor) {
    assert!(editor.document().check_invariants().is_ok());
    let mut copy = editor.document().clone();
    normalize(&mut copy);
    assert_eq!(copy.to_blocks(), editor.document().to_blocks());
}

fn assert_preserve_flags(items: &[ListItem]) {
    for item in items {
        let expected = !has_real_text(&item.content) && item.nested.is_some();
        assert_eq!(item.preserve_empty, expected, "item {:?}", item.content);
        if let Some(nested) = &item.nested {
            assert_preserve_flags(&nested.items);
        }
    }
}

// ============================================================================
// Structural edits across block kinds
// ============================================================================

#[test]
fn backspace_at_nested_item_start_outdents() {
    let mut editor = editor(vec![bullet(vec![
        ListItem::new("a").with_nested(List::bullet(vec![ListItem::new("b")])),
    ])]);
    place(&mut editor, 1, 0);

    assert!(editor.backspace());

    assert_eq!(
        editor.cleaned_tree(),
        vec![bullet(vec![ListItem::new("a"), ListItem::new("b")])]
    );
    assert_cursor(&editor, 1, 0);
    assert_canonical(&editor);
}

#[test]
fn enter_on_empty_checkbox_item_promotes_nested_items() {
    let mut editor = editor(vec![bullet(vec![
        ListItem::task(true, "").with_nested(List::bullet(vec![ListItem::new("child")])),
    ])]);
    place(&mut editor, 0, 1);

    assert!(editor.enter());

    assert_eq!(
        editor.cleaned_tree(),
        vec![bullet(vec![ListItem::new("child")])]
    );
    assert_cursor(&editor, 0, 0);
    assert_canonical(&editor);
}

#[test]
fn enter_at_end_of_item_with_nested_list_inserts_two_items() {
    let mut editor = editor(vec![bullet(vec![
        ListItem::new("a").with_nested(List::bullet(vec![ListItem::new("b")])),
    ])]);
    place(&mut editor, 0, 1);

    assert!(editor.enter());

    assert_eq!(
        editor.cleaned_tree(),
        vec![bullet(vec![
            ListItem::new("a"),
            ListItem::empty(),
            ListItem::empty().with_nested(List::bullet(vec![ListItem::new("b")])),
        ])]
    );
    assert_cursor(&editor, 1, 0);
    assert_canonical(&editor);
}

#[test]
fn enter_at_end_of_code_adds_a_blank_line_pair() {
    let mut editor = editor(vec![Block::code(None, &["x"])]);
    place(&mut editor, 0, 1);

    assert!(editor.enter());

    assert_eq!(editor.cleaned_tree(), vec![Block::code(None, &["x", "", ""])]);
    assert_cursor(&editor, 0, 3);
}

#[test]
fn arrow_down_from_last_rule_appends_paragraph() {
    let mut editor = editor(vec![Block::paragraph("p"), Block::HorizontalRule]);
    place(&mut editor, 1, 0);

    assert!(editor.move_down());

    assert_eq!(
        editor.cleaned_tree(),
        vec![
            Block::paragraph("p"),
            Block::HorizontalRule,
            Block::paragraph("")
        ]
    );
    assert_cursor(&editor, 2, 0);
}

// ============================================================================
// Enter
// ============================================================================

#[test]
fn enter_mid_checkbox_item_gives_tail_a_fresh_checkbox() {
    let mut editor = editor(vec![bullet(vec![ListItem::task(true, "ab")])]);
    place(&mut editor, 0, 2);

    assert!(editor.enter());

    assert_eq!(
        editor.cleaned_tree(),
        vec![bullet(vec![
            ListItem::task(true, "a"),
            ListItem::task(false, "b")
        ])]
    );
    assert_cursor(&editor, 1, 1);
}

#[test]
fn enter_mid_item_moves_nested_list_to_tail() {
    let mut editor = editor(vec![bullet(vec![
        ListItem::new("ab").with_nested(List::bullet(vec![ListItem::new("c")])),
    ])]);
    place(&mut editor, 0, 1);

    assert!(editor.enter());

    assert_eq!(
        editor.cleaned_tree(),
        vec![bullet(vec![
            ListItem::new("a"),
            ListItem::new("b").with_nested(List::bullet(vec![ListItem::new("c")])),
        ])]
    );
}

#[test]
fn enter_on_checkbox_toggles_it() {
    let mut editor = editor(vec![bullet(vec![ListItem::task(false, "a")])]);
    place(&mut editor, 0, 0);

    assert!(editor.enter());

    assert_eq!(
        editor.cleaned_tree(),
        vec![bullet(vec![ListItem::task(true, "a")])]
    );
    assert_eq!(editor.current_checklist_item_state(), Some(true));
}

#[test]
fn enter_at_checkbox_item_start_dismisses_the_checkbox() {
    let mut editor = editor(vec![bullet(vec![
        ListItem::task(false, "a"),
        ListItem::task(false, "b"),
    ])]);
    place(&mut editor, 1, 1);

    assert!(editor.enter());

    assert_eq!(
        editor.cleaned_tree(),
        vec![
            bullet(vec![ListItem::task(false, "a")]),
            Block::paragraph("b")
        ]
    );
    assert_cursor(&editor, 1, 0);
}

#[test]
fn enter_at_nested_checkbox_start_keeps_text_with_its_checkbox() {
    let mut editor = editor(vec![bullet(vec![
        ListItem::new("a").with_nested(List::bullet(vec![ListItem::task(true, "b")])),
    ])]);
    place(&mut editor, 1, 1);

    assert!(editor.enter());

    assert_eq!(
        editor.cleaned_tree(),
        vec![bullet(vec![ListItem::new("a").with_nested(List::bullet(vec![
            ListItem::task(false, ""),
            ListItem::task(true, "b"),
        ]))])]
    );
    assert_cursor(&editor, 2, 1);
    assert_canonical(&editor);
}

#[test]
fn enter_at_start_of_checkbox_item_with_children_opens_item_above() {
    let mut editor = editor(vec![bullet(vec![
        ListItem::task(true, "b").with_nested(List::bullet(vec![ListItem::new("c")])),
    ])]);
    place(&mut editor, 0, 1);

    assert!(editor.enter());

    assert_eq!(
        editor.cleaned_tree(),
        vec![bullet(vec![
            ListItem::task(false, ""),
            ListItem::task(true, "b").with_nested(List::bullet(vec![ListItem::new("c")])),
        ])]
    );
    assert_cursor(&editor, 1, 1);
    assert_canonical(&editor);
}

#[test]
fn enter_on_empty_top_level_item_converts_to_paragraph() {
    let mut editor = editor(vec![bullet(vec![
        ListItem::new("a"),
        ListItem::empty(),
        ListItem::new("c"),
    ])]);
    place(&mut editor, 1, 0);

    assert!(editor.enter());

    assert_eq!(
        editor.cleaned_tree(),
        vec![
            bullet(vec![ListItem::new("a")]),
            Block::paragraph(""),
            bullet(vec![ListItem::new("c")]),
        ]
    );
    assert_canonical(&editor);
}

#[test]
fn enter_on_empty_nested_item_outdents_it() {
    let mut editor = editor(vec![bullet(vec![ListItem::new("a").with_nested(
        List::bullet(vec![ListItem::new("b"), ListItem::empty()]),
    )])]);
    place(&mut editor, 2, 0);

    assert!(editor.enter());

    assert_eq!(
        editor.cleaned_tree(),
        vec![bullet(vec![
            ListItem::new("a").with_nested(List::bullet(vec![ListItem::new("b")])),
            ListItem::empty(),
        ])]
    );
}

#[test]
fn enter_splits_paragraph() {
    let mut editor = editor(vec![Block::paragraph("hello")]);
    place(&mut editor, 0, 2);

    assert!(editor.enter());

    assert_eq!(
        editor.cleaned_tree(),
        vec![Block::paragraph("he"), Block::paragraph("llo")]
    );
    assert_cursor(&editor, 1, 0);
}

#[test]
fn enter_at_heading_end_opens_paragraph() {
    let mut editor = editor(vec![Block::heading(1, "Title")]);
    place(&mut editor, 0, 5);

    assert!(editor.enter());

    assert_eq!(
        editor.cleaned_tree(),
        vec![Block::heading(1, "Title"), Block::paragraph("")]
    );
    assert_cursor(&editor, 1, 0);
}

#[test]
fn enter_at_heading_start_inserts_paragraph_before() {
    let mut editor = editor(vec![Block::heading(2, "Title")]);
    place(&mut editor, 0, 0);

    assert!(editor.enter());

    assert_eq!(
        editor.cleaned_tree(),
        vec![Block::paragraph(""), Block::heading(2, "Title")]
    );
    assert_cursor(&editor, 1, 0);
}

#[test]
fn enter_after_fence_opens_code_block() {
    let mut editor = editor(vec![Block::paragraph("```rust")]);
    place(&mut editor, 0, 7);

    assert!(editor.enter());

    assert_eq!(
        editor.cleaned_tree(),
        vec![Block::code(Some("rust"), &[""])]
    );
    assert_cursor(&editor, 0, 0);
}

#[test]
fn enter_at_quote_paragraph_start_splits_quote() {
    let mut editor = editor(vec![Block::quote(&["a", "b", "c"])]);
    place(&mut editor, 1, 0);

    assert!(editor.enter());

    assert_eq!(
        editor.cleaned_tree(),
        vec![
            Block::quote(&["a"]),
            Block::paragraph("b"),
            Block::quote(&["c"])
        ]
    );
    assert_cursor(&editor, 1, 0);
}

#[test]
fn enter_on_image_opens_paragraph_on_the_caret_side() {
    let image = Block::Image(crate::document::Image::new("cat.png", "cat"));
    let mut editor = editor(vec![image.clone()]);
    place(&mut editor, 0, 1);

    assert!(editor.enter());

    assert_eq!(
        editor.cleaned_tree(),
        vec![image.clone(), Block::paragraph("")]
    );

    place(&mut editor, 0, 0);
    assert!(editor.enter());
    assert_eq!(
        editor.cleaned_tree(),
        vec![Block::paragraph(""), image, Block::paragraph("")]
    );
}

// ============================================================================
// Backspace / Delete
// ============================================================================

#[test]
fn backspace_at_top_level_item_start_converts_to_paragraph() {
    let mut editor = editor(vec![bullet(vec![
        ListItem::new("a"),
        ListItem::task(false, " b"),
        ListItem::new("c"),
    ])]);
    place(&mut editor, 1, 1);

    assert!(editor.backspace());

    assert_eq!(
        editor.cleaned_tree(),
        vec![
            bullet(vec![ListItem::new("a")]),
            Block::paragraph("b"),
            bullet(vec![ListItem::new("c")]),
        ]
    );
}

#[test]
fn backspace_keeps_nested_list_when_text_disappears() {
    let mut editor = editor(vec![bullet(vec![
        ListItem::new("x").with_nested(List::bullet(vec![ListItem::new("child")])),
    ])]);
    place(&mut editor, 0, 1);

    assert!(editor.backspace());

    assert_eq!(
        editor.cleaned_tree(),
        vec![bullet(vec![ListItem::empty().with_nested(List::bullet(
            vec![ListItem::new("child")]
        ))])]
    );
    assert_canonical(&editor);
}

#[test]
fn backspace_on_empty_heading_makes_paragraph() {
    let mut editor = editor(vec![Block::paragraph("a"), Block::heading(1, "")]);
    place(&mut editor, 1, 0);

    assert!(editor.backspace());

    assert_eq!(
        editor.cleaned_tree(),
        vec![Block::paragraph("a"), Block::paragraph("")]
    );
}

#[test]
fn backspace_at_first_quote_paragraph_lifts_it_out() {
    let mut editor = editor(vec![Block::paragraph("x"), Block::quote(&["a", "b"])]);
    place(&mut editor, 1, 0);

    assert!(editor.backspace());

    assert_eq!(
        editor.cleaned_tree(),
        vec![
            Block::paragraph("x"),
            Block::paragraph("a"),
            Block::quote(&["b"])
        ]
    );
}

#[test]
fn backspace_merges_paragraphs() {
    let mut editor = editor(vec![Block::paragraph("ab"), Block::paragraph("cd")]);
    place(&mut editor, 1, 0);

    assert!(editor.backspace());

    assert_eq!(editor.cleaned_tree(), vec![Block::paragraph("abcd")]);
    assert_cursor(&editor, 0, 2);
}

#[test]
fn backspace_at_document_start_is_a_noop() {
    let mut editor = editor(vec![Block::paragraph("ab")]);
    place(&mut editor, 0, 0);

    assert!(!editor.backspace());

    assert_eq!(editor.cleaned_tree(), vec![Block::paragraph("ab")]);
    assert_cursor(&editor, 0, 0);
}

#[test]
fn backspace_after_rule_removes_the_rule() {
    let mut editor = editor(vec![Block::HorizontalRule, Block::paragraph("x")]);
    place(&mut editor, 1, 0);

    assert!(editor.backspace());

    assert_eq!(editor.cleaned_tree(), vec![Block::paragraph("x")]);
    assert_cursor(&editor, 0, 0);
}

#[test]
fn backspace_on_selected_rule_moves_to_previous_block() {
    let mut editor = editor(vec![
        Block::paragraph("a"),
        Block::HorizontalRule,
        Block::paragraph("b"),
    ]);
    place(&mut editor, 1, 0);

    assert!(editor.backspace());

    assert_eq!(
        editor.cleaned_tree(),
        vec![Block::paragraph("a"), Block::paragraph("b")]
    );
    assert_cursor(&editor, 0, 1);
}

#[test]
fn backspace_at_code_start_turns_it_into_paragraph() {
    let mut editor = editor(vec![Block::code(None, &["a", "b"])]);
    place(&mut editor, 0, 0);

    assert!(editor.backspace());

    assert_eq!(
        editor.cleaned_tree(),
        vec![Block::Paragraph(vec![
            Inline::text("a"),
            Inline::LineBreak,
            Inline::text("b")
        ])]
    );
}

#[test]
fn backspace_in_empty_code_block_removes_it() {
    let mut editor = editor(vec![Block::paragraph("x"), Block::code(None, &[""])]);
    place(&mut editor, 1, 0);

    assert!(editor.backspace());

    assert_eq!(editor.cleaned_tree(), vec![Block::paragraph("x")]);
    assert_cursor(&editor, 0, 1);
}

#[test]
fn removing_the_only_block_leaves_an_empty_paragraph() {
    let mut editor = editor(vec![Block::code(None, &[""])]);

    assert!(editor.backspace());

    assert_eq!(editor.cleaned_tree(), vec![Block::paragraph("")]);
    assert_cursor(&editor, 0, 0);
}

#[test]
fn delete_at_item_end_merges_next_item() {
    let mut editor = editor(vec![bullet(vec![ListItem::new("a"), ListItem::new("b")])]);
    place(&mut editor, 0, 1);

    assert!(editor.delete());

    assert_eq!(editor.cleaned_tree(), vec![bullet(vec![ListItem::new("ab")])]);
    assert_cursor(&editor, 0, 1);
}

#[test]
fn delete_on_checkbox_removes_it() {
    let mut editor = editor(vec![bullet(vec![ListItem::task(false, "a")])]);
    place(&mut editor, 0, 0);

    assert!(editor.delete());

    assert_eq!(editor.cleaned_tree(), vec![bullet(vec![ListItem::new("a")])]);
}

#[test]
fn delete_inside_text_removes_next_character() {
    let mut editor = editor(vec![Block::paragraph("abc")]);
    place(&mut editor, 0, 1);

    assert!(editor.delete());

    assert_eq!(editor.cleaned_tree(), vec![Block::paragraph("ac")]);
    assert_cursor(&editor, 0, 1);
}

#[test]
fn deleting_last_struck_character_unwraps_the_strike() {
    let mut editor = editor(vec![Block::Paragraph(vec![
        Inline::text("a"),
        Inline::strike(vec![Inline::text("b")]),
    ])]);
    place(&mut editor, 0, 2);

    assert!(editor.backspace());

    assert_eq!(
        editor.cleaned_tree(),
        vec![Block::Paragraph(vec![Inline::text("a")])]
    );
    assert_cursor(&editor, 0, 1);
    assert_canonical(&editor);
}

#[test]
fn emptied_strike_in_item_leaves_a_plain_empty_item() {
    let mut editor = editor(vec![bullet(vec![
        ListItem::new("a"),
        ListItem::empty().with_content(vec![Inline::strike(vec![Inline::text("x")])]),
    ])]);
    place(&mut editor, 1, 1);

    assert!(editor.backspace());

    assert_eq!(
        editor.cleaned_tree(),
        vec![bullet(vec![ListItem::new("a"), ListItem::empty()])]
    );
    assert_canonical(&editor);
}

// ============================================================================
// Tab, text input, selections
// ============================================================================

#[test]
fn tab_in_code_inserts_indent_and_shift_tab_removes_it() {
    let mut editor = editor(vec![Block::code(None, &["x"])]);
    place(&mut editor, 0, 0);

    assert!(editor.indent());
    assert_eq!(editor.cleaned_tree(), vec![Block::code(None, &["\tx"])]);
    assert_cursor(&editor, 0, 1);

    assert!(editor.outdent());
    assert_eq!(editor.cleaned_tree(), vec![Block::code(None, &["x"])]);
    assert_cursor(&editor, 0, 0);
}

#[test]
fn tab_in_paragraph_does_nothing() {
    let mut editor = editor(vec![Block::paragraph("x")]);
    assert!(!editor.indent());
    assert!(!editor.outdent());
    assert_eq!(editor.cleaned_tree(), vec![Block::paragraph("x")]);
}

#[test]
fn typed_newline_becomes_line_break() {
    let mut editor = editor(vec![Block::paragraph("")]);

    assert!(editor.insert_text("a\nb"));

    assert_eq!(
        editor.cleaned_tree(),
        vec![Block::Paragraph(vec![
            Inline::text("a"),
            Inline::LineBreak,
            Inline::text("b")
        ])]
    );
    assert_cursor(&editor, 0, 3);
}

#[test]
fn typing_on_checkbox_goes_to_text_start() {
    let mut editor = editor(vec![bullet(vec![ListItem::task(false, "b")])]);
    place(&mut editor, 0, 0);

    assert!(editor.insert_char('a'));

    assert_eq!(
        editor.cleaned_tree(),
        vec![bullet(vec![ListItem::task(false, "ab")])]
    );
    assert_cursor(&editor, 0, 2);
}

#[test]
fn text_input_runs_in_two_phases() {
    let mut editor = editor(vec![Block::paragraph("")]);

    assert!(editor.apply(Intent::InsertText("x".to_string())).is_changed());
    assert!(editor.has_pending_fixup());
    assert!(editor.reconcile());
    assert!(!editor.has_pending_fixup());
    assert_cursor(&editor, 0, 1);
}

#[test]
fn typing_into_empty_item_replaces_anchor() {
    let mut editor = editor(vec![bullet(vec![ListItem::empty()])]);

    assert!(editor.insert_text("hi"));

    assert_eq!(editor.cleaned_tree(), vec![bullet(vec![ListItem::new("hi")])]);
    assert_canonical(&editor);
}

#[test]
fn backspace_deletes_selected_range_across_blocks() {
    let mut editor = editor(vec![Block::paragraph("hello"), Block::paragraph("world")]);
    let first = editor.stops()[0].node;
    let second = editor.stops()[1].node;
    assert!(editor.set_selection(Selection::new(
        Position::new(first, 2),
        Position::new(second, 3)
    )));

    assert!(editor.backspace());

    assert_eq!(editor.cleaned_tree(), vec![Block::paragraph("held")]);
    assert_cursor(&editor, 0, 2);
}

#[test]
fn typing_replaces_backwards_selection() {
    let mut editor = editor(vec![Block::paragraph("hello"), Block::paragraph("world")]);
    let first = editor.stops()[0].node;
    let second = editor.stops()[1].node;
    assert!(editor.set_selection(Selection::new(
        Position::new(second, 3),
        Position::new(first, 2)
    )));

    assert!(editor.insert_text("y"));

    assert_eq!(editor.cleaned_tree(), vec![Block::paragraph("heyld")]);
    assert_cursor(&editor, 0, 3);
}

#[test]
fn selection_inside_one_block_is_deleted() {
    let mut editor = editor(vec![Block::paragraph("abcdef")]);
    let node = editor.stops()[0].node;
    assert!(editor.set_selection(Selection::new(Position::new(node, 1), Position::new(node, 4))));

    assert!(editor.delete());

    assert_eq!(editor.cleaned_tree(), vec![Block::paragraph("aef")]);
    assert_cursor(&editor, 0, 1);
}

#[test]
fn selection_from_image_right_edge_keeps_the_image() {
    let image = Block::Image(crate::document::Image::new("cat.png", "cat"));
    let mut editor = editor(vec![image.clone(), Block::paragraph("abc")]);
    let picture = editor.stops()[0].node;
    let text = editor.stops()[1].node;
    assert!(editor.set_selection(Selection::new(
        Position::new(picture, 1),
        Position::new(text, 1)
    )));

    assert!(editor.backspace());

    assert_eq!(editor.cleaned_tree(), vec![image, Block::paragraph("bc")]);
    assert_cursor(&editor, 1, 0);
    assert_canonical(&editor);
}

#[test]
fn selection_from_image_left_edge_removes_the_image() {
    let image = Block::Image(crate::document::Image::new("cat.png", "cat"));
    let mut editor = editor(vec![image, Block::paragraph("abc")]);
    let picture = editor.stops()[0].node;
    let text = editor.stops()[1].node;
    assert!(editor.set_selection(Selection::new(
        Position::new(picture, 0),
        Position::new(text, 1)
    )));

    assert!(editor.backspace());

    assert_eq!(editor.cleaned_tree(), vec![Block::paragraph("bc")]);
    assert_cursor(&editor, 0, 0);
}

#[test]
fn toggle_checkbox_intent() {
    let mut editor = editor(vec![bullet(vec![ListItem::task(false, "a")])]);

    assert!(editor.toggle_checkbox());
    assert_eq!(editor.current_checklist_item_state(), Some(true));

    let mut plain = self::editor(vec![Block::paragraph("a")]);
    assert!(!plain.toggle_checkbox());
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn editing_sequences_stay_canonical() {
    let mut editor = editor(vec![
        Block::heading(1, "Plan"),
        bullet(vec![
            ListItem::task(false, "one"),
            ListItem::task(false, "two"),
            ListItem::new("three"),
        ]),
        Block::quote(&["q1", "q2"]),
        Block::code(None, &["x"]),
    ]);
    let intents = [
        Intent::arrow(Direction::Down),
        Intent::arrow(Direction::Down),
        Intent::Tab,
        Intent::LineEnd { extend: false },
        Intent::Enter,
        Intent::Enter,
        Intent::Backspace,
        Intent::ShiftTab,
        Intent::arrow(Direction::Down),
        Intent::Backspace,
        Intent::Enter,
        Intent::arrow(Direction::Down),
        Intent::arrow(Direction::Down),
        Intent::Enter,
        Intent::Delete,
        Intent::Backspace,
        Intent::InsertText("z".to_string()),
    ];
    for intent in intents {
        editor.handle(intent);
        assert_canonical(&editor);
        assert!(editor.document().is_attached(editor.cursor().node));
        for block in editor.document().to_blocks() {
            if let Block::List(list) = block {
                assert_preserve_flags(&list.items);
            }
        }
    }
}

#[test]
fn marker_hidden_for_preserved_items_unless_focused() {
    let mut editor = editor(vec![bullet(vec![
        ListItem::empty().with_nested(List::bullet(vec![ListItem::new("child")])),
    ])]);
    let holder = editor.stops()[0].node;
    let child = editor.stops()[1].node;

    place(&mut editor, 1, 0);
    assert!(!editor.item_marker_visible(holder));
    assert!(editor.item_marker_visible(child));

    place(&mut editor, 0, 0);
    assert!(editor.item_marker_visible(holder));
}

// ============================================================================
// Collaborators
// ============================================================================

#[derive(Clone, Default)]
struct Recorder {
    snapshots: Rc<RefCell<Vec<Snapshot>>>,
    changes: Rc<RefCell<usize>>,
    highlighted: Rc<RefCell<Vec<Vec<String>>>>,
}

impl UndoStore for Recorder {
    fn record(&mut self, snapshot: Snapshot) {
        self.snapshots.borrow_mut().push(snapshot);
    }
}

impl ChangeListener for Recorder {
    fn document_changed(&mut self, _document: &Document) {
        *self.changes.borrow_mut() += 1;
    }
}

impl CodeHighlighter for Recorder {
    fn highlight(&mut self, _block: NodeId, _language: Option<&str>, lines: &[String]) {
        self.highlighted.borrow_mut().push(lines.to_vec());
    }
}

fn with_recorder(editor: &mut Editor) -> Recorder {
    let recorder = Recorder::default();
    editor.set_collaborators(
        Collaborators::default()
            .with_undo(recorder.clone())
            .with_listener(recorder.clone())
            .with_highlighter(recorder.clone()),
    );
    recorder
}

#[test]
fn successful_edits_are_recorded_and_announced() {
    let mut editor = editor(vec![Block::paragraph("ab")]);
    let recorder = with_recorder(&mut editor);
    place(&mut editor, 0, 1);

    assert!(editor.enter());
    assert!(editor.backspace());

    assert_eq!(*recorder.changes.borrow(), 2);
    assert_eq!(recorder.snapshots.borrow().len(), 2);
    let first = recorder.snapshots.borrow()[0].clone();
    assert_eq!(first.document.to_blocks(), vec![Block::paragraph("ab")]);
}

#[test]
fn rejected_edits_notify_nobody() {
    let mut editor = editor(vec![Block::paragraph("ab")]);
    let recorder = with_recorder(&mut editor);
    place(&mut editor, 0, 0);

    assert!(!editor.backspace());
    assert!(!editor.indent());

    assert_eq!(*recorder.changes.borrow(), 0);
    assert!(recorder.snapshots.borrow().is_empty());
}

#[test]
fn restoring_a_snapshot_undoes_the_edit() {
    let mut editor = editor(vec![Block::paragraph("ab")]);
    let recorder = with_recorder(&mut editor);
    place(&mut editor, 0, 1);
    assert!(editor.enter());

    let snapshot = recorder.snapshots.borrow_mut().pop().unwrap();
    editor.restore(snapshot);

    assert_eq!(editor.cleaned_tree(), vec![Block::paragraph("ab")]);
    assert_cursor(&editor, 0, 1);
}

#[test]
fn code_changes_are_highlighted() {
    let mut editor = editor(vec![Block::paragraph("p"), Block::code(None, &["x"])]);
    let recorder = with_recorder(&mut editor);
    place(&mut editor, 1, 1);

    assert!(editor.insert_text("y"));
    place(&mut editor, 0, 1);
    assert!(editor.insert_text("q"));

    assert_eq!(*recorder.highlighted.borrow(), vec![vec!["xy".to_string()]]);
}

struct RowAdder;

impl TableCollaborator for RowAdder {
    fn intercept(&mut self, table: &mut Table, _offset: usize, intent: &Intent) -> TableResponse {
        match intent {
            Intent::Enter => {
                table.rows.push(vec![String::new()]);
                TableResponse::Edited(0)
            }
            _ => TableResponse::Declined,
        }
    }
}

#[test]
fn table_collaborator_is_asked_first() {
    let table = Table {
        rows: vec![vec!["a".to_string()]],
    };
    let mut editor = editor(vec![Block::Table(table)]);
    assert!(!editor.enter());

    editor.set_collaborators(Collaborators::default().with_table(RowAdder));
    assert!(editor.enter());

    let Block::Table(table) = &editor.cleaned_tree()[0] else {
        panic!("expected table");
    };
    assert_eq!(table.rows.len(), 2);
}

#[test]
fn replace_tree_keeps_cursor_on_surviving_node() {
    let mut editor = editor(vec![Block::paragraph("abc")]);
    place(&mut editor, 0, 2);
    let mut document = editor.document().clone();
    let node = editor.cursor().node;
    if let Some(content) = document.content_mut(node) {
        *content = vec![Inline::text("a")];
    }

    editor.replace_tree(document);

    assert_cursor(&editor, 0, 1);
}

#[test]
fn stale_positions_are_rejected() {
    let mut editor = editor(vec![Block::paragraph("ab"), Block::paragraph("cd")]);
    let removed = editor.stops()[1].node;
    place(&mut editor, 1, 0);
    assert!(editor.backspace());

    assert!(!editor.set_cursor(Position::new(removed, 0)));
    assert_cursor(&editor, 0, 2);
}
