use std::cmp::Ordering;
use std::mem;

use crate::collab::{Collaborators, Snapshot, TableResponse};
use crate::config::EditorConfig;
use crate::document::{Block, Document, NodeId, NodeKind};
use crate::error::{EditError, EditResult};
use crate::intent::{Direction, Intent, Outcome};
use crate::position::{Position, Selection, clamp_to_node, compare_positions};

mod commands;
mod content;
mod cursor;
mod inspect;
mod normalize;
mod structure;

pub use inspect::{Stop, StopKind};
pub use normalize::normalize;

use inspect::{collect_stops, entry_end, entry_start};
use structure::find_indent_target;

/// The caret as `apply` left it, waiting for `reconcile`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Fixup {
    caret: Position,
}

/// Owns the document tree and the selection. Every change goes through the
/// intents; public editing methods report whether anything happened.
pub struct Editor {
    document: Document,
    selection: Selection,
    stops: Vec<Stop>,
    goal_column: Option<usize>,
    pending_fixup: Option<Fixup>,
    config: EditorConfig,
    collaborators: Collaborators,
}

impl Editor {
    pub fn new(document: Document) -> Self {
        Self::with_config(document, EditorConfig::default())
    }

    pub fn with_config(mut document: Document, config: EditorConfig) -> Self {
        normalize(&mut document);
        let stops = collect_stops(&document);
        let cursor = stops
            .first()
            .map(|stop| entry_start(&document, stop))
            .unwrap_or_else(|| Position::new(document.root(), 0));
        Self {
            document,
            selection: Selection::collapsed(cursor),
            stops,
            goal_column: None,
            pending_fixup: None,
            config,
            collaborators: Collaborators::default(),
        }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self::new(Document::from_blocks(blocks))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn cursor(&self) -> Position {
        self.selection.focus
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn set_collaborators(&mut self, collaborators: Collaborators) {
        self.collaborators = collaborators;
    }

    /// The tree handed to the markup converter: anchors stripped.
    pub fn cleaned_tree(&self) -> Vec<Block> {
        self.document.cleaned_tree()
    }

    /// Installs a whole new tree, e.g. from undo or an external reload. The
    /// selection survives when its nodes still exist.
    pub fn replace_tree(&mut self, mut document: Document) {
        normalize(&mut document);
        self.document = document;
        self.stops = collect_stops(&self.document);
        self.goal_column = None;
        self.pending_fixup = None;
        let anchor = self.clamp(self.selection.anchor);
        let focus = self.clamp(self.selection.focus);
        self.selection = match (anchor, focus) {
            (Ok(anchor), Ok(focus)) => Selection::new(anchor, focus),
            (_, Ok(focus)) => Selection::collapsed(focus),
            _ => Selection::collapsed(self.first_position()),
        };
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.replace_tree(snapshot.document);
        self.set_selection(snapshot.selection);
    }

    pub fn set_cursor(&mut self, position: Position) -> bool {
        self.set_selection(Selection::collapsed(position))
    }

    pub fn set_selection(&mut self, selection: Selection) -> bool {
        let (Ok(anchor), Ok(focus)) = (self.clamp(selection.anchor), self.clamp(selection.focus))
        else {
            return false;
        };
        self.selection = Selection::new(anchor, focus);
        self.goal_column = None;
        self.pending_fixup = None;
        true
    }

    pub fn compare_positions(&self, a: &Position, b: &Position) -> Option<Ordering> {
        compare_positions(&self.document, a, b)
    }

    /// Whether a list item shows its marker. Items kept only for their nested
    /// list hide it, unless the caret is inside them.
    pub fn item_marker_visible(&self, item: NodeId) -> bool {
        !self.document.preserve_empty(item) || self.selection.focus.node == item
    }

    pub fn current_checklist_item_state(&self) -> Option<bool> {
        self.document
            .checkbox(self.selection.focus.node)
            .map(|checkbox| checkbox.checked)
    }

    pub fn can_indent_more(&self) -> bool {
        let node = self.selection.focus.node;
        self.document.is_list_item(node) && find_indent_target(&self.document, node).is_some()
    }

    pub fn can_indent_less(&self) -> bool {
        self.document.parent_item(self.selection.focus.node).is_some()
    }

    // ========================================================================
    // Intent dispatch
    // ========================================================================

    /// Runs both phases of an intent.
    pub fn handle(&mut self, intent: Intent) -> Outcome {
        let outcome = self.apply(intent);
        self.reconcile();
        outcome
    }

    /// First phase: changes the tree and leaves the caret where the command
    /// put it. Text insertion leaves a fix-up for [`Editor::reconcile`].
    pub fn apply(&mut self, intent: Intent) -> Outcome {
        self.reconcile();
        if let Some(outcome) = self.offer_to_table(&intent) {
            return outcome;
        }
        match intent {
            Intent::Move { direction, extend } => self.move_cursor(direction, extend),
            Intent::MoveWord { forward, extend } => self.move_word(forward, extend),
            Intent::LineStart { extend } => self.move_to_line_edge(false, extend),
            Intent::LineEnd { extend } => self.move_to_line_edge(true, extend),
            Intent::InsertText(text) => {
                if text.is_empty() {
                    return Outcome::Unchanged;
                }
                let outcome = self.replace_selection(move |document, position, _| {
                    commands::insert_text(document, position, &text)
                });
                if outcome.is_changed() {
                    self.pending_fixup = Some(Fixup {
                        caret: self.selection.focus,
                    });
                }
                outcome
            }
            Intent::InsertLineBreak => self.replace_selection(commands::insert_line_break),
            Intent::Enter => self.replace_selection(commands::enter),
            Intent::Backspace => self.delete_selection_or(commands::backspace),
            Intent::Delete => self.delete_selection_or(commands::delete_forward),
            Intent::Tab => self.transact(commands::tab),
            Intent::ShiftTab => self.transact(commands::shift_tab),
            Intent::ToggleCheckbox => self.transact(commands::toggle_checkbox_at),
        }
    }

    /// Second phase: resolves a pending caret against the normalized tree.
    /// Returns whether a fix-up was pending.
    pub fn reconcile(&mut self) -> bool {
        let Some(fixup) = self.pending_fixup.take() else {
            return false;
        };
        let mut caret = self
            .clamp(fixup.caret)
            .unwrap_or_else(|_| self.first_position());
        let start = self.document.content_start(caret.node);
        if caret.offset < start {
            caret.offset = start;
        }
        self.selection = Selection::collapsed(caret);
        true
    }

    pub fn has_pending_fixup(&self) -> bool {
        self.pending_fixup.is_some()
    }

    // ========================================================================
    // Convenience wrappers
    // ========================================================================

    pub fn enter(&mut self) -> bool {
        self.handle(Intent::Enter).is_changed()
    }

    pub fn backspace(&mut self) -> bool {
        self.handle(Intent::Backspace).is_changed()
    }

    pub fn delete(&mut self) -> bool {
        self.handle(Intent::Delete).is_changed()
    }

    pub fn indent(&mut self) -> bool {
        self.handle(Intent::Tab).is_changed()
    }

    pub fn outdent(&mut self) -> bool {
        self.handle(Intent::ShiftTab).is_changed()
    }

    pub fn insert_text(&mut self, text: &str) -> bool {
        self.handle(Intent::InsertText(text.to_string()))
            .is_changed()
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        self.insert_text(ch.encode_utf8(&mut [0; 4]))
    }

    pub fn insert_line_break(&mut self) -> bool {
        self.handle(Intent::InsertLineBreak).is_changed()
    }

    pub fn toggle_checkbox(&mut self) -> bool {
        self.handle(Intent::ToggleCheckbox).is_changed()
    }

    pub fn move_left(&mut self) -> bool {
        !self.handle(Intent::arrow(Direction::Left)).is_noop()
    }

    pub fn move_right(&mut self) -> bool {
        !self.handle(Intent::arrow(Direction::Right)).is_noop()
    }

    pub fn move_up(&mut self) -> bool {
        !self.handle(Intent::arrow(Direction::Up)).is_noop()
    }

    pub fn move_down(&mut self) -> bool {
        !self.handle(Intent::arrow(Direction::Down)).is_noop()
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Runs a command against the live tree. On failure the tree is put back
    /// exactly as it was; on success the caret, stop list, collaborators and
    /// listeners are brought up to date.
    fn transact<F>(&mut self, command: F) -> Outcome
    where
        F: FnOnce(&mut Document, Position, &EditorConfig) -> EditResult<Position>,
    {
        let before = self.document.clone();
        let previous_selection = self.selection;
        let result = command(&mut self.document, self.selection.focus, &self.config).and_then(
            |position| {
                normalize(&mut self.document);
                self.document.check_invariants()?;
                Ok(position)
            },
        );
        let position = match result {
            Ok(position) => position,
            Err(error) => {
                self.document = before;
                match error {
                    EditError::StructuralInconsistency(_) => {
                        log::warn!("edit rolled back: {error}")
                    }
                    _ => log::debug!("edit rejected: {error}"),
                }
                return Outcome::Unchanged;
            }
        };

        let previous_stops = mem::replace(&mut self.stops, collect_stops(&self.document));
        let position = self.resolve(position, &previous_stops);
        self.selection = Selection::collapsed(position);
        self.goal_column = None;
        self.highlight_changed_code(&before);
        if let Some(undo) = self.collaborators.undo.as_mut() {
            undo.record(Snapshot {
                document: before,
                selection: previous_selection,
            });
        }
        if let Some(listener) = self.collaborators.listener.as_mut() {
            listener.document_changed(&self.document);
        }
        Outcome::Changed
    }

    /// Enter and text input replace a non-collapsed selection.
    fn replace_selection<F>(&mut self, command: F) -> Outcome
    where
        F: FnOnce(&mut Document, Position, &EditorConfig) -> EditResult<Position>,
    {
        if self.selection.is_collapsed() {
            return self.transact(command);
        }
        let (start, end) = self.selection.ordered(&self.document);
        self.transact(move |document, _, config| {
            let position = commands::delete_range(document, start, end)?;
            command(document, position, config)
        })
    }

    /// Backspace and Delete only remove a non-collapsed selection.
    fn delete_selection_or<F>(&mut self, command: F) -> Outcome
    where
        F: FnOnce(&mut Document, Position, &EditorConfig) -> EditResult<Position>,
    {
        if self.selection.is_collapsed() {
            return self.transact(command);
        }
        let (start, end) = self.selection.ordered(&self.document);
        self.transact(move |document, _, _| commands::delete_range(document, start, end))
    }

    fn offer_to_table(&mut self, intent: &Intent) -> Option<Outcome> {
        let focus = self.selection.focus;
        let Some(NodeKind::Table(table)) = self.document.kind(focus.node) else {
            return None;
        };
        let mut edited = table.clone();
        let collaborator = self.collaborators.table.as_mut()?;
        match collaborator.intercept(&mut edited, focus.offset, intent) {
            TableResponse::Declined => None,
            TableResponse::Moved(offset) => {
                self.selection = Selection::collapsed(Position::new(focus.node, offset));
                Some(Outcome::Moved)
            }
            TableResponse::Edited(offset) => Some(self.transact(move |document, position, _| {
                match document.kind_mut(position.node) {
                    Some(NodeKind::Table(table)) => *table = edited,
                    _ => return Err(EditError::InvalidPosition),
                }
                Ok(Position::new(position.node, offset))
            })),
        }
    }

    fn highlight_changed_code(&mut self, before: &Document) {
        let Some(highlighter) = self.collaborators.highlighter.as_mut() else {
            return;
        };
        for stop in self.stops.iter().filter(|stop| stop.kind == StopKind::Code) {
            let Some(NodeKind::CodeBlock { language, lines }) = self.document.kind(stop.node)
            else {
                continue;
            };
            if before.code_lines(stop.node) != Some(lines) {
                highlighter.highlight(stop.node, language.as_deref(), lines);
            }
        }
    }

    // ========================================================================
    // Position recovery
    // ========================================================================

    /// Like [`clamp_to_node`], but table offsets belong to the table
    /// collaborator and are kept as they are.
    fn clamp(&self, position: Position) -> EditResult<Position> {
        if matches!(self.document.kind(position.node), Some(NodeKind::Table(_)))
            && self.document.is_attached(position.node)
        {
            return Ok(position);
        }
        clamp_to_node(&self.document, position)
    }

    /// Resolves a command's caret. A caret on a node that no longer exists
    /// moves to the nearest surviving stop of the tree before the edit.
    fn resolve(&self, position: Position, previous: &[Stop]) -> Position {
        if let Ok(position) = self.clamp(position) {
            return position;
        }
        log::debug!("caret node vanished, recovering from the previous stop list");
        let Some(index) = previous.iter().position(|stop| stop.node == position.node) else {
            return self.first_position();
        };
        let after = previous[index + 1..]
            .iter()
            .find_map(|stop| self.live_stop(stop.node))
            .map(|stop| entry_start(&self.document, stop));
        let before = previous[..index]
            .iter()
            .rev()
            .find_map(|stop| self.live_stop(stop.node))
            .map(|stop| entry_end(&self.document, stop));
        after
            .or(before)
            .unwrap_or_else(|| self.first_position())
    }

    fn live_stop(&self, node: NodeId) -> Option<&Stop> {
        self.stops.iter().find(|stop| stop.node == node)
    }

    fn first_position(&self) -> Position {
        self.stops
            .first()
            .map(|stop| entry_start(&self.document, stop))
            .unwrap_or_else(|| Position::new(self.document.root(), 0))
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;
