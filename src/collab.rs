//! Boundaries to the collaborators living outside the editing core.

use serde::{Deserialize, Serialize};

use crate::document::{Document, NodeId, Table};
use crate::intent::Intent;
use crate::position::Selection;

/// Answer of the table collaborator for an intent aimed at a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableResponse {
    /// Not handled; the core treats the table as an atomic block.
    Declined,
    /// Caret moved inside the table, contents unchanged.
    Moved(usize),
    /// Table contents changed; caret now at the given offset.
    Edited(usize),
}

/// Owns table internals. Consulted before any core rule while the caret is
/// inside a table.
pub trait TableCollaborator {
    fn intercept(&mut self, table: &mut Table, offset: usize, intent: &Intent) -> TableResponse;
}

/// Decoration-only hook, called for each code block whose lines changed.
pub trait CodeHighlighter {
    fn highlight(&mut self, block: NodeId, language: Option<&str>, lines: &[String]);
}

/// Tree and selection as they were before a mutation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub document: Document,
    pub selection: Selection,
}

pub trait UndoStore {
    fn record(&mut self, snapshot: Snapshot);
}

pub trait ChangeListener {
    fn document_changed(&mut self, document: &Document);
}

#[derive(Default)]
pub struct Collaborators {
    pub table: Option<Box<dyn TableCollaborator>>,
    pub highlighter: Option<Box<dyn CodeHighlighter>>,
    pub undo: Option<Box<dyn UndoStore>>,
    pub listener: Option<Box<dyn ChangeListener>>,
}

impl Collaborators {
    pub fn with_table(mut self, table: impl TableCollaborator + 'static) -> Self {
        self.table = Some(Box::new(table));
        self
    }

    pub fn with_highlighter(mut self, highlighter: impl CodeHighlighter + 'static) -> Self {
        self.highlighter = Some(Box::new(highlighter));
        self
    }

    pub fn with_undo(mut self, undo: impl UndoStore + 'static) -> Self {
        self.undo = Some(Box::new(undo));
        self
    }

    pub fn with_listener(mut self, listener: impl ChangeListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }
}
