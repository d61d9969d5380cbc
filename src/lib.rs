//! Editing core for block-structured rich-text documents: a block tree with
//! list items, checkboxes, code, quotes and atomic blocks, a cursor model over
//! it, and the keyboard-driven navigation and restructuring rules.

pub mod collab;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod intent;
pub mod keymap;
pub mod markup;
pub mod position;

pub use collab::{
    ChangeListener, CodeHighlighter, Collaborators, Snapshot, TableCollaborator, TableResponse,
    UndoStore,
};
pub use config::EditorConfig;
pub use document::{
    Block, Checkbox, Document, Image, Inline, List, ListItem, MarkStyle, NodeId, NodeKind, Table,
};
pub use editor::{Editor, Stop, StopKind, normalize};
pub use error::{EditError, EditResult};
pub use intent::{Direction, Intent, Outcome};
pub use position::{Position, Selection, clamp_to_node, compare_positions, is_collapsed};
