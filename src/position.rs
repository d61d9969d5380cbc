use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::document::{Document, NodeId};
use crate::error::{EditError, EditResult};

/// An addressable place in the tree.
///
/// For text-bearing blocks `offset` counts logical units (anchors excluded, a
/// checkbox is unit 0). For containers it is a child index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn collapsed(position: Position) -> Self {
        Self {
            anchor: position,
            focus: position,
        }
    }

    pub fn new(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    pub fn is_collapsed(&self) -> bool {
        is_collapsed(self)
    }

    /// Anchor and focus in document order.
    pub fn ordered(&self, document: &Document) -> (Position, Position) {
        match compare_positions(document, &self.anchor, &self.focus) {
            Some(Ordering::Greater) => (self.focus, self.anchor),
            _ => (self.anchor, self.focus),
        }
    }
}

pub fn is_collapsed(selection: &Selection) -> bool {
    selection.anchor == selection.focus
}

/// Orders two positions by document order. `None` if either is detached.
pub fn compare_positions(document: &Document, a: &Position, b: &Position) -> Option<Ordering> {
    if a.node == b.node {
        return document
            .is_attached(a.node)
            .then(|| a.offset.cmp(&b.offset));
    }
    let left = document.path(a.node)?;
    let right = document.path(b.node)?;
    Some(left.cmp(&right).then(a.offset.cmp(&b.offset)))
}

/// Resolves `position` against the current tree: offsets are clamped to the
/// node and container positions descend into the addressed child.
pub fn clamp_to_node(document: &Document, position: Position) -> EditResult<Position> {
    if !document.is_attached(position.node) {
        return Err(EditError::InvalidPosition);
    }
    let mut current = position;
    loop {
        if let Some(len) = document.position_len(current.node) {
            return Ok(Position::new(current.node, current.offset.min(len)));
        }
        let children = document.children(current.node);
        if children.is_empty() {
            return Err(EditError::InvalidPosition);
        }
        let index = current.offset.min(children.len() - 1);
        current = Position::new(children[index], 0);
        if document.checkbox(current.node).is_some() {
            current.offset = 1;
        }
    }
}
