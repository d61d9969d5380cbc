use crate::document::inline::{strip_anchors, strip_leading_separator, unit_len};
use crate::document::{Checkbox, Document, Inline, NodeId, NodeKind};
use crate::error::{EditError, EditResult, inconsistent};
use crate::position::Position;

use super::inspect::{Stop, collect_stops, entry_end, entry_start};

/// What kind of block the cursor sits in, with enough context to dispatch
/// keyboard intents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlockContext {
    Paragraph,
    QuoteParagraph,
    Heading,
    ListItem,
    Code,
    Rule,
    Image,
    Table,
}

pub(crate) fn block_context(document: &Document, node: NodeId) -> EditResult<BlockContext> {
    let context = match document.kind(node).ok_or(EditError::InvalidPosition)? {
        NodeKind::Paragraph(_) => {
            let in_quote = document
                .parent(node)
                .is_some_and(|parent| matches!(document.kind(parent), Some(NodeKind::Blockquote)));
            if in_quote {
                BlockContext::QuoteParagraph
            } else {
                BlockContext::Paragraph
            }
        }
        NodeKind::Heading { .. } => BlockContext::Heading,
        NodeKind::ListItem { .. } => BlockContext::ListItem,
        NodeKind::CodeBlock { .. } => BlockContext::Code,
        NodeKind::HorizontalRule => BlockContext::Rule,
        NodeKind::Image(_) => BlockContext::Image,
        NodeKind::Table(_) => BlockContext::Table,
        NodeKind::Root | NodeKind::List { .. } | NodeKind::Blockquote => {
            return Err(EditError::InvalidPosition);
        }
    };
    Ok(context)
}

// ============================================================================
// Public helper functions (used across modules)
// ============================================================================

pub(crate) fn ensure_document_initialized(document: &mut Document) {
    let root = document.root();
    if document.children(root).is_empty() {
        let paragraph = empty_text_paragraph(document);
        document.append_child(root, paragraph);
    }
}

pub(crate) fn empty_text_paragraph(document: &mut Document) -> NodeId {
    document.insert(NodeKind::Paragraph(Vec::new()))
}

pub(crate) fn new_list_item(
    document: &mut Document,
    checkbox: Option<Checkbox>,
    content: Vec<Inline>,
) -> NodeId {
    document.insert(NodeKind::list_item(checkbox, content))
}

/// Position at the start of a block's text, behind a checkbox if present.
pub(crate) fn text_start(document: &Document, node: NodeId) -> Position {
    Position::new(node, document.content_start(node))
}

/// Text offset of a position, with the checkbox unit taken off.
pub(crate) fn text_offset(document: &Document, position: Position) -> usize {
    position
        .offset
        .saturating_sub(document.content_start(position.node))
}

pub(crate) fn item_container(document: &Document, item: NodeId) -> EditResult<NodeId> {
    document
        .parent(item)
        .filter(|&container| document.is_list(container))
        .ok_or(EditError::UnsupportedContext("not inside a list"))
}

/// Splits a paragraph, heading or quote paragraph at a text offset. The tail
/// becomes a new paragraph right after it.
pub(crate) fn split_text_block(
    document: &mut Document,
    node: NodeId,
    offset: usize,
) -> EditResult<NodeId> {
    let content = document
        .content_mut(node)
        .ok_or(EditError::UnsupportedContext("block has no text"))?;
    let tail = crate::document::inline::split_off(content, offset);
    let paragraph = document.insert(NodeKind::Paragraph(tail));
    if !document.insert_after(node, paragraph) {
        document.remove(paragraph);
        return Err(EditError::InvalidPosition);
    }
    Ok(paragraph)
}

/// Opens an empty paragraph next to a block and returns the position in it.
pub(crate) fn open_paragraph_beside(
    document: &mut Document,
    node: NodeId,
    after: bool,
) -> EditResult<Position> {
    let paragraph = empty_text_paragraph(document);
    let placed = if after {
        document.insert_after(node, paragraph)
    } else {
        document.insert_before(node, paragraph)
    };
    if !placed {
        document.remove(paragraph);
        return Err(EditError::InvalidPosition);
    }
    Ok(Position::new(paragraph, 0))
}

/// Removes a stop's node. List items hand their nested items up to their own
/// container so no content below them is lost.
pub(crate) fn remove_stop_node(document: &mut Document, node: NodeId) {
    if document.is_list_item(node) {
        splice_out_item(document, node);
    } else {
        document.remove(node);
    }
}

/// Removes a list item and moves the items of its nested list into its place.
pub(crate) fn splice_out_item(document: &mut Document, item: NodeId) {
    let (Some(container), Some(index)) = (document.parent(item), document.index_in_parent(item))
    else {
        return;
    };
    if let Some(nested) = document.nested_list(item) {
        let promoted = document.children(nested).to_vec();
        for (offset, node) in promoted.into_iter().enumerate() {
            document.detach(node);
            document.attach(container, index + 1 + offset, node);
        }
    }
    document.remove(item);
}

/// Removes an atomic or code block and returns where the cursor goes: the
/// neighbouring stop in the preferred direction, the other neighbour, or a
/// fresh paragraph when nothing else is left.
pub(crate) fn remove_block_with_fallback(
    document: &mut Document,
    node: NodeId,
    forward: bool,
) -> EditResult<Position> {
    let stops = collect_stops(document);
    let index = stops
        .iter()
        .position(|stop| stop.node == node)
        .ok_or(EditError::InvalidPosition)?;
    document.remove(node);
    Ok(nearest_surviving(document, &stops, index, forward))
}

/// First stop around `index` whose node is still attached.
pub(crate) fn nearest_surviving(
    document: &mut Document,
    stops: &[Stop],
    index: usize,
    forward: bool,
) -> Position {
    let after = stops
        .iter()
        .skip(index + 1)
        .find(|stop| document.is_attached(stop.node))
        .map(|stop| entry_start(document, stop));
    let before = stops
        .iter()
        .take(index)
        .rev()
        .find(|stop| document.is_attached(stop.node))
        .map(|stop| entry_end(document, stop));
    let target = if forward {
        after.or(before)
    } else {
        before.or(after)
    };
    match target {
        Some(position) => position,
        None => {
            let paragraph = empty_text_paragraph(document);
            let root = document.root();
            document.append_child(root, paragraph);
            Position::new(paragraph, 0)
        }
    }
}

// ============================================================================
// List restructuring
// ============================================================================

/// Moves `item` one level deeper, below the nearest earlier item on its level.
pub(crate) fn indent_item(document: &mut Document, item: NodeId) -> EditResult<()> {
    let container = item_container(document, item)?;
    let ordered = document.list_ordered(container).unwrap_or(false);
    let target = find_indent_target(document, item)
        .ok_or(EditError::UnsupportedContext("no earlier item to indent under"))?;
    let nested = match document.nested_list(target) {
        Some(list) => list,
        None => {
            let list = document.insert(NodeKind::List { ordered });
            document.append_child(target, list);
            list
        }
    };
    document.detach(item);
    document.append_child(nested, item);
    if document.children(container).is_empty() {
        document.remove(container);
    }
    Ok(())
}

/// The item that `item` would become a child of when indented: its previous
/// sibling, or for the first item of a nested list the last item on the same
/// level below an earlier ancestor sibling.
pub(crate) fn find_indent_target(document: &Document, item: NodeId) -> Option<NodeId> {
    if let Some(previous) = document.previous_sibling(item) {
        return Some(previous);
    }
    let depth = document.item_depth(item);
    let mut current = item;
    while let Some(owner) = document.parent_item(current) {
        let owner_container = document.parent(owner)?;
        let owner_index = document.index_in_parent(owner)?;
        for &sibling in document.children(owner_container)[..owner_index].iter().rev() {
            if let Some(found) = last_item_at_depth(document, sibling, depth) {
                return Some(found);
            }
        }
        current = owner;
    }
    None
}

fn last_item_at_depth(document: &Document, item: NodeId, depth: usize) -> Option<NodeId> {
    let mut current = item;
    let mut current_depth = document.item_depth(item);
    while current_depth < depth {
        let nested = document.nested_list(current)?;
        current = *document.children(nested).last()?;
        current_depth += 1;
    }
    (current_depth == depth).then_some(current)
}

/// Moves the item at `position` one level up, right behind the item that owned
/// its list. Following siblings move along below it.
pub(crate) fn outdent_item(document: &mut Document, position: Position) -> EditResult<Position> {
    let item = position.node;
    let container = item_container(document, item)?;
    let grand = document
        .parent_item(item)
        .ok_or(EditError::UnsupportedContext("item is already at the top level"))?;
    let index = document
        .index_in_parent(item)
        .ok_or(EditError::InvalidPosition)?;
    let tail: Vec<NodeId> = document.children(container)[index + 1..].to_vec();
    let nested = document.nested_list(item);

    if nested.is_some() && tail.is_empty() && !document.item_has_text(item) {
        return flatten_empty_item(document, item);
    }

    let ordered = document.list_ordered(container).unwrap_or(false);
    for &node in &tail {
        document.detach(node);
    }
    document.detach(item);
    if !document.insert_after(grand, item) {
        return Err(inconsistent("owning item lost its list"));
    }
    if !tail.is_empty() {
        let target = match nested {
            Some(list) => {
                if document.list_ordered(list) != Some(ordered) {
                    log::debug!("outdent tail takes the kind of the item's nested list");
                }
                list
            }
            None => {
                let list = document.insert(NodeKind::List { ordered });
                document.append_child(item, list);
                list
            }
        };
        for node in tail {
            document.append_child(target, node);
        }
    }
    if document.children(container).is_empty() {
        document.remove(container);
        if !document.item_has_text(grand) && document.nested_list(grand).is_none() {
            // One level only; emptier ancestors stay as they are.
            document.remove(grand);
        }
    }
    Ok(position)
}

/// Deletes an item without text and splices its nested items into its place.
pub(crate) fn flatten_empty_item(document: &mut Document, item: NodeId) -> EditResult<Position> {
    let container = item_container(document, item)?;
    let index = document
        .index_in_parent(item)
        .ok_or(EditError::InvalidPosition)?;
    let nested = document
        .nested_list(item)
        .ok_or(EditError::UnsupportedContext("item has no nested list"))?;
    let promoted = document.children(nested).to_vec();
    let first = *promoted
        .first()
        .ok_or_else(|| inconsistent("nested list without items"))?;
    for (offset, node) in promoted.into_iter().enumerate() {
        document.detach(node);
        document.attach(container, index + 1 + offset, node);
    }
    document.remove(item);
    Ok(text_start(document, first))
}

/// Turns a top-level list item into a paragraph. Items before it stay in the
/// list, its nested list and the items after it follow the paragraph.
pub(crate) fn item_to_paragraph(document: &mut Document, item: NodeId) -> EditResult<Position> {
    let container = item_container(document, item)?;
    let owner = document.parent(container).ok_or(EditError::InvalidPosition)?;
    if document.is_list_item(owner) {
        return Err(EditError::UnsupportedContext("nested items are outdented instead"));
    }
    let ordered = document.list_ordered(container).unwrap_or(false);
    let index = document
        .index_in_parent(item)
        .ok_or(EditError::InvalidPosition)?;
    let container_index = document
        .index_in_parent(container)
        .ok_or(EditError::InvalidPosition)?;
    let after: Vec<NodeId> = document.children(container)[index + 1..].to_vec();
    let nested = document.nested_list(item);

    let Some(NodeKind::ListItem {
        checkbox, content, ..
    }) = document.kind(item)
    else {
        return Err(EditError::UnsupportedContext("not a list item"));
    };
    let had_checkbox = checkbox.is_some();
    let mut content = content.clone();
    strip_anchors(&mut content);
    if had_checkbox {
        strip_leading_separator(&mut content);
    }

    let paragraph = document.insert(NodeKind::Paragraph(content));
    if let Some(list) = nested {
        document.detach(list);
    }
    if index == 0 {
        document.attach(owner, container_index, paragraph);
        if let Some(list) = nested {
            document.attach(owner, container_index + 1, list);
        }
        document.remove(item);
        if document.children(container).is_empty() {
            document.remove(container);
        }
    } else {
        for &node in &after {
            document.detach(node);
        }
        let mut at = container_index + 1;
        document.attach(owner, at, paragraph);
        at += 1;
        if let Some(list) = nested {
            document.attach(owner, at, list);
            at += 1;
        }
        if !after.is_empty() {
            let list = document.insert(NodeKind::List { ordered });
            for node in after {
                document.append_child(list, node);
            }
            document.attach(owner, at, list);
        }
        document.remove(item);
    }
    Ok(Position::new(paragraph, 0))
}

/// Lifts a paragraph out of its blockquote. Paragraphs after it move into a
/// new quote placed behind the lifted paragraph.
pub(crate) fn extract_quote_paragraph(document: &mut Document, paragraph: NodeId) -> EditResult<()> {
    let quote = document.parent(paragraph).ok_or(EditError::InvalidPosition)?;
    if !matches!(document.kind(quote), Some(NodeKind::Blockquote)) {
        return Err(EditError::UnsupportedContext("paragraph is not quoted"));
    }
    let owner = document.parent(quote).ok_or(EditError::InvalidPosition)?;
    let index = document
        .index_in_parent(paragraph)
        .ok_or(EditError::InvalidPosition)?;
    let quote_index = document
        .index_in_parent(quote)
        .ok_or(EditError::InvalidPosition)?;

    document.detach(paragraph);
    if index == 0 {
        document.attach(owner, quote_index, paragraph);
    } else {
        let after: Vec<NodeId> = document.children(quote)[index..].to_vec();
        document.attach(owner, quote_index + 1, paragraph);
        if !after.is_empty() {
            let new_quote = document.insert(NodeKind::Blockquote);
            for node in after {
                document.detach(node);
                document.append_child(new_quote, node);
            }
            document.attach(owner, quote_index + 2, new_quote);
        }
    }
    if document.children(quote).is_empty() {
        document.remove(quote);
    }
    Ok(())
}

/// Flips the checkbox of a list item.
pub(crate) fn toggle_checkbox(document: &mut Document, item: NodeId) -> EditResult<()> {
    match document.kind_mut(item) {
        Some(NodeKind::ListItem {
            checkbox: Some(checkbox),
            ..
        }) => {
            checkbox.checked = !checkbox.checked;
            Ok(())
        }
        _ => Err(EditError::UnsupportedContext("no checkbox under the cursor")),
    }
}

/// Offset right behind the text of a text-bearing block.
pub(crate) fn text_end(document: &Document, node: NodeId) -> usize {
    document.content_start(node) + document.content(node).map(|c| unit_len(c)).unwrap_or(0)
}
