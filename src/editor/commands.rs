//! Keyboard-driven tree transformations. Every command takes the tree and the
//! cursor, changes the tree in place and returns the new cursor. The editor
//! wraps each call in a snapshot so a failing command leaves nothing behind.

use crate::config::EditorConfig;
use crate::document::inline::{
    append, insert_inline, insert_text as insert_inline_text, remove_range, split_off,
    strip_anchors, strip_leading_separator, text_units, unit_len,
};
use crate::document::{Checkbox, Document, Inline, NodeId, NodeKind, code_char_count};
use crate::error::{EditError, EditResult};
use crate::position::Position;

use super::content::{
    code_line_col, code_offset, code_text, code_to_inlines, fence_language, inlines_to_code,
    splice_code,
};
use super::inspect::{StopKind, collect_stops};
use super::normalize::normalize;
use super::structure::{
    BlockContext, block_context, extract_quote_paragraph, flatten_empty_item,
    indent_item, item_to_paragraph, nearest_surviving, new_list_item, open_paragraph_beside,
    outdent_item, remove_block_with_fallback, remove_stop_node, splice_out_item,
    split_text_block, text_end, text_offset, text_start, toggle_checkbox,
};

// ============================================================================
// Text input
// ============================================================================

pub(crate) fn insert_text(
    document: &mut Document,
    position: Position,
    text: &str,
) -> EditResult<Position> {
    let node = position.node;
    match block_context(document, node)? {
        BlockContext::Code => {
            let offset = splice_code(document, node, position.offset, position.offset, text)?;
            Ok(Position::new(node, offset))
        }
        BlockContext::Paragraph
        | BlockContext::QuoteParagraph
        | BlockContext::Heading
        | BlockContext::ListItem => {
            let start = document.content_start(node);
            let mut offset = text_offset(document, position);
            let content = document
                .content_mut(node)
                .ok_or(EditError::InvalidPosition)?;
            for (idx, piece) in text.split('\n').enumerate() {
                if idx > 0 {
                    insert_inline(content, offset, Inline::LineBreak);
                    offset += 1;
                }
                insert_inline_text(content, offset, piece);
                offset += text_units(piece);
            }
            Ok(Position::new(node, start + offset))
        }
        BlockContext::Rule | BlockContext::Image | BlockContext::Table => {
            Err(EditError::UnsupportedContext("text cannot go into this block"))
        }
    }
}

pub(crate) fn insert_line_break(
    document: &mut Document,
    position: Position,
    _config: &EditorConfig,
) -> EditResult<Position> {
    insert_text(document, position, "\n")
}

// ============================================================================
// Enter
// ============================================================================

pub(crate) fn enter(
    document: &mut Document,
    position: Position,
    config: &EditorConfig,
) -> EditResult<Position> {
    let node = position.node;
    match block_context(document, node)? {
        BlockContext::ListItem => enter_in_item(document, position),
        BlockContext::Code => enter_in_code(document, position),
        BlockContext::QuoteParagraph => {
            if position.offset == 0 {
                extract_quote_paragraph(document, node)?;
                Ok(Position::new(node, 0))
            } else {
                let paragraph = split_text_block(document, node, position.offset)?;
                Ok(Position::new(paragraph, 0))
            }
        }
        BlockContext::Paragraph => {
            let content = document.content(node).ok_or(EditError::InvalidPosition)?;
            if position.offset >= unit_len(content) {
                if let Some(language) = fence_language(content, &config.fence_marker) {
                    if let Some(kind) = document.kind_mut(node) {
                        *kind = NodeKind::CodeBlock {
                            language,
                            lines: vec![String::new()],
                        };
                    }
                    return Ok(Position::new(node, 0));
                }
            }
            let paragraph = split_text_block(document, node, position.offset)?;
            Ok(Position::new(paragraph, 0))
        }
        BlockContext::Heading => {
            let has_text = document
                .content(node)
                .is_some_and(|content| unit_len(content) > 0);
            if position.offset == 0 && has_text {
                open_paragraph_beside(document, node, false)?;
                return Ok(Position::new(node, 0));
            }
            let paragraph = split_text_block(document, node, position.offset)?;
            Ok(Position::new(paragraph, 0))
        }
        BlockContext::Rule => open_paragraph_beside(document, node, true),
        BlockContext::Image => {
            if position.offset == 0 {
                open_paragraph_beside(document, node, false)?;
                Ok(position)
            } else {
                open_paragraph_beside(document, node, true)
            }
        }
        BlockContext::Table => Err(EditError::UnsupportedContext("table declined Enter")),
    }
}

fn enter_in_item(document: &mut Document, position: Position) -> EditResult<Position> {
    let item = position.node;
    let start = document.content_start(item);
    let checkbox = document.checkbox(item);

    if checkbox.is_some() && position.offset < start {
        toggle_checkbox(document, item)?;
        return Ok(position);
    }

    let nested = document.nested_list(item);
    let is_nested_item = document.parent_item(item).is_some();

    if !document.item_has_text(item) {
        if is_nested_item {
            return outdent_item(document, text_start(document, item));
        }
        if nested.is_some() {
            return flatten_empty_item(document, item);
        }
        return item_to_paragraph(document, item);
    }

    let offset = text_offset(document, position);
    let fresh_checkbox = checkbox.map(|_| Checkbox::default());
    if checkbox.is_some() && offset == 0 {
        if nested.is_none() && !is_nested_item {
            return item_to_paragraph(document, item);
        }
        // The checkbox stays with its text; the blank item opens above it.
        let sibling = new_list_item(document, fresh_checkbox, Vec::new());
        document.insert_before(item, sibling);
        return Ok(text_start(document, item));
    }

    let at_end = document
        .content(item)
        .is_none_or(|content| offset >= unit_len(content));

    if at_end {
        let sibling = new_list_item(document, fresh_checkbox, Vec::new());
        document.insert_after(item, sibling);
        if let Some(list) = nested {
            let holder = new_list_item(document, None, Vec::new());
            document.insert_after(sibling, holder);
            document.detach(list);
            document.append_child(holder, list);
        }
        return Ok(text_start(document, sibling));
    }

    let content = document
        .content_mut(item)
        .ok_or(EditError::InvalidPosition)?;
    let mut tail = split_off(content, offset);
    if fresh_checkbox.is_some() {
        strip_leading_separator(&mut tail);
    }
    let sibling = new_list_item(document, fresh_checkbox, tail);
    document.insert_after(item, sibling);
    if let Some(list) = nested {
        document.detach(list);
        document.append_child(sibling, list);
    }
    Ok(text_start(document, sibling))
}

fn enter_in_code(document: &mut Document, position: Position) -> EditResult<Position> {
    let node = position.node;
    let lines = document
        .code_lines(node)
        .ok_or(EditError::InvalidPosition)?;
    let len = code_char_count(lines);
    let ends_open = lines.len() > 1 && lines.last().is_some_and(|line| line.is_empty());
    let insertion = if position.offset >= len && len > 0 && !ends_open {
        "\n\n"
    } else {
        "\n"
    };
    let offset = splice_code(document, node, position.offset, position.offset, insertion)?;
    Ok(Position::new(node, offset))
}

// ============================================================================
// Backspace / Delete
// ============================================================================

pub(crate) fn backspace(
    document: &mut Document,
    position: Position,
    _config: &EditorConfig,
) -> EditResult<Position> {
    let node = position.node;
    match block_context(document, node)? {
        BlockContext::ListItem => {
            let start = document.content_start(node);
            if position.offset <= start {
                if document.parent_item(node).is_some() {
                    return outdent_item(document, text_start(document, node));
                }
                return item_to_paragraph(document, node);
            }
            delete_text(document, node, position.offset - 1 - start, position.offset - start)?;
            Ok(Position::new(node, position.offset - 1))
        }
        BlockContext::Heading if position.offset == 0 => {
            let empty = document
                .content(node)
                .is_none_or(|content| unit_len(content) == 0);
            if empty {
                if let Some(kind) = document.kind_mut(node) {
                    *kind = NodeKind::Paragraph(Vec::new());
                }
                return Ok(position);
            }
            merge_into_previous(document, node)
        }
        BlockContext::Paragraph if position.offset == 0 => merge_into_previous(document, node),
        BlockContext::QuoteParagraph if position.offset == 0 => {
            extract_quote_paragraph(document, node)?;
            Ok(position)
        }
        BlockContext::Paragraph | BlockContext::QuoteParagraph | BlockContext::Heading => {
            delete_text(document, node, position.offset - 1, position.offset)?;
            Ok(Position::new(node, position.offset - 1))
        }
        BlockContext::Code => {
            let lines = document
                .code_lines(node)
                .ok_or(EditError::InvalidPosition)?;
            if code_char_count(lines) == 0 {
                return remove_block_with_fallback(document, node, false);
            }
            if position.offset == 0 {
                let text = code_text(lines);
                if let Some(kind) = document.kind_mut(node) {
                    *kind = NodeKind::Paragraph(code_to_inlines(&text));
                }
                return Ok(Position::new(node, 0));
            }
            let offset = splice_code(document, node, position.offset - 1, position.offset, "")?;
            Ok(Position::new(node, offset))
        }
        BlockContext::Rule => remove_block_with_fallback(document, node, false),
        BlockContext::Image if position.offset > 0 => {
            remove_block_with_fallback(document, node, false)
        }
        BlockContext::Image => Err(EditError::UnsupportedContext("nothing before the image")),
        BlockContext::Table => Err(EditError::UnsupportedContext("table declined Backspace")),
    }
}

pub(crate) fn delete_forward(
    document: &mut Document,
    position: Position,
    _config: &EditorConfig,
) -> EditResult<Position> {
    let node = position.node;
    match block_context(document, node)? {
        BlockContext::ListItem
        | BlockContext::Paragraph
        | BlockContext::QuoteParagraph
        | BlockContext::Heading => {
            let start = document.content_start(node);
            if position.offset < start {
                if let Some(NodeKind::ListItem { checkbox, .. }) = document.kind_mut(node) {
                    *checkbox = None;
                }
                return Ok(Position::new(node, 0));
            }
            if position.offset < text_end(document, node) {
                delete_text(document, node, position.offset - start, position.offset - start + 1)?;
                return Ok(position);
            }
            merge_next_into(document, position)
        }
        BlockContext::Code => {
            let lines = document
                .code_lines(node)
                .ok_or(EditError::InvalidPosition)?;
            let len = code_char_count(lines);
            if len == 0 {
                return remove_block_with_fallback(document, node, true);
            }
            if position.offset >= len {
                return Err(EditError::UnsupportedContext("end of code block"));
            }
            splice_code(document, node, position.offset, position.offset + 1, "")?;
            Ok(position)
        }
        BlockContext::Rule => remove_block_with_fallback(document, node, true),
        BlockContext::Image if position.offset == 0 => {
            remove_block_with_fallback(document, node, true)
        }
        BlockContext::Image => Err(EditError::UnsupportedContext("nothing after the image")),
        BlockContext::Table => Err(EditError::UnsupportedContext("table declined Delete")),
    }
}

/// Removes text units of a block. Items that own a nested list are guarded so
/// the nested list survives whatever the deletion does to the item.
fn delete_text(document: &mut Document, node: NodeId, start: usize, end: usize) -> EditResult<()> {
    let nested = document.nested_list(node);
    let content = document
        .content_mut(node)
        .ok_or(EditError::InvalidPosition)?;
    if !remove_range(content, start, end) {
        return Err(EditError::UnsupportedContext("nothing to delete"));
    }
    debug_assert!(
        nested.is_none_or(|list| document.parent(list) == Some(node)),
        "text deletion must not move a nested list"
    );
    Ok(())
}

/// Backspace at the start of a paragraph or heading: join it onto the stop
/// before it.
fn merge_into_previous(document: &mut Document, node: NodeId) -> EditResult<Position> {
    let stops = collect_stops(document);
    let index = stops
        .iter()
        .position(|stop| stop.node == node)
        .ok_or(EditError::InvalidPosition)?;
    let previous = index
        .checked_sub(1)
        .and_then(|prev| stops.get(prev))
        .ok_or(EditError::UnsupportedContext("nothing before the first block"))?;
    let content = document.content(node).cloned().unwrap_or_default();

    match previous.kind {
        StopKind::Rule | StopKind::Image => {
            document.remove(previous.node);
            Ok(Position::new(node, 0))
        }
        StopKind::Text => {
            let target = document
                .content_mut(previous.node)
                .ok_or(EditError::InvalidPosition)?;
            strip_anchors(target);
            append(target, content);
            document.remove(node);
            Ok(Position::new(previous.node, previous.len))
        }
        StopKind::Code if unit_len(&content) == 0 => {
            document.remove(node);
            Ok(Position::new(previous.node, previous.len))
        }
        StopKind::Code | StopKind::Table => Err(EditError::UnsupportedContext(
            "previous block does not take text",
        )),
    }
}

/// Delete at the end of a text block: pull the following stop in.
fn merge_next_into(document: &mut Document, position: Position) -> EditResult<Position> {
    let node = position.node;
    let stops = collect_stops(document);
    let index = stops
        .iter()
        .position(|stop| stop.node == node)
        .ok_or(EditError::InvalidPosition)?;
    let next = stops
        .get(index + 1)
        .ok_or(EditError::UnsupportedContext("nothing after the last block"))?;

    match next.kind {
        StopKind::Rule | StopKind::Image => {
            document.remove(next.node);
            Ok(position)
        }
        StopKind::Text => {
            let content = document.content(next.node).cloned().unwrap_or_default();
            let target = document
                .content_mut(node)
                .ok_or(EditError::InvalidPosition)?;
            strip_anchors(target);
            append(target, content);
            if document.is_list_item(next.node) {
                splice_out_item(document, next.node);
            } else {
                document.remove(next.node);
            }
            Ok(position)
        }
        StopKind::Code | StopKind::Table => Err(EditError::UnsupportedContext(
            "next block does not merge into text",
        )),
    }
}

/// Deletes everything between two ordered positions and returns the collapsed
/// cursor. The tree is normalized before returning, so follow-up commands see
/// a canonical shape.
pub(crate) fn delete_range(
    document: &mut Document,
    start: Position,
    end: Position,
) -> EditResult<Position> {
    let position = if start.node == end.node {
        delete_within(document, start, end)?
    } else {
        delete_across(document, start, end)?
    };
    normalize(document);
    Ok(position)
}

fn delete_within(document: &mut Document, start: Position, end: Position) -> EditResult<Position> {
    let node = start.node;
    match block_context(document, node)? {
        BlockContext::Code => {
            splice_code(document, node, start.offset, end.offset, "")?;
            Ok(start)
        }
        BlockContext::Image if start.offset == 0 && end.offset > 0 => {
            remove_block_with_fallback(document, node, true)
        }
        BlockContext::Rule | BlockContext::Image | BlockContext::Table => {
            Err(EditError::UnsupportedContext("empty selection"))
        }
        BlockContext::Paragraph
        | BlockContext::QuoteParagraph
        | BlockContext::Heading
        | BlockContext::ListItem => {
            let from = text_offset(document, start);
            let to = text_offset(document, end);
            delete_text(document, node, from, to)?;
            Ok(Position::new(node, start.offset.max(document.content_start(node))))
        }
    }
}

fn delete_across(document: &mut Document, start: Position, end: Position) -> EditResult<Position> {
    let stops = collect_stops(document);
    let find = |node: NodeId| {
        stops
            .iter()
            .position(|stop| stop.node == node)
            .ok_or(EditError::InvalidPosition)
    };
    let first = find(start.node)?;
    let last = find(end.node)?;
    if first > last {
        return Err(EditError::InvalidPosition);
    }
    let start_stop = stops[first].clone();
    let end_stop = stops[last].clone();

    let end_kept = match end_stop.kind {
        StopKind::Image | StopKind::Table => end.offset == 0,
        StopKind::Rule => false,
        StopKind::Text | StopKind::Code => true,
    };

    if !start_stop.is_textual() {
        // Selection starts on an atomic block: drop it and everything up to
        // the end position, trimming the head of the end block. An image or
        // table the selection only touches from behind stays.
        let start_kept =
            matches!(start_stop.kind, StopKind::Image | StopKind::Table) && start.offset > 0;
        let from = if start_kept { first + 1 } else { first };
        for stop in stops[from..last].iter().rev() {
            remove_stop_node(document, stop.node);
        }
        return match end_stop.kind {
            StopKind::Text => {
                let to = text_offset(document, end);
                if to > 0 {
                    delete_text(document, end.node, 0, to)?;
                }
                Ok(text_start(document, end.node))
            }
            StopKind::Code => {
                splice_code(document, end.node, 0, end.offset, "")?;
                Ok(Position::new(end.node, 0))
            }
            _ if end_kept => Ok(Position::new(end.node, 0)),
            _ => {
                remove_stop_node(document, end.node);
                Ok(nearest_surviving(document, &stops, last, true))
            }
        };
    }

    // The remainder of the end block travels into the start block.
    let remainder: Vec<Inline> = match end_stop.kind {
        StopKind::Text => {
            let offset = text_offset(document, end);
            let content = document
                .content_mut(end.node)
                .ok_or(EditError::InvalidPosition)?;
            let mut rest = split_off(content, offset);
            strip_anchors(&mut rest);
            rest
        }
        StopKind::Code => {
            let lines = document
                .code_lines(end.node)
                .ok_or(EditError::InvalidPosition)?;
            let text = code_text(lines);
            let rest: String = text.chars().skip(end.offset).collect();
            code_to_inlines(&rest)
        }
        _ => Vec::new(),
    };

    for (index, stop) in stops.iter().enumerate().take(last + 1).skip(first + 1).rev() {
        if index == last && end_kept && !end_stop.is_textual() {
            continue;
        }
        remove_stop_node(document, stop.node);
    }

    match start_stop.kind {
        StopKind::Code => {
            let len = document
                .code_lines(start.node)
                .map(|lines| code_char_count(lines))
                .ok_or(EditError::InvalidPosition)?;
            splice_code(document, start.node, start.offset, len, &inlines_to_code(&remainder))?;
            Ok(start)
        }
        _ => {
            let offset = text_offset(document, start);
            let content = document
                .content_mut(start.node)
                .ok_or(EditError::InvalidPosition)?;
            split_off(content, offset);
            append(content, remainder);
            Ok(Position::new(
                start.node,
                start.offset.max(document.content_start(start.node)),
            ))
        }
    }
}

// ============================================================================
// Tab / Shift+Tab
// ============================================================================

pub(crate) fn tab(
    document: &mut Document,
    position: Position,
    config: &EditorConfig,
) -> EditResult<Position> {
    let node = position.node;
    match block_context(document, node)? {
        BlockContext::ListItem => {
            indent_item(document, node)?;
            Ok(position)
        }
        BlockContext::Code => {
            let offset = splice_code(
                document,
                node,
                position.offset,
                position.offset,
                &config.code_indent,
            )?;
            Ok(Position::new(node, offset))
        }
        _ => Err(EditError::UnsupportedContext("Tab has no meaning here")),
    }
}

pub(crate) fn shift_tab(
    document: &mut Document,
    position: Position,
    config: &EditorConfig,
) -> EditResult<Position> {
    let node = position.node;
    match block_context(document, node)? {
        BlockContext::ListItem => outdent_item(document, position),
        BlockContext::Code => {
            let lines = document
                .code_lines(node)
                .ok_or(EditError::InvalidPosition)?;
            let (line, col) = code_line_col(lines, position.offset);
            let text = lines.get(line).ok_or(EditError::InvalidPosition)?;
            let removable = if text.starts_with('\t') {
                1
            } else {
                text.chars()
                    .take(config.code_tab_width.max(1))
                    .take_while(|ch| *ch == ' ')
                    .count()
            };
            if removable == 0 {
                return Err(EditError::UnsupportedContext("line is not indented"));
            }
            let line_start = code_offset(lines, line, 0);
            splice_code(document, node, line_start, line_start + removable, "")?;
            Ok(Position::new(node, line_start + col.saturating_sub(removable)))
        }
        _ => Err(EditError::UnsupportedContext("Shift+Tab has no meaning here")),
    }
}

pub(crate) fn toggle_checkbox_at(
    document: &mut Document,
    position: Position,
    _config: &EditorConfig,
) -> EditResult<Position> {
    toggle_checkbox(document, position.node)?;
    Ok(position)
}
