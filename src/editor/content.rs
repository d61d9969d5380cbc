use std::sync::LazyLock;

use regex::Regex;
use unicode_width::UnicodeWidthChar;

use super::inspect::Line;
use crate::document::inline::{IMAGE_PLACEHOLDER, Unit, units};
use crate::document::{Document, Inline, NodeId, NodeKind};
use crate::error::{EditError, EditResult};

static LANGUAGE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_+#.\-]*$").expect("valid language tag pattern"));

pub fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    for (count, (byte_idx, _)) in text.char_indices().enumerate() {
        if count == char_idx {
            return byte_idx;
        }
    }
    text.len()
}

pub(crate) fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn is_punctuation(ch: char) -> bool {
    !is_word_char(ch) && !ch.is_whitespace()
}

pub fn previous_word_boundary(chars: &[char], offset: usize) -> usize {
    let mut idx = offset.min(chars.len());
    while idx > 0 && chars[idx - 1].is_whitespace() {
        idx -= 1;
    }
    if idx == 0 {
        return 0;
    }
    if is_word_char(chars[idx - 1]) {
        while idx > 0 && is_word_char(chars[idx - 1]) {
            idx -= 1;
        }
    } else {
        while idx > 0 && is_punctuation(chars[idx - 1]) {
            idx -= 1;
        }
    }
    idx
}

pub fn next_word_boundary(chars: &[char], offset: usize) -> usize {
    let len = chars.len();
    let mut idx = offset.min(len);
    if idx >= len {
        return len;
    }

    if chars[idx].is_whitespace() {
        while idx < len && chars[idx].is_whitespace() {
            idx += 1;
        }
        return idx;
    }

    if is_word_char(chars[idx]) {
        while idx < len && is_word_char(chars[idx]) {
            idx += 1;
        }
    } else {
        while idx < len && is_punctuation(chars[idx]) {
            idx += 1;
        }
    }
    while idx < len && chars[idx].is_whitespace() {
        idx += 1;
    }
    idx
}

pub(crate) fn char_width(ch: char, tab_width: usize) -> usize {
    match ch {
        '\t' => tab_width,
        IMAGE_PLACEHOLDER => 1,
        _ => ch.width().unwrap_or(0),
    }
}

/// Display width of the first `count` characters of a line.
pub(crate) fn display_width(chars: &[char], count: usize, tab_width: usize) -> usize {
    chars
        .iter()
        .take(count)
        .map(|&ch| char_width(ch, tab_width))
        .sum()
}

/// Offset on `line` whose display column is closest to `goal` without
/// passing it.
pub(crate) fn offset_for_column(line: &Line, goal: usize, tab_width: usize) -> usize {
    let mut width = 0;
    for (idx, &ch) in line.chars.iter().enumerate() {
        let next = width + char_width(ch, tab_width);
        if next > goal {
            return line.start + idx;
        }
        width = next;
    }
    line.end()
}

// ============================================================================
// Code block text
// ============================================================================

pub(crate) fn code_text(lines: &[String]) -> String {
    lines.join("\n")
}

/// Replaces the characters `start..end` of a code block's joined text and
/// returns the offset right after the replacement.
pub(crate) fn splice_code(
    document: &mut Document,
    node: NodeId,
    start: usize,
    end: usize,
    replacement: &str,
) -> EditResult<usize> {
    let Some(NodeKind::CodeBlock { lines, .. }) = document.kind_mut(node) else {
        return Err(EditError::UnsupportedContext("not a code block"));
    };
    let mut text = code_text(lines);
    let start_byte = char_to_byte_idx(&text, start);
    let end_byte = char_to_byte_idx(&text, end.max(start));
    text.replace_range(start_byte..end_byte, replacement);
    *lines = text.split('\n').map(str::to_string).collect();
    Ok(start + replacement.chars().count())
}

/// Line index and column of a code offset.
pub(crate) fn code_line_col(lines: &[String], offset: usize) -> (usize, usize) {
    let mut remaining = offset;
    for (idx, line) in lines.iter().enumerate() {
        let len = line.chars().count();
        if remaining <= len {
            return (idx, remaining);
        }
        remaining -= len + 1;
    }
    let last = lines.len().saturating_sub(1);
    (last, lines.last().map(|line| line.chars().count()).unwrap_or(0))
}

pub(crate) fn code_offset(lines: &[String], line: usize, col: usize) -> usize {
    lines
        .iter()
        .take(line)
        .map(|text| text.chars().count() + 1)
        .sum::<usize>()
        + col
}

/// Raw code text as inline content: one text run per line, joined by breaks.
pub(crate) fn code_to_inlines(text: &str) -> Vec<Inline> {
    let mut result = Vec::new();
    for (idx, line) in text.split('\n').enumerate() {
        if idx > 0 {
            result.push(Inline::LineBreak);
        }
        if !line.is_empty() {
            result.push(Inline::Text(line.to_string()));
        }
    }
    result
}

/// Inline content flattened to plain text for a code block. Images keep their
/// alt text.
pub(crate) fn inlines_to_code(inlines: &[Inline]) -> String {
    let mut text = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(run) | Inline::Code(run) => text.extend(
                run.chars()
                    .filter(|ch| !crate::document::inline::is_anchor(*ch)),
            ),
            Inline::Strike(content) | Inline::Mark(_, content) | Inline::Link { content, .. } => {
                text.push_str(&inlines_to_code(content))
            }
            Inline::Image(image) => text.push_str(&image.alt),
            Inline::LineBreak => text.push('\n'),
        }
    }
    text
}

/// Language of a paragraph that consists of an opening fence only.
/// `Some(None)` is a fence without a language tag.
pub(crate) fn fence_language(inlines: &[Inline], marker: &str) -> Option<Option<String>> {
    let units = units(inlines);
    if units.iter().any(|unit| !matches!(unit, Unit::Char(_))) {
        return None;
    }
    let text: String = units.into_iter().map(Unit::as_char).collect();
    let rest = text.trim().strip_prefix(marker)?.trim();
    if !LANGUAGE_TAG.is_match(rest) {
        return None;
    }
    Some((!rest.is_empty()).then(|| rest.to_string()))
}
