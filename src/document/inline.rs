use super::tree::Inline;

/// Invisible character that keeps an otherwise empty run addressable.
pub const ANCHOR: char = '\u{200B}';

/// Object replacement character standing in for an inline image in plain text.
pub const IMAGE_PLACEHOLDER: char = '\u{FFFC}';

pub fn is_anchor(ch: char) -> bool {
    matches!(ch, '\u{200B}' | '\u{FEFF}')
}

/// One logical cursor step inside a run of inlines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    Char(char),
    Image,
    Break,
}

impl Unit {
    pub fn as_char(self) -> char {
        match self {
            Unit::Char(ch) => ch,
            Unit::Image => IMAGE_PLACEHOLDER,
            Unit::Break => '\n',
        }
    }
}

pub fn text_units(text: &str) -> usize {
    text.chars().filter(|ch| !is_anchor(*ch)).count()
}

pub fn inline_len(inline: &Inline) -> usize {
    match inline {
        Inline::Text(text) | Inline::Code(text) => text_units(text),
        Inline::Strike(content) | Inline::Mark(_, content) | Inline::Link { content, .. } => {
            unit_len(content)
        }
        Inline::Image(_) | Inline::LineBreak => 1,
    }
}

pub fn unit_len(inlines: &[Inline]) -> usize {
    inlines.iter().map(inline_len).sum()
}

pub fn units(inlines: &[Inline]) -> Vec<Unit> {
    let mut result = Vec::new();
    collect_units(inlines, &mut result);
    result
}

fn collect_units(inlines: &[Inline], out: &mut Vec<Unit>) {
    for inline in inlines {
        match inline {
            Inline::Text(text) | Inline::Code(text) => {
                out.extend(text.chars().filter(|ch| !is_anchor(*ch)).map(Unit::Char));
            }
            Inline::Strike(content) | Inline::Mark(_, content) | Inline::Link { content, .. } => {
                collect_units(content, out)
            }
            Inline::Image(_) => out.push(Unit::Image),
            Inline::LineBreak => out.push(Unit::Break),
        }
    }
}

/// Unit sequence rendered as a string: images become U+FFFC, breaks `\n`.
pub fn plain_text(inlines: &[Inline]) -> String {
    units(inlines).into_iter().map(Unit::as_char).collect()
}

/// True when the run holds anything besides whitespace and anchors.
pub fn has_real_text(inlines: &[Inline]) -> bool {
    inlines.iter().any(|inline| match inline {
        Inline::Text(text) | Inline::Code(text) => text
            .chars()
            .any(|ch| !is_anchor(ch) && !ch.is_whitespace()),
        Inline::Strike(content) | Inline::Mark(_, content) | Inline::Link { content, .. } => {
            has_real_text(content)
        }
        Inline::Image(_) => true,
        Inline::LineBreak => false,
    })
}

pub fn contains_anchor(inlines: &[Inline]) -> bool {
    inlines.iter().any(|inline| match inline {
        Inline::Text(text) | Inline::Code(text) => text.chars().any(is_anchor),
        Inline::Strike(content) | Inline::Mark(_, content) | Inline::Link { content, .. } => {
            contains_anchor(content)
        }
        _ => false,
    })
}

/// Run consisting of exactly one anchor character.
pub fn anchor_run() -> Vec<Inline> {
    vec![Inline::Text(ANCHOR.to_string())]
}

pub fn is_anchor_run(inlines: &[Inline]) -> bool {
    matches!(inlines, [Inline::Text(text)] if text.chars().count() == 1 && text.chars().all(is_anchor))
}

/// Byte index in `text` after `units` visible characters.
fn byte_offset(text: &str, units: usize) -> usize {
    if units == 0 {
        return 0;
    }
    let mut seen = 0;
    for (byte_idx, ch) in text.char_indices() {
        if is_anchor(ch) {
            continue;
        }
        seen += 1;
        if seen == units {
            return byte_idx + ch.len_utf8();
        }
    }
    text.len()
}

pub fn insert_text(inlines: &mut Vec<Inline>, offset: usize, text: &str) {
    if text.is_empty() {
        return;
    }
    if !insert_into(inlines, offset, text) {
        inlines.push(Inline::Text(text.to_string()));
    }
    merge_adjacent_text(inlines);
}

fn insert_into(inlines: &mut Vec<Inline>, offset: usize, text: &str) -> bool {
    let mut remaining = offset;
    let mut idx = 0;
    while idx < inlines.len() {
        let len = inline_len(&inlines[idx]);
        if remaining <= len {
            let inserted = match &mut inlines[idx] {
                Inline::Text(existing) => {
                    let at = byte_offset(existing, remaining);
                    existing.insert_str(at, text);
                    true
                }
                Inline::Code(existing) if remaining > 0 && remaining < len => {
                    let at = byte_offset(existing, remaining);
                    existing.insert_str(at, text);
                    true
                }
                Inline::Strike(content)
                | Inline::Mark(_, content)
                | Inline::Link { content, .. }
                    if remaining > 0 || len == 0 =>
                {
                    insert_into(content, remaining, text)
                }
                _ => false,
            };
            if inserted {
                return true;
            }
            if remaining == 0 {
                inlines.insert(idx, Inline::Text(text.to_string()));
                return true;
            }
            if remaining == len {
                inlines.insert(idx + 1, Inline::Text(text.to_string()));
                return true;
            }
            return false;
        }
        remaining -= len;
        idx += 1;
    }
    if remaining == 0 {
        inlines.push(Inline::Text(text.to_string()));
        return true;
    }
    false
}

/// Inserts a non-text inline (image, line break) at a unit offset.
pub fn insert_inline(inlines: &mut Vec<Inline>, offset: usize, inline: Inline) {
    let mut tail = split_off(inlines, offset);
    inlines.push(inline);
    inlines.append(&mut tail);
    merge_adjacent_text(inlines);
}

/// Removes the units in `start..end`. Returns whether anything was removed.
pub fn remove_range(inlines: &mut Vec<Inline>, start: usize, end: usize) -> bool {
    if start >= end {
        return false;
    }
    let removed = remove_from(inlines, start, end);
    prune(inlines);
    removed
}

fn remove_from(inlines: &mut Vec<Inline>, start: usize, end: usize) -> bool {
    let mut pos = 0;
    let mut idx = 0;
    let mut removed = false;
    while idx < inlines.len() {
        let len = inline_len(&inlines[idx]);
        let lo = start.max(pos);
        let hi = end.min(pos + len);
        let mut drop_inline = false;
        if lo < hi {
            match &mut inlines[idx] {
                Inline::Text(text) | Inline::Code(text) => {
                    remove_text_units(text, lo - pos, hi - pos)
                }
                Inline::Strike(content)
                | Inline::Mark(_, content)
                | Inline::Link { content, .. } => {
                    remove_from(content, lo - pos, hi - pos);
                }
                Inline::Image(_) | Inline::LineBreak => drop_inline = true,
            }
            removed = true;
        }
        pos += len;
        if drop_inline {
            inlines.remove(idx);
        } else {
            idx += 1;
        }
    }
    removed
}

fn remove_text_units(text: &mut String, start: usize, end: usize) {
    let mut unit = 0;
    let mut kept = String::with_capacity(text.len());
    for ch in text.chars() {
        if is_anchor(ch) {
            kept.push(ch);
            continue;
        }
        if unit < start || unit >= end {
            kept.push(ch);
        }
        unit += 1;
    }
    *text = kept;
}

/// Splits the run at `offset`, leaving the head in place and returning the tail.
/// Wrapping inlines that straddle the split are duplicated on both sides.
pub fn split_off(inlines: &mut Vec<Inline>, offset: usize) -> Vec<Inline> {
    let mut pos = 0;
    let mut idx = 0;
    while idx < inlines.len() {
        if offset <= pos {
            break;
        }
        let len = inline_len(&inlines[idx]);
        if offset < pos + len {
            let local = offset - pos;
            let piece = match &mut inlines[idx] {
                Inline::Text(text) => {
                    let at = byte_offset(text, local);
                    Some(Inline::Text(text.split_off(at)))
                }
                Inline::Code(text) => {
                    let at = byte_offset(text, local);
                    Some(Inline::Code(text.split_off(at)))
                }
                Inline::Strike(content) => Some(Inline::Strike(split_off(content, local))),
                Inline::Mark(style, content) => {
                    let style = *style;
                    Some(Inline::Mark(style, split_off(content, local)))
                }
                Inline::Link { href, content } => {
                    let href = href.clone();
                    Some(Inline::Link {
                        href,
                        content: split_off(content, local),
                    })
                }
                Inline::Image(_) | Inline::LineBreak => None,
            };
            let mut tail = inlines.split_off(idx + 1);
            if let Some(piece) = piece {
                tail.insert(0, piece);
            }
            prune(inlines);
            prune(&mut tail);
            return tail;
        }
        pos += len;
        idx += 1;
    }
    let mut tail = inlines.split_off(idx);
    prune(inlines);
    prune(&mut tail);
    tail
}

pub fn append(inlines: &mut Vec<Inline>, mut tail: Vec<Inline>) {
    inlines.append(&mut tail);
    merge_adjacent_text(inlines);
}

/// Drops empty runs and wrappers whose content is empty once anchors are
/// ignored, then merges neighbouring text runs.
pub fn prune(inlines: &mut Vec<Inline>) {
    inlines.retain_mut(|inline| match inline {
        Inline::Text(text) => !text.is_empty(),
        Inline::Code(text) => text_units(text) > 0,
        Inline::Strike(content) | Inline::Mark(_, content) | Inline::Link { content, .. } => {
            prune(content);
            unit_len(content) > 0
        }
        Inline::Image(_) | Inline::LineBreak => true,
    });
    merge_adjacent_text(inlines);
}

fn merge_adjacent_text(inlines: &mut Vec<Inline>) {
    let mut idx = 0;
    while idx + 1 < inlines.len() {
        let both_text = matches!(
            (&inlines[idx], &inlines[idx + 1]),
            (Inline::Text(_), Inline::Text(_))
        );
        if !both_text {
            idx += 1;
            continue;
        }
        if let Inline::Text(right) = inlines.remove(idx + 1) {
            if let Inline::Text(left) = &mut inlines[idx] {
                left.push_str(&right);
            }
        }
    }
}

pub fn strip_anchors(inlines: &mut Vec<Inline>) {
    for inline in inlines.iter_mut() {
        match inline {
            Inline::Text(text) | Inline::Code(text) => text.retain(|ch| !is_anchor(ch)),
            Inline::Strike(content) | Inline::Mark(_, content) | Inline::Link { content, .. } => {
                strip_anchors(content)
            }
            Inline::Image(_) | Inline::LineBreak => {}
        }
    }
    prune(inlines);
}

/// Removes one leading whitespace unit, the separator that follows a checkbox.
pub fn strip_leading_separator(inlines: &mut Vec<Inline>) -> bool {
    match units(inlines).first() {
        Some(Unit::Char(ch)) if ch.is_whitespace() => remove_range(inlines, 0, 1),
        _ => false,
    }
}

#[cfg(test)]
#[path = "inline_tests.rs"]
mod inline_tests;
