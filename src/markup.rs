//! Conversion between the editing tree and `tdoc` documents, plus markdown
//! loading and saving on top of it.

use std::io::Cursor;

use anyhow::{Context, Result, anyhow};
use tdoc::{ChecklistItem, InlineStyle, Paragraph, ParagraphType, Span};

use crate::document::inline::plain_text;
use crate::document::{Block, Checkbox, Image, Inline, List, ListItem, MarkStyle};

pub fn parse_markdown(text: &str) -> Result<Vec<Block>> {
    let document = tdoc::markdown::parse(Cursor::new(text))
        .map_err(|err| anyhow!(err.to_string()))
        .context("failed to parse markdown")?;
    Ok(blocks_from_tdoc(&document))
}

pub fn write_markdown(blocks: &[Block]) -> Result<String> {
    let document = tdoc_from_blocks(blocks);
    let mut buffer = Vec::new();
    tdoc::markdown::write(&mut buffer, &document)
        .map_err(|err| anyhow!(err.to_string()))
        .context("failed to write markdown")?;
    String::from_utf8(buffer).context("markdown output is not valid UTF-8")
}

// ============================================================================
// tdoc -> blocks
// ============================================================================

pub fn blocks_from_tdoc(document: &tdoc::Document) -> Vec<Block> {
    document.paragraphs.iter().flat_map(import_paragraph).collect()
}

fn import_paragraph(paragraph: &Paragraph) -> Vec<Block> {
    let block = match paragraph {
        Paragraph::Text { content } => Block::Paragraph(import_spans(content)),
        Paragraph::Header1 { content } => heading(1, content),
        Paragraph::Header2 { content } => heading(2, content),
        Paragraph::Header3 { content } => heading(3, content),
        Paragraph::CodeBlock { content } => {
            let text: String = content.iter().map(span_text).collect();
            let text = text.strip_suffix('\n').unwrap_or(&text);
            Block::CodeBlock {
                language: None,
                lines: text.split('\n').map(str::to_string).collect(),
            }
        }
        Paragraph::Quote { children } => {
            let mut paragraphs = Vec::new();
            collect_quote_paragraphs(children, &mut paragraphs);
            if paragraphs.is_empty() {
                paragraphs.push(Vec::new());
            }
            Block::Blockquote(paragraphs)
        }
        Paragraph::OrderedList { entries } => Block::List(import_entries(entries, true)),
        Paragraph::UnorderedList { entries } => Block::List(import_entries(entries, false)),
        Paragraph::Checklist { items } => Block::List(import_checklist(items)),
    };
    vec![block]
}

fn heading(level: u8, content: &[Span]) -> Block {
    Block::Heading {
        level,
        content: import_spans(content),
    }
}

/// Quotes only hold paragraphs, so anything nested inside one is flattened
/// into its text.
fn collect_quote_paragraphs(children: &[Paragraph], out: &mut Vec<Vec<Inline>>) {
    for child in children {
        match child {
            Paragraph::Text { content }
            | Paragraph::Header1 { content }
            | Paragraph::Header2 { content }
            | Paragraph::Header3 { content }
            | Paragraph::CodeBlock { content } => out.push(import_spans(content)),
            Paragraph::Quote { children } => collect_quote_paragraphs(children, out),
            Paragraph::OrderedList { entries } | Paragraph::UnorderedList { entries } => {
                for entry in entries {
                    collect_quote_paragraphs(entry, out);
                }
            }
            Paragraph::Checklist { items } => collect_checklist_paragraphs(items, out),
        }
    }
}

fn collect_checklist_paragraphs(items: &[ChecklistItem], out: &mut Vec<Vec<Inline>>) {
    for item in items {
        out.push(import_spans(&item.content));
        collect_checklist_paragraphs(&item.children, out);
    }
}

fn import_entries(entries: &[Vec<Paragraph>], ordered: bool) -> List {
    List {
        ordered,
        items: entries.iter().map(|entry| import_entry(entry)).collect(),
    }
}

/// First text paragraph of an entry is the item text, further text paragraphs
/// join it after a line break and lists become its nested list.
fn import_entry(entry: &[Paragraph]) -> ListItem {
    let mut content: Vec<Inline> = Vec::new();
    let mut nested: Option<List> = None;
    let mut has_text = false;
    for paragraph in entry {
        match paragraph {
            Paragraph::OrderedList { entries } => merge_nested(&mut nested, import_entries(entries, true)),
            Paragraph::UnorderedList { entries } => {
                merge_nested(&mut nested, import_entries(entries, false))
            }
            Paragraph::Checklist { items } => merge_nested(&mut nested, import_checklist(items)),
            other => {
                for block in import_paragraph(other) {
                    let inlines = match block {
                        Block::Paragraph(content) | Block::Heading { content, .. } => content,
                        Block::CodeBlock { lines, .. } => vec![Inline::Code(lines.join(" "))],
                        Block::Blockquote(paragraphs) => paragraphs.into_iter().flatten().collect(),
                        _ => continue,
                    };
                    if has_text {
                        content.push(Inline::LineBreak);
                    }
                    content.extend(inlines);
                    has_text = true;
                }
            }
        }
    }
    let item = ListItem {
        checkbox: None,
        content,
        nested: None,
        preserve_empty: false,
    };
    match nested {
        Some(list) => item.with_nested(list),
        None => item,
    }
}

fn merge_nested(nested: &mut Option<List>, list: List) {
    match nested {
        Some(existing) => existing.items.extend(list.items),
        None => *nested = Some(list),
    }
}

fn import_checklist(items: &[ChecklistItem]) -> List {
    List {
        ordered: false,
        items: items.iter().map(import_checklist_item).collect(),
    }
}

fn import_checklist_item(item: &ChecklistItem) -> ListItem {
    let imported = ListItem {
        checkbox: Some(Checkbox {
            checked: item.checked,
        }),
        content: import_spans(&item.content),
        nested: None,
        preserve_empty: false,
    };
    if item.children.is_empty() {
        imported
    } else {
        imported.with_nested(import_checklist(&item.children))
    }
}

fn span_text(span: &Span) -> String {
    let mut text = span.text.clone();
    for child in &span.children {
        text.push_str(&span_text(child));
    }
    text
}

fn import_spans(spans: &[Span]) -> Vec<Inline> {
    let mut result = Vec::new();
    for span in spans {
        import_span(span, &mut result);
    }
    result
}

fn import_span(span: &Span, out: &mut Vec<Inline>) {
    if span.style == InlineStyle::Code {
        out.push(Inline::Code(span_text(span)));
        return;
    }
    let mut inner = Vec::new();
    push_text(&span.text, &mut inner);
    for child in &span.children {
        import_span(child, &mut inner);
    }
    match span.style {
        InlineStyle::None => out.extend(inner),
        InlineStyle::Bold => out.push(Inline::Mark(MarkStyle::Bold, inner)),
        InlineStyle::Italic => out.push(Inline::Mark(MarkStyle::Italic, inner)),
        InlineStyle::Underline => out.push(Inline::Mark(MarkStyle::Underline, inner)),
        InlineStyle::Highlight => out.push(Inline::Mark(MarkStyle::Highlight, inner)),
        InlineStyle::Strike => out.push(Inline::Strike(inner)),
        InlineStyle::Link => out.push(Inline::Link {
            href: span.link_target.clone().unwrap_or_default(),
            content: inner,
        }),
        InlineStyle::Code => {}
    }
}

fn push_text(text: &str, out: &mut Vec<Inline>) {
    for (idx, line) in text.split('\n').enumerate() {
        if idx > 0 {
            out.push(Inline::LineBreak);
        }
        if !line.is_empty() {
            out.push(Inline::Text(line.to_string()));
        }
    }
}

// ============================================================================
// blocks -> tdoc
// ============================================================================

pub fn tdoc_from_blocks(blocks: &[Block]) -> tdoc::Document {
    tdoc::Document::new().with_paragraphs(blocks.iter().flat_map(export_block).collect())
}

fn export_block(block: &Block) -> Vec<Paragraph> {
    match block {
        Block::Paragraph(content) => vec![text_paragraph(export_inlines(content))],
        Block::Heading { level, content } => {
            let kind = match level {
                1 => ParagraphType::Header1,
                2 => ParagraphType::Header2,
                _ => ParagraphType::Header3,
            };
            vec![Paragraph::new(kind).with_content(export_inlines(content))]
        }
        Block::List(list) => export_list(list),
        Block::CodeBlock { lines, .. } => vec![
            Paragraph::new(ParagraphType::CodeBlock)
                .with_content(vec![Span::new_text(&lines.join("\n"))]),
        ],
        Block::Blockquote(paragraphs) => vec![Paragraph::new_quote().with_children(
            paragraphs
                .iter()
                .map(|content| text_paragraph(export_inlines(content)))
                .collect(),
        )],
        Block::Table(table) => table
            .rows
            .iter()
            .map(|row| text_paragraph(vec![Span::new_text(&row.join(" | "))]))
            .collect(),
        Block::HorizontalRule => vec![text_paragraph(vec![Span::new_text("---")])],
        Block::Image(image) => vec![text_paragraph(vec![Span::new_text(&image_text(image))])],
    }
}

fn text_paragraph(content: Vec<Span>) -> Paragraph {
    Paragraph::new_text().with_content(content)
}

fn image_text(image: &Image) -> String {
    format!("![{}]({})", image.alt, image.src)
}

/// Consecutive checkbox items become one checklist, the other runs a regular
/// list of the same kind.
fn export_list(list: &List) -> Vec<Paragraph> {
    let mut result = Vec::new();
    let mut start = 0;
    while start < list.items.len() {
        let tasks = list.items[start].checkbox.is_some();
        let end = list.items[start..]
            .iter()
            .position(|item| item.checkbox.is_some() != tasks)
            .map_or(list.items.len(), |offset| start + offset);
        let run = &list.items[start..end];
        if tasks {
            result.push(
                Paragraph::new_checklist()
                    .with_checklist_items(run.iter().map(export_checklist_item).collect()),
            );
        } else {
            let entries = run.iter().map(export_entry).collect();
            let paragraph = if list.ordered {
                Paragraph::new_ordered_list()
            } else {
                Paragraph::new_unordered_list()
            };
            result.push(paragraph.with_entries(entries));
        }
        start = end;
    }
    result
}

fn export_entry(item: &ListItem) -> Vec<Paragraph> {
    let mut entry = vec![text_paragraph(export_inlines(&item.content))];
    if let Some(nested) = &item.nested {
        entry.extend(export_list(nested));
    }
    entry
}

/// Checklist children can only be checklist items; plain nested items are
/// exported unchecked.
fn export_checklist_item(item: &ListItem) -> ChecklistItem {
    let checked = item.checkbox.is_some_and(|checkbox| checkbox.checked);
    let children = item
        .nested
        .as_ref()
        .map(|nested| nested.items.iter().map(export_checklist_item).collect())
        .unwrap_or_default();
    ChecklistItem::new(checked)
        .with_content(export_inlines(&item.content))
        .with_children(children)
}

fn export_inlines(inlines: &[Inline]) -> Vec<Span> {
    let mut spans = Vec::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) => push_plain(&mut spans, text),
            Inline::LineBreak => push_plain(&mut spans, "\n"),
            Inline::Image(image) => push_plain(&mut spans, &image_text(image)),
            Inline::Code(text) => spans.push(styled(InlineStyle::Code, text, Vec::new())),
            Inline::Strike(content) => {
                spans.push(styled(InlineStyle::Strike, "", export_inlines(content)))
            }
            Inline::Mark(style, content) => {
                let style = match style {
                    MarkStyle::Bold => InlineStyle::Bold,
                    MarkStyle::Italic => InlineStyle::Italic,
                    MarkStyle::Underline => InlineStyle::Underline,
                    MarkStyle::Highlight => InlineStyle::Highlight,
                };
                spans.push(styled(style, "", export_inlines(content)));
            }
            Inline::Link { href, content } => {
                let mut span = styled(InlineStyle::Link, "", export_inlines(content));
                if span.children.is_empty() {
                    span.text = plain_text(content);
                }
                span.link_target = Some(href.clone());
                spans.push(span);
            }
        }
    }
    spans
}

fn push_plain(spans: &mut Vec<Span>, text: &str) {
    if let Some(last) = spans
        .last_mut()
        .filter(|span| span.style == InlineStyle::None && span.children.is_empty())
    {
        last.text.push_str(text);
        return;
    }
    spans.push(Span::new_text(text));
}

fn styled(style: InlineStyle, text: &str, children: Vec<Span>) -> Span {
    let mut span = Span::new_text(text);
    span.style = style;
    span.children = children;
    span
}

#[cfg(test)]
#[path = "markup_tests.rs"]
mod markup_tests;
