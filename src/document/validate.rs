use super::inline::{contains_anchor, has_real_text, is_anchor_run, unit_len};
use super::{Document, Inline, NodeId, NodeKind};
use crate::error::{EditResult, inconsistent};

pub(super) fn check(document: &Document) -> EditResult<()> {
    let root = document.root();
    if document.children(root).is_empty() {
        return Err(inconsistent("document has no blocks"));
    }
    for id in document.descendants(root) {
        check_links(document, id)?;
        check_node(document, id)?;
    }
    Ok(())
}

fn check_links(document: &Document, id: NodeId) -> EditResult<()> {
    for &child in document.children(id) {
        if document.parent(child) != Some(id) {
            return Err(inconsistent(format!("broken parent link below {id:?}")));
        }
    }
    Ok(())
}

fn check_node(document: &Document, id: NodeId) -> EditResult<()> {
    let Some(kind) = document.kind(id) else {
        return Err(inconsistent(format!("dangling node {id:?}")));
    };
    let children = document.children(id);
    match kind {
        NodeKind::Root => {
            for &child in children {
                if matches!(
                    document.kind(child),
                    Some(NodeKind::Root | NodeKind::ListItem { .. })
                ) {
                    return Err(inconsistent("list item or root at top level"));
                }
            }
            check_adjacent_lists(document, children)
        }
        NodeKind::List { .. } => {
            if children.is_empty() {
                return Err(inconsistent("empty list container"));
            }
            if children.iter().any(|&child| !document.is_list_item(child)) {
                return Err(inconsistent("list container holds a non-item"));
            }
            Ok(())
        }
        NodeKind::ListItem {
            content,
            preserve_empty,
            ..
        } => {
            if children.len() > 1 || children.iter().any(|&child| !document.is_list(child)) {
                return Err(inconsistent("list item may only own one nested list"));
            }
            if unit_len(content) == 0 && !is_anchor_run(content) {
                return Err(inconsistent("empty list item without anchor"));
            }
            if unit_len(content) > 0 && contains_anchor(content) {
                return Err(inconsistent("stray anchor next to real content"));
            }
            let expected = !has_real_text(content) && !children.is_empty();
            if *preserve_empty != expected {
                return Err(inconsistent("preserve-empty flag out of date"));
            }
            check_inlines(content)
        }
        NodeKind::Blockquote => {
            if children.is_empty() {
                return Err(inconsistent("empty blockquote"));
            }
            if children
                .iter()
                .any(|&child| !matches!(document.kind(child), Some(NodeKind::Paragraph(_))))
            {
                return Err(inconsistent("blockquote holds a non-paragraph"));
            }
            Ok(())
        }
        NodeKind::CodeBlock { lines, .. } => {
            if lines.is_empty() {
                return Err(inconsistent("code block without lines"));
            }
            if lines.iter().any(|line| line.contains('\n')) {
                return Err(inconsistent("code line contains a newline"));
            }
            leaf(children)
        }
        NodeKind::Paragraph(content) | NodeKind::Heading { content, .. } => {
            leaf(children)?;
            check_inlines(content)
        }
        NodeKind::Table(_) | NodeKind::HorizontalRule | NodeKind::Image(_) => leaf(children),
    }
}

fn leaf(children: &[NodeId]) -> EditResult<()> {
    if children.is_empty() {
        Ok(())
    } else {
        Err(inconsistent("leaf block has children"))
    }
}

fn check_adjacent_lists(document: &Document, children: &[NodeId]) -> EditResult<()> {
    for pair in children.windows(2) {
        let (Some(left), Some(right)) = (
            document.list_ordered(pair[0]),
            document.list_ordered(pair[1]),
        ) else {
            continue;
        };
        if left == right {
            return Err(inconsistent("adjacent lists of the same kind"));
        }
    }
    Ok(())
}

fn check_inlines(inlines: &[Inline]) -> EditResult<()> {
    for inline in inlines {
        match inline {
            Inline::Strike(content) => {
                if unit_len(content) == 0 {
                    return Err(inconsistent("empty strike run"));
                }
                check_inlines(content)?;
            }
            Inline::Mark(_, content) | Inline::Link { content, .. } => check_inlines(content)?,
            _ => {}
        }
    }
    Ok(())
}
