use crate::document::inline::{
    anchor_run, contains_anchor, has_real_text, is_anchor_run, prune, strip_anchors, unit_len,
};
use crate::document::{Document, NodeId, NodeKind};

use super::structure::ensure_document_initialized;

/// Post-mutation cleanup. Brings any tree reachable through the editing
/// operations back into canonical shape; running it twice changes nothing.
pub fn normalize(document: &mut Document) {
    let root = document.root();
    for id in document.descendants(root) {
        normalize_leaf(document, id);
    }
    remove_empty_containers(document);
    merge_adjacent_lists(document);
    for id in document.descendants(root) {
        if document.is_list_item(id) {
            normalize_item(document, id);
        }
    }
    ensure_document_initialized(document);
}

fn normalize_leaf(document: &mut Document, id: NodeId) {
    match document.kind_mut(id) {
        Some(NodeKind::CodeBlock { lines, .. }) => {
            if lines.is_empty() {
                lines.push(String::new());
            }
        }
        Some(NodeKind::Paragraph(content) | NodeKind::Heading { content, .. }) => {
            strip_anchors(content)
        }
        Some(NodeKind::ListItem { content, .. }) => prune(content),
        _ => {}
    }
}

/// Drops lists without items and quotes without paragraphs, innermost first.
fn remove_empty_containers(document: &mut Document) {
    let root = document.root();
    for id in document.descendants(root).into_iter().rev() {
        let removable = matches!(
            document.kind(id),
            Some(NodeKind::List { .. } | NodeKind::Blockquote)
        ) && document.children(id).is_empty();
        if removable {
            document.remove(id);
        }
    }
}

/// Merges neighbouring lists of the same kind. A list item may only own one
/// nested list, so any extra list below an item is folded into the first.
pub(crate) fn merge_adjacent_lists(document: &mut Document) {
    let root = document.root();
    for parent in document.descendants(root) {
        let folds_everything = document.is_list_item(parent);
        let mut index = 0;
        loop {
            let children = document.children(parent);
            if index + 1 >= children.len() {
                break;
            }
            let (left, right) = (children[index], children[index + 1]);
            let mergeable = match (document.list_ordered(left), document.list_ordered(right)) {
                (Some(a), Some(b)) => folds_everything || a == b,
                _ => false,
            };
            if !mergeable {
                index += 1;
                continue;
            }
            for item in document.children(right).to_vec() {
                document.detach(item);
                document.append_child(left, item);
            }
            document.remove(right);
        }
    }
}

fn normalize_item(document: &mut Document, id: NodeId) {
    let has_nested = document.nested_list(id).is_some();
    let Some(NodeKind::ListItem {
        content,
        preserve_empty,
        ..
    }) = document.kind_mut(id)
    else {
        return;
    };
    if unit_len(content) == 0 {
        if !is_anchor_run(content) {
            *content = anchor_run();
        }
    } else if contains_anchor(content) {
        strip_anchors(content);
    }
    *preserve_empty = has_nested && !has_real_text(content);
}
