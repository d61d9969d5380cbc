use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

pub mod inline;
pub mod tree;
mod validate;

use inline::{has_real_text, strip_anchors, unit_len};
pub use tree::{Block, Checkbox, Image, Inline, List, ListItem, MarkStyle, Table};

slotmap::new_key_type! {
    /// Stable handle of a block node. Handles of removed nodes never resolve again.
    pub struct NodeId;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Root,
    Paragraph(Vec<Inline>),
    Heading {
        level: u8,
        content: Vec<Inline>,
    },
    List {
        ordered: bool,
    },
    ListItem {
        checkbox: Option<Checkbox>,
        content: Vec<Inline>,
        preserve_empty: bool,
    },
    CodeBlock {
        language: Option<String>,
        lines: Vec<String>,
    },
    Blockquote,
    Table(Table),
    HorizontalRule,
    Image(Image),
}

impl NodeKind {
    pub fn list_item(checkbox: Option<Checkbox>, content: Vec<Inline>) -> Self {
        NodeKind::ListItem {
            checkbox,
            content,
            preserve_empty: false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Root => "Root",
            NodeKind::Paragraph(_) => "Paragraph",
            NodeKind::Heading { .. } => "Heading",
            NodeKind::List { ordered: true } => "Numbered List",
            NodeKind::List { ordered: false } => "Bullet List",
            NodeKind::ListItem {
                checkbox: Some(_), ..
            } => "Checklist Item",
            NodeKind::ListItem { .. } => "List Item",
            NodeKind::CodeBlock { .. } => "Code",
            NodeKind::Blockquote => "Quote",
            NodeKind::Table(_) => "Table",
            NodeKind::HorizontalRule => "Horizontal Rule",
            NodeKind::Image(_) => "Image",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena-backed block tree. Containers own their children; every link is a
/// [`NodeId`] that is checked on access.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document holding a single empty paragraph.
    pub fn new() -> Self {
        let mut document = Self::empty();
        let paragraph = document.insert(NodeKind::Paragraph(Vec::new()));
        let root = document.root;
        document.attach(root, 0, paragraph);
        document
    }

    fn empty() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Root,
        });
        Self { nodes, root }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut document = Self::empty();
        let root = document.root;
        for block in blocks {
            let id = document.build_block(block);
            let index = document.children(root).len();
            document.attach(root, index, id);
        }
        if document.children(root).is_empty() {
            let paragraph = document.insert(NodeKind::Paragraph(Vec::new()));
            document.attach(root, 0, paragraph);
        }
        document
    }

    fn build_block(&mut self, block: Block) -> NodeId {
        match block {
            Block::Paragraph(content) => self.insert(NodeKind::Paragraph(content)),
            Block::Heading { level, content } => self.insert(NodeKind::Heading {
                level: level.clamp(1, 6),
                content,
            }),
            Block::List(list) => self.build_list(list),
            Block::CodeBlock { language, mut lines } => {
                if lines.is_empty() {
                    lines.push(String::new());
                }
                self.insert(NodeKind::CodeBlock { language, lines })
            }
            Block::Blockquote(paragraphs) => {
                let quote = self.insert(NodeKind::Blockquote);
                for (index, content) in paragraphs.into_iter().enumerate() {
                    let paragraph = self.insert(NodeKind::Paragraph(content));
                    self.attach(quote, index, paragraph);
                }
                quote
            }
            Block::Table(table) => self.insert(NodeKind::Table(table)),
            Block::HorizontalRule => self.insert(NodeKind::HorizontalRule),
            Block::Image(image) => self.insert(NodeKind::Image(image)),
        }
    }

    fn build_list(&mut self, list: List) -> NodeId {
        let id = self.insert(NodeKind::List {
            ordered: list.ordered,
        });
        for (index, item) in list.items.into_iter().enumerate() {
            let item_id = self.insert(NodeKind::ListItem {
                checkbox: item.checkbox,
                content: item.content,
                preserve_empty: item.preserve_empty,
            });
            if let Some(nested) = item.nested {
                let nested_id = self.build_list(nested);
                self.attach(item_id, 0, nested_id);
            }
            self.attach(id, index, item_id);
        }
        id
    }

    /// The value tree exactly as stored, anchors included.
    pub fn to_blocks(&self) -> Vec<Block> {
        self.children(self.root)
            .iter()
            .filter_map(|&id| self.block_value(id))
            .collect()
    }

    /// The value tree with invisible anchors removed, as handed to the markup
    /// converter.
    pub fn cleaned_tree(&self) -> Vec<Block> {
        let mut blocks = self.to_blocks();
        for block in &mut blocks {
            clean_block(block);
        }
        blocks
    }

    fn block_value(&self, id: NodeId) -> Option<Block> {
        let block = match self.kind(id)? {
            NodeKind::Paragraph(content) => Block::Paragraph(content.clone()),
            NodeKind::Heading { level, content } => Block::Heading {
                level: *level,
                content: content.clone(),
            },
            NodeKind::List { .. } => Block::List(self.list_value(id)?),
            NodeKind::CodeBlock { language, lines } => Block::CodeBlock {
                language: language.clone(),
                lines: lines.clone(),
            },
            NodeKind::Blockquote => Block::Blockquote(
                self.children(id)
                    .iter()
                    .filter_map(|&child| self.content(child).cloned())
                    .collect(),
            ),
            NodeKind::Table(table) => Block::Table(table.clone()),
            NodeKind::HorizontalRule => Block::HorizontalRule,
            NodeKind::Image(image) => Block::Image(image.clone()),
            NodeKind::Root | NodeKind::ListItem { .. } => return None,
        };
        Some(block)
    }

    fn list_value(&self, id: NodeId) -> Option<List> {
        let ordered = self.list_ordered(id)?;
        let items = self
            .children(id)
            .iter()
            .filter_map(|&item| self.item_value(item))
            .collect();
        Some(List { ordered, items })
    }

    fn item_value(&self, id: NodeId) -> Option<ListItem> {
        let NodeKind::ListItem {
            checkbox,
            content,
            preserve_empty,
        } = self.kind(id)?
        else {
            return None;
        };
        Some(ListItem {
            checkbox: *checkbox,
            content: content.clone(),
            nested: self.nested_list(id).and_then(|nested| self.list_value(nested)),
            preserve_empty: *preserve_empty,
        })
    }

    // ========================================================================
    // Node access
    // ========================================================================

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id).map(|node| &node.kind)
    }

    pub fn kind_mut(&mut self, id: NodeId) -> Option<&mut NodeKind> {
        self.nodes.get_mut(id).map(|node| &mut node.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the node is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|prev| self.children(parent).get(prev).copied())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Child indices from the root down to `id`.
    pub fn path(&self, id: NodeId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = id;
        while current != self.root {
            path.push(self.index_in_parent(current)?);
            current = self.parent(current)?;
        }
        path.reverse();
        Some(path)
    }

    /// Pre-order walk of the subtree below `id`, `id` included.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        result
    }

    // ========================================================================
    // Block-specific helpers
    // ========================================================================

    /// Inline content of paragraphs, headings and list items.
    pub fn content(&self, id: NodeId) -> Option<&Vec<Inline>> {
        match self.kind(id)? {
            NodeKind::Paragraph(content)
            | NodeKind::Heading { content, .. }
            | NodeKind::ListItem { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn content_mut(&mut self, id: NodeId) -> Option<&mut Vec<Inline>> {
        match self.kind_mut(id)? {
            NodeKind::Paragraph(content)
            | NodeKind::Heading { content, .. }
            | NodeKind::ListItem { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn is_list_item(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::ListItem { .. }))
    }

    pub fn is_list(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::List { .. }))
    }

    pub fn list_ordered(&self, id: NodeId) -> Option<bool> {
        match self.kind(id)? {
            NodeKind::List { ordered } => Some(*ordered),
            _ => None,
        }
    }

    pub fn checkbox(&self, id: NodeId) -> Option<Checkbox> {
        match self.kind(id)? {
            NodeKind::ListItem { checkbox, .. } => *checkbox,
            _ => None,
        }
    }

    /// The nested list owned by a list item.
    pub fn nested_list(&self, item: NodeId) -> Option<NodeId> {
        if !self.is_list_item(item) {
            return None;
        }
        self.children(item)
            .iter()
            .copied()
            .find(|&child| self.is_list(child))
    }

    /// The list item owning the list that contains `item`.
    pub fn parent_item(&self, item: NodeId) -> Option<NodeId> {
        let container = self.parent(item)?;
        let owner = self.parent(container)?;
        self.is_list_item(owner).then_some(owner)
    }

    /// Number of list items above `item`.
    pub fn item_depth(&self, item: NodeId) -> usize {
        let mut depth = 0;
        let mut current = item;
        while let Some(owner) = self.parent_item(current) {
            depth += 1;
            current = owner;
        }
        depth
    }

    pub fn item_has_text(&self, item: NodeId) -> bool {
        self.content(item).is_some_and(|content| has_real_text(content))
    }

    pub fn preserve_empty(&self, item: NodeId) -> bool {
        matches!(
            self.kind(item),
            Some(NodeKind::ListItem {
                preserve_empty: true,
                ..
            })
        )
    }

    pub fn code_lines(&self, id: NodeId) -> Option<&Vec<String>> {
        match self.kind(id)? {
            NodeKind::CodeBlock { lines, .. } => Some(lines),
            _ => None,
        }
    }

    /// Index of the first addressable offset: 1 behind a checkbox, 0 elsewhere.
    pub fn content_start(&self, id: NodeId) -> usize {
        usize::from(self.checkbox(id).is_some())
    }

    /// Number of logical positions past the first one, or `None` for containers.
    pub fn position_len(&self, id: NodeId) -> Option<usize> {
        let len = match self.kind(id)? {
            NodeKind::Paragraph(content) | NodeKind::Heading { content, .. } => unit_len(content),
            NodeKind::ListItem {
                checkbox, content, ..
            } => usize::from(checkbox.is_some()) + unit_len(content),
            NodeKind::CodeBlock { lines, .. } => code_char_count(lines),
            NodeKind::Image(_) => 1,
            NodeKind::HorizontalRule | NodeKind::Table(_) => 0,
            NodeKind::Root | NodeKind::List { .. } | NodeKind::Blockquote => return None,
        };
        Some(len)
    }

    // ========================================================================
    // Structural edits
    // ========================================================================

    /// Creates a detached node.
    pub fn insert(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.insert(Node {
            parent: None,
            children: Vec::new(),
            kind,
        })
    }

    /// Attaches a detached node below `parent` at `index` (clamped).
    pub fn attach(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if !self.nodes.contains_key(child) {
            return;
        }
        let Some(parent_node) = self.nodes.get_mut(parent) else {
            return;
        };
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, child);
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = Some(parent);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.children(parent).len();
        self.attach(parent, index, child);
    }

    pub fn insert_after(&mut self, sibling: NodeId, node: NodeId) -> bool {
        let (Some(parent), Some(index)) = (self.parent(sibling), self.index_in_parent(sibling))
        else {
            return false;
        };
        self.attach(parent, index + 1, node);
        true
    }

    pub fn insert_before(&mut self, sibling: NodeId, node: NodeId) -> bool {
        let (Some(parent), Some(index)) = (self.parent(sibling), self.index_in_parent(sibling))
        else {
            return false;
        };
        self.attach(parent, index, node);
        true
    }

    /// Unlinks a node from its parent without dropping it.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|&child| child != id);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = None;
        }
    }

    /// Detaches a node and drops its whole subtree.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        self.detach(id);
        for descendant in self.descendants(id) {
            self.nodes.remove(descendant);
        }
    }

    pub fn check_invariants(&self) -> crate::error::EditResult<()> {
        validate::check(self)
    }
}

pub(crate) fn code_char_count(lines: &[String]) -> usize {
    let chars: usize = lines.iter().map(|line| line.chars().count()).sum();
    chars + lines.len().saturating_sub(1)
}

fn clean_block(block: &mut Block) {
    match block {
        Block::Paragraph(content) | Block::Heading { content, .. } => strip_anchors(content),
        Block::List(list) => clean_list(list),
        Block::Blockquote(paragraphs) => paragraphs.iter_mut().for_each(strip_anchors),
        Block::CodeBlock { .. } | Block::Table(_) | Block::HorizontalRule | Block::Image(_) => {}
    }
}

fn clean_list(list: &mut List) {
    for item in &mut list.items {
        strip_anchors(&mut item.content);
        if let Some(nested) = &mut item.nested {
            clean_list(nested);
        }
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod document_tests;
