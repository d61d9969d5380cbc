use crate::document::inline::{Unit, units};
use crate::document::{Document, NodeId, NodeKind};
use crate::position::Position;

/// Kind of an addressable stop in document order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopKind {
    Text,
    Code,
    Rule,
    Image,
    Table,
}

/// A block the cursor can rest in, flattened in document order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stop {
    pub node: NodeId,
    pub kind: StopKind,
    /// First offset past a checkbox; 0 for everything else.
    pub content_start: usize,
    /// Largest valid offset.
    pub len: usize,
}

impl Stop {
    pub fn is_textual(&self) -> bool {
        matches!(self.kind, StopKind::Text | StopKind::Code)
    }
}

/// One logical line of a stop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Line {
    pub start: usize,
    pub chars: Vec<char>,
}

impl Line {
    pub fn end(&self) -> usize {
        self.start + self.chars.len()
    }

    fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    fn is_blank(&self) -> bool {
        self.chars.iter().all(|ch| ch.is_whitespace())
    }
}

pub fn collect_stops(document: &Document) -> Vec<Stop> {
    document
        .descendants(document.root())
        .into_iter()
        .filter_map(|id| stop_for(document, id))
        .collect()
}

pub fn stop_for(document: &Document, id: NodeId) -> Option<Stop> {
    let kind = match document.kind(id)? {
        NodeKind::Paragraph(_) | NodeKind::Heading { .. } | NodeKind::ListItem { .. } => {
            StopKind::Text
        }
        NodeKind::CodeBlock { .. } => StopKind::Code,
        NodeKind::HorizontalRule => StopKind::Rule,
        NodeKind::Image(_) => StopKind::Image,
        NodeKind::Table(_) => StopKind::Table,
        NodeKind::Root | NodeKind::List { .. } | NodeKind::Blockquote => return None,
    };
    Some(Stop {
        node: id,
        kind,
        content_start: document.content_start(id),
        len: document.position_len(id)?,
    })
}

pub(crate) fn stop_lines(document: &Document, stop: &Stop) -> Vec<Line> {
    match stop.kind {
        StopKind::Text => {
            let units = document.content(stop.node).map(|c| units(c)).unwrap_or_default();
            let mut lines = Vec::new();
            let mut current = Line {
                start: stop.content_start,
                chars: Vec::new(),
            };
            for (idx, unit) in units.iter().enumerate() {
                if *unit == Unit::Break {
                    let next_start = stop.content_start + idx + 1;
                    lines.push(std::mem::replace(
                        &mut current,
                        Line {
                            start: next_start,
                            chars: Vec::new(),
                        },
                    ));
                } else {
                    current.chars.push(unit.as_char());
                }
            }
            lines.push(current);
            lines
        }
        StopKind::Code => {
            let mut start = 0;
            let mut lines = Vec::new();
            for line in document.code_lines(stop.node).into_iter().flatten() {
                let chars: Vec<char> = line.chars().collect();
                let len = chars.len();
                lines.push(Line { start, chars });
                start += len + 1;
            }
            if lines.is_empty() {
                lines.push(Line {
                    start: 0,
                    chars: Vec::new(),
                });
            }
            lines
        }
        StopKind::Rule | StopKind::Image | StopKind::Table => vec![Line {
            start: 0,
            chars: Vec::new(),
        }],
    }
}

/// Index of the line holding `offset`.
pub(crate) fn line_index(lines: &[Line], offset: usize) -> usize {
    lines
        .iter()
        .rposition(|line| line.start <= offset)
        .unwrap_or(0)
}

/// First and last line that count as content: non-empty lines for text,
/// non-blank lines for code. Falls back to the whole block.
pub(crate) fn line_bounds(lines: &[Line], kind: StopKind) -> (usize, usize) {
    let is_content = |line: &Line| match kind {
        StopKind::Code => !line.is_blank(),
        _ => !line.is_empty(),
    };
    let first = lines.iter().position(is_content);
    let last = lines.iter().rposition(is_content);
    match (first, last) {
        (Some(first), Some(last)) => (first, last),
        _ if kind == StopKind::Code => (0, 0),
        _ => (0, lines.len().saturating_sub(1)),
    }
}

/// Where the cursor lands when entering a stop from before it.
pub fn entry_start(document: &Document, stop: &Stop) -> Position {
    match stop.kind {
        StopKind::Text | StopKind::Code => {
            let lines = stop_lines(document, stop);
            let (first, _) = line_bounds(&lines, stop.kind);
            Position::new(stop.node, lines[first].start)
        }
        StopKind::Rule | StopKind::Image | StopKind::Table => Position::new(stop.node, 0),
    }
}

/// Where the cursor lands when entering a stop from after it.
pub fn entry_end(document: &Document, stop: &Stop) -> Position {
    match stop.kind {
        StopKind::Text | StopKind::Code => {
            let lines = stop_lines(document, stop);
            let (_, last) = line_bounds(&lines, stop.kind);
            Position::new(stop.node, lines[last].end())
        }
        StopKind::Image => Position::new(stop.node, 1),
        StopKind::Rule | StopKind::Table => Position::new(stop.node, 0),
    }
}
