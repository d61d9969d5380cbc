use super::content::{display_width, next_word_boundary, offset_for_column, previous_word_boundary};
use super::inspect::{
    Stop, StopKind, entry_end, entry_start, line_bounds, line_index, stop_lines,
};
use super::structure::open_paragraph_beside;
use super::Editor;
use crate::document::NodeKind;
use crate::document::inline::unit_len;
use crate::intent::{Direction, Outcome};
use crate::position::{Position, Selection};

impl Editor {
    pub(crate) fn move_cursor(&mut self, direction: Direction, extend: bool) -> Outcome {
        if !extend && !self.selection.is_collapsed() && !direction.is_vertical() {
            let (start, end) = self.selection.ordered(&self.document);
            let target = if direction.is_backward() { start } else { end };
            self.selection = Selection::collapsed(target);
            self.goal_column = None;
            return Outcome::Moved;
        }

        let focus = self.selection.focus;
        let Some(index) = self.stop_index(focus) else {
            return Outcome::Unchanged;
        };
        let stop = self.stops[index].clone();

        if stop.kind == StopKind::Rule {
            let has_neighbour = if direction.is_backward() {
                index > 0
            } else {
                index + 1 < self.stops.len()
            };
            if !has_neighbour {
                return self.escape_rule(&stop, !direction.is_backward());
            }
        }

        let target = match direction {
            Direction::Up | Direction::Down => {
                self.step_vertical(index, focus, direction == Direction::Down)
            }
            Direction::Left => {
                self.goal_column = None;
                self.step_left(index, focus)
            }
            Direction::Right => {
                self.goal_column = None;
                self.step_right(index, focus)
            }
        };
        self.place_focus(target, extend)
    }

    /// A rule at the edge of the document opens a paragraph in the direction
    /// of travel, so the caret is never trapped on it.
    fn escape_rule(&mut self, stop: &Stop, after: bool) -> Outcome {
        let node = stop.node;
        log::trace!("escaping rule at the document edge");
        self.transact(move |document, _, _| open_paragraph_beside(document, node, after))
    }

    fn place_focus(&mut self, target: Option<Position>, extend: bool) -> Outcome {
        let Some(target) = target else {
            return Outcome::Unchanged;
        };
        log::trace!("caret -> {:?}@{}", target.node, target.offset);
        if extend {
            self.selection.focus = target;
        } else {
            self.selection = Selection::collapsed(target);
        }
        Outcome::Moved
    }

    pub(crate) fn stop_index(&self, position: Position) -> Option<usize> {
        self.stops.iter().position(|stop| stop.node == position.node)
    }

    fn previous_entry(&self, index: usize) -> Option<Position> {
        let stop = self.stops.get(index.checked_sub(1)?)?;
        Some(entry_end(&self.document, stop))
    }

    fn next_entry(&self, index: usize) -> Option<Position> {
        let stop = self.stops.get(index + 1)?;
        Some(entry_start(&self.document, stop))
    }

    // ========================================================================
    // Horizontal
    // ========================================================================

    fn step_left(&self, index: usize, focus: Position) -> Option<Position> {
        let stop = &self.stops[index];
        match stop.kind {
            StopKind::Text | StopKind::Code if focus.offset > stop.content_start => {
                Some(Position::new(stop.node, focus.offset - 1))
            }
            StopKind::Image if focus.offset > 0 => Some(Position::new(stop.node, 0)),
            _ => self.previous_entry(index),
        }
    }

    fn step_right(&self, index: usize, focus: Position) -> Option<Position> {
        let stop = &self.stops[index];
        match stop.kind {
            StopKind::Text if focus.offset < stop.content_start => {
                Some(Position::new(stop.node, stop.content_start))
            }
            StopKind::Text | StopKind::Code | StopKind::Image if focus.offset < stop.len => {
                Some(Position::new(stop.node, focus.offset + 1))
            }
            _ => self.next_entry(index),
        }
    }

    pub(crate) fn move_word(&mut self, forward: bool, extend: bool) -> Outcome {
        self.goal_column = None;
        let focus = self.selection.focus;
        let Some(index) = self.stop_index(focus) else {
            return Outcome::Unchanged;
        };
        let stop = self.stops[index].clone();
        if !stop.is_textual() || focus.offset < stop.content_start {
            let target = if forward {
                self.step_right(index, focus)
            } else {
                self.step_left(index, focus)
            };
            return self.place_focus(target, extend);
        }

        let lines = stop_lines(&self.document, &stop);
        let line = &lines[line_index(&lines, focus.offset)];
        let column = focus.offset - line.start;
        let target = if forward && column < line.chars.len() {
            Some(line.start + next_word_boundary(&line.chars, column))
        } else if !forward && column > 0 {
            Some(line.start + previous_word_boundary(&line.chars, column))
        } else {
            None
        };
        let target = match target {
            Some(offset) => Some(Position::new(stop.node, offset)),
            None if forward => self.step_right(index, focus),
            None => self.step_left(index, focus),
        };
        self.place_focus(target, extend)
    }

    pub(crate) fn move_to_line_edge(&mut self, end: bool, extend: bool) -> Outcome {
        self.goal_column = None;
        let focus = self.selection.focus;
        let Some(index) = self.stop_index(focus) else {
            return Outcome::Unchanged;
        };
        let stop = self.stops[index].clone();
        let target = match stop.kind {
            StopKind::Text | StopKind::Code => {
                let lines = stop_lines(&self.document, &stop);
                let offset = focus.offset.max(stop.content_start);
                let line = &lines[line_index(&lines, offset)];
                Position::new(stop.node, if end { line.end() } else { line.start })
            }
            StopKind::Image => Position::new(stop.node, usize::from(end)),
            StopKind::Rule | StopKind::Table => return Outcome::Unchanged,
        };
        if target == focus && (extend || self.selection.is_collapsed()) {
            return Outcome::Unchanged;
        }
        self.place_focus(Some(target), extend)
    }

    // ========================================================================
    // Vertical
    // ========================================================================

    fn step_vertical(&mut self, index: usize, focus: Position, down: bool) -> Option<Position> {
        let stop = self.stops[index].clone();

        if stop.kind == StopKind::Text && focus.offset < stop.content_start {
            let neighbour = if down {
                self.stops.get(index + 1)
            } else {
                index.checked_sub(1).and_then(|prev| self.stops.get(prev))
            };
            if let Some(neighbour) = neighbour.filter(|stop| stop.content_start > 0) {
                return Some(Position::new(neighbour.node, 0));
            }
        }

        let tab_width = self.config.code_tab_width;
        let goal = match stop.kind {
            StopKind::Text | StopKind::Code => {
                let lines = stop_lines(&self.document, &stop);
                let offset = focus.offset.max(stop.content_start);
                let current = line_index(&lines, offset);
                let line = &lines[current];
                let goal = self.goal_column.unwrap_or_else(|| {
                    display_width(&line.chars, offset - line.start, tab_width)
                });
                self.goal_column = Some(goal);

                let (first, last) = line_bounds(&lines, stop.kind);
                if down && current < last {
                    let next = &lines[current + 1];
                    return Some(Position::new(
                        stop.node,
                        offset_for_column(next, goal, tab_width),
                    ));
                }
                if !down && current > first {
                    let previous = &lines[current - 1];
                    return Some(Position::new(
                        stop.node,
                        offset_for_column(previous, goal, tab_width),
                    ));
                }
                goal
            }
            _ => self.goal_column.unwrap_or(0),
        };

        let neighbour = self.vertical_neighbour(index, down)?;
        Some(self.enter_vertically(neighbour, down, goal))
    }

    /// Index of the stop a vertical move lands in. Without the gap preference
    /// an empty paragraph right after a quote is stepped over.
    fn vertical_neighbour(&self, index: usize, down: bool) -> Option<usize> {
        let next = if down {
            index + 1
        } else {
            index.checked_sub(1)?
        };
        let candidate = self.stops.get(next)?;
        if self.config.prefer_top_level_gap || !self.is_quote_gap(candidate) {
            return Some(next);
        }
        let beyond = if down {
            next + 1
        } else {
            match next.checked_sub(1) {
                Some(beyond) => beyond,
                None => return Some(next),
            }
        };
        if self.stops.get(beyond).is_some() {
            log::trace!("stepping over the gap after a quote");
            Some(beyond)
        } else {
            Some(next)
        }
    }

    fn is_quote_gap(&self, stop: &Stop) -> bool {
        let document = &self.document;
        let Some(NodeKind::Paragraph(content)) = document.kind(stop.node) else {
            return false;
        };
        unit_len(content) == 0
            && document.parent(stop.node) == Some(document.root())
            && document
                .previous_sibling(stop.node)
                .is_some_and(|prev| matches!(document.kind(prev), Some(NodeKind::Blockquote)))
    }

    fn enter_vertically(&self, index: usize, down: bool, goal: usize) -> Position {
        let stop = &self.stops[index];
        match stop.kind {
            StopKind::Text | StopKind::Code => {
                let lines = stop_lines(&self.document, stop);
                let (first, last) = line_bounds(&lines, stop.kind);
                let line = if down { &lines[first] } else { &lines[last] };
                Position::new(
                    stop.node,
                    offset_for_column(line, goal, self.config.code_tab_width),
                )
            }
            StopKind::Image => Position::new(stop.node, usize::from(!down)),
            StopKind::Rule | StopKind::Table => Position::new(stop.node, 0),
        }
    }
}
