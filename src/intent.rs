use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    pub fn is_backward(self) -> bool {
        matches!(self, Direction::Up | Direction::Left)
    }
}

/// A user intent delivered by the host, usually translated from a key press.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Move { direction: Direction, extend: bool },
    MoveWord { forward: bool, extend: bool },
    LineStart { extend: bool },
    LineEnd { extend: bool },
    InsertText(String),
    InsertLineBreak,
    Enter,
    Backspace,
    Delete,
    Tab,
    ShiftTab,
    ToggleCheckbox,
}

impl Intent {
    pub fn arrow(direction: Direction) -> Self {
        Intent::Move {
            direction,
            extend: false,
        }
    }

    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Intent::Move { .. }
                | Intent::MoveWord { .. }
                | Intent::LineStart { .. }
                | Intent::LineEnd { .. }
        )
    }
}

/// What an applied intent did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing happened; tree and selection are untouched.
    Unchanged,
    /// Only the selection moved.
    Moved,
    /// The tree changed and listeners were notified.
    Changed,
}

impl Outcome {
    pub fn is_changed(self) -> bool {
        self == Outcome::Changed
    }

    pub fn is_noop(self) -> bool {
        self == Outcome::Unchanged
    }
}
