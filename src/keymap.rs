use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::intent::{Direction, Intent};

/// Translates a terminal key press into an editing intent.
pub fn intent_for_key(event: KeyEvent) -> Option<Intent> {
    if event.kind != KeyEventKind::Press {
        return None;
    }
    let modifiers = event.modifiers;
    let extend = modifiers.contains(KeyModifiers::SHIFT);
    let word = modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);

    let intent = match event.code {
        KeyCode::Left if word => Intent::MoveWord {
            forward: false,
            extend,
        },
        KeyCode::Right if word => Intent::MoveWord {
            forward: true,
            extend,
        },
        KeyCode::Left => arrow(Direction::Left, extend),
        KeyCode::Right => arrow(Direction::Right, extend),
        KeyCode::Up => arrow(Direction::Up, extend),
        KeyCode::Down => arrow(Direction::Down, extend),
        KeyCode::Home => Intent::LineStart { extend },
        KeyCode::End => Intent::LineEnd { extend },
        KeyCode::Enter if extend => Intent::InsertLineBreak,
        KeyCode::Enter => Intent::Enter,
        KeyCode::Backspace => Intent::Backspace,
        KeyCode::Delete => Intent::Delete,
        KeyCode::BackTab => Intent::ShiftTab,
        KeyCode::Tab if extend => Intent::ShiftTab,
        KeyCode::Tab => Intent::Tab,
        KeyCode::Char(' ') if modifiers.contains(KeyModifiers::CONTROL) => Intent::ToggleCheckbox,
        KeyCode::Char(_) if word => return None,
        KeyCode::Char(ch) => Intent::InsertText(ch.to_string()),
        _ => return None,
    };
    Some(intent)
}

fn arrow(direction: Direction, extend: bool) -> Intent {
    Intent::Move { direction, extend }
}

/// Parses a scripted key such as `Enter`, `Shift+Tab`, `Ctrl+Left` or
/// `text:abc`. Text specs expand to one key event per character.
pub fn parse_key_spec(spec: &str) -> Option<Vec<KeyEvent>> {
    if let Some(text) = spec.strip_prefix("text:") {
        return Some(
            text.chars()
                .map(|ch| KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE))
                .collect(),
        );
    }

    let mut parts: Vec<&str> = spec.split('+').collect();
    let key = parts.pop()?;
    let mut modifiers = KeyModifiers::NONE;
    for part in parts {
        modifiers |= match part.to_ascii_lowercase().as_str() {
            "shift" => KeyModifiers::SHIFT,
            "ctrl" | "control" => KeyModifiers::CONTROL,
            "alt" => KeyModifiers::ALT,
            _ => return None,
        };
    }

    let code = match key.to_ascii_lowercase().as_str() {
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "enter" | "return" => KeyCode::Enter,
        "backspace" => KeyCode::Backspace,
        "delete" | "del" => KeyCode::Delete,
        "tab" => KeyCode::Tab,
        "backtab" => KeyCode::BackTab,
        "space" => KeyCode::Char(' '),
        _ => {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => KeyCode::Char(ch),
                _ => return None,
            }
        }
    };
    Some(vec![KeyEvent::new(code, modifiers)])
}
