//! Keyboard input and dashboard shortcuts.

use crate::geometry::GridDelta;
use serde::{Deserialize, Serialize};

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl or Cmd is held, so the browser or OS owns the key.
    pub fn is_command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A key the dashboard reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Enter,
    Space,
    Escape,
    Tab,
    Delete,
    Backspace,
    Char(char),
}

impl Key {
    /// Parse a DOM-style key name (`"ArrowUp"`, `"Enter"`, `" "`, `"l"`).
    pub fn from_name(name: &str) -> Option<Key> {
        let key = match name {
            "ArrowUp" | "Up" => Key::ArrowUp,
            "ArrowDown" | "Down" => Key::ArrowDown,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            "Enter" | "Return" => Key::Enter,
            " " | "Space" | "Spacebar" => Key::Space,
            "Escape" | "Esc" => Key::Escape,
            "Tab" => Key::Tab,
            "Delete" | "Del" => Key::Delete,
            "Backspace" => Key::Backspace,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }

    /// One-cell step for an arrow key.
    pub fn arrow_delta(self) -> Option<GridDelta> {
        let (d_col, d_row) = match self {
            Key::ArrowUp => (0, -1),
            Key::ArrowDown => (0, 1),
            Key::ArrowLeft => (-1, 0),
            Key::ArrowRight => (1, 0),
            _ => return None,
        };
        Some(GridDelta { d_col, d_row })
    }

    fn is_char(self, c: char) -> bool {
        matches!(self, Key::Char(k) if k.eq_ignore_ascii_case(&c))
    }
}

/// What a key press asks the dashboard to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Move the selected widget by one cell.
    Move(GridDelta),
    /// Grow or shrink the selected widget by one cell.
    Resize(GridDelta),
    ToggleLock,
    Remove,
    ToggleFullscreen,
    SelectNext,
    SelectPrevious,
    Deselect,
    ToggleEditMode,
    Help,
    /// Start a keyboard drag of the selected widget.
    PickUp,
    /// Move the keyboard drag preview.
    DragMove(GridDelta),
    /// Commit the keyboard drag.
    Drop,
    CancelDrag,
}

/// Map a key press to a dashboard command.
///
/// While a keyboard drag is active only the drag keys are live.
pub fn map_key(key: Key, modifiers: Modifiers, is_edit_mode: bool, dragging: bool) -> Option<KeyCommand> {
    if modifiers.is_command() || modifiers.alt {
        return None;
    }

    if dragging {
        return match key {
            Key::Enter | Key::Space => Some(KeyCommand::Drop),
            Key::Escape => Some(KeyCommand::CancelDrag),
            _ => key.arrow_delta().map(KeyCommand::DragMove),
        };
    }

    match key {
        Key::Escape => return Some(KeyCommand::Deselect),
        Key::Tab if modifiers.shift => return Some(KeyCommand::SelectPrevious),
        Key::Tab => return Some(KeyCommand::SelectNext),
        k if k.is_char('?') || k.is_char('h') => return Some(KeyCommand::Help),
        k if k.is_char('e') => return Some(KeyCommand::ToggleEditMode),
        k if k.is_char('f') => return Some(KeyCommand::ToggleFullscreen),
        _ => {}
    }

    if !is_edit_mode {
        return None;
    }

    if let Some(delta) = key.arrow_delta() {
        return Some(if modifiers.shift {
            KeyCommand::Resize(delta)
        } else {
            KeyCommand::Move(delta)
        });
    }

    match key {
        Key::Enter | Key::Space => Some(KeyCommand::PickUp),
        Key::Delete | Key::Backspace => Some(KeyCommand::Remove),
        k if k.is_char('l') => Some(KeyCommand::ToggleLock),
        _ => None,
    }
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub shift: bool,
    /// Only active in edit mode.
    pub edit_only: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: &'static str, shift: bool, edit_only: bool, description: &'static str) -> Self {
        Self {
            key,
            shift,
            edit_only,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Shift+Arrows").
    pub fn format(&self) -> String {
        if self.shift {
            format!("Shift+{}", self.key)
        } else {
            self.key.to_string()
        }
    }
}

/// All dashboard shortcuts.
pub fn shortcuts() -> Vec<Shortcut> {
    vec![
        Shortcut::new("Tab", false, false, "Select next widget"),
        Shortcut::new("Tab", true, false, "Select previous widget"),
        Shortcut::new("Escape", false, false, "Deselect or cancel the current drag"),
        Shortcut::new("E", false, false, "Toggle edit mode"),
        Shortcut::new("F", false, false, "Toggle fullscreen for the selected widget"),
        Shortcut::new("?", false, false, "Announce keyboard help"),
        Shortcut::new("H", false, false, "Announce keyboard help"),
        Shortcut::new("Arrows", false, true, "Move selected widget one cell"),
        Shortcut::new("Arrows", true, true, "Resize selected widget one cell"),
        Shortcut::new("Enter", false, true, "Pick up or drop the selected widget"),
        Shortcut::new("Space", false, true, "Pick up or drop the selected widget"),
        Shortcut::new("L", false, true, "Lock or unlock the selected widget"),
        Shortcut::new("Delete", false, true, "Remove the selected widget"),
        Shortcut::new("Backspace", false, true, "Remove the selected widget"),
    ]
}
