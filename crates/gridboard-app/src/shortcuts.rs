//! Keyboard shortcut documentation.

use gridboard_core::keyboard::{Shortcut, shortcuts};
use std::io::{self, Write};

/// Registry of all keyboard shortcuts, grouped by mode.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Shortcuts available outside edit mode.
    pub fn view_mode() -> Vec<Shortcut> {
        shortcuts().into_iter().filter(|s| !s.edit_only).collect()
    }

    /// Shortcuts that only act in edit mode.
    pub fn edit_mode() -> Vec<Shortcut> {
        shortcuts().into_iter().filter(|s| s.edit_only).collect()
    }

    /// Write the shortcut table.
    pub fn write_all(out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "=== Keyboard Shortcuts ===")?;
        for shortcut in Self::view_mode() {
            writeln!(out, "  {:20} {}", shortcut.format(), shortcut.description)?;
        }
        writeln!(out)?;
        writeln!(out, "=== Edit Mode ===")?;
        for shortcut in Self::edit_mode() {
            writeln!(out, "  {:20} {}", shortcut.format(), shortcut.description)?;
        }
        Ok(())
    }
}
