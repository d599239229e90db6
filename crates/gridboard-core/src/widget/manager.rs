//! Widget manager for tracking interaction state of placed widgets.

use super::state::WidgetState;
use std::collections::HashMap;

/// Tracks hover, selection, and manipulation for all widgets.
///
/// This keeps UI concerns out of the widget records, which remain pure data
/// owned by the dashboard store.
#[derive(Debug, Clone, Default)]
pub struct WidgetManager {
    /// Non-normal state per widget id.
    states: HashMap<String, WidgetState>,
    /// The selected widget. At most one widget is selected.
    selected: Option<String>,
    /// Widget currently under the pointer.
    hovered: Option<String>,
}

impl WidgetManager {
    /// Create a new widget manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the state of a widget.
    pub fn state(&self, id: &str) -> WidgetState {
        self.states.get(id).copied().unwrap_or_default()
    }

    /// Set the state of a widget.
    pub fn set_state(&mut self, id: &str, state: WidgetState) {
        if state.is_selected() {
            // Single selection: demote any previous selection
            if let Some(old) = self.selected.take() {
                if old != id {
                    self.states.remove(&old);
                }
            }
            self.selected = Some(id.to_string());
        } else if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }

        if state == WidgetState::Normal {
            self.states.remove(id);
        } else {
            self.states.insert(id.to_string(), state);
        }
    }

    /// The selected widget id, if any.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Check if a widget is selected.
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }

    /// The hovered widget id, if any.
    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Set the hovered widget.
    pub fn set_hovered(&mut self, id: Option<&str>) {
        // Clear old hover state
        if let Some(old) = self.hovered.take() {
            if Some(old.as_str()) != id && self.state(&old) == WidgetState::Hovered {
                self.states.remove(&old);
            }
        }

        // Set new hover state
        if let Some(new_id) = id {
            if self.state(new_id) == WidgetState::Normal {
                self.states.insert(new_id.to_string(), WidgetState::Hovered);
            }
        }

        self.hovered = id.map(str::to_string);
    }

    /// Select a widget, replacing any other selection.
    pub fn select(&mut self, id: &str) {
        self.set_state(id, WidgetState::Selected);
    }

    /// Clear the selection. Returns the previously selected id.
    pub fn clear_selection(&mut self) -> Option<String> {
        let old = self.selected.take()?;
        self.states.remove(&old);
        Some(old)
    }

    /// Mark the selected widget as being dragged or resized.
    pub fn begin_manipulation(&mut self, id: &str, state: WidgetState) {
        debug_assert!(state.is_manipulating());
        self.set_state(id, state);
    }

    /// Return a manipulated widget to plain selection.
    pub fn end_manipulation(&mut self) {
        if let Some(id) = self.selected.clone() {
            if self.state(&id).is_manipulating() {
                self.states.insert(id, WidgetState::Selected);
            }
        }
    }

    /// Check if any widget is being dragged or resized.
    pub fn is_manipulating(&self) -> bool {
        self.selected
            .as_deref()
            .is_some_and(|id| self.state(id).is_manipulating())
    }

    /// Remove state for a deleted widget.
    pub fn remove(&mut self, id: &str) {
        self.states.remove(id);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if self.hovered.as_deref() == Some(id) {
            self.hovered = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_selection() {
        let mut manager = WidgetManager::new();
        manager.select("a");
        manager.select("b");
        assert_eq!(manager.selected(), Some("b"));
        assert_eq!(manager.state("a"), WidgetState::Normal);
        assert_eq!(manager.state("b"), WidgetState::Selected);
    }

    #[test]
    fn test_hover_does_not_override_selection() {
        let mut manager = WidgetManager::new();
        manager.select("a");
        manager.set_hovered(Some("a"));
        assert_eq!(manager.state("a"), WidgetState::Selected);

        manager.set_hovered(Some("b"));
        assert_eq!(manager.state("b"), WidgetState::Hovered);
        manager.set_hovered(None);
        assert_eq!(manager.state("b"), WidgetState::Normal);
    }

    #[test]
    fn test_manipulation_lifecycle() {
        let mut manager = WidgetManager::new();
        manager.select("a");
        manager.begin_manipulation("a", WidgetState::Dragging);
        assert!(manager.is_manipulating());
        assert!(manager.is_selected("a"));

        manager.end_manipulation();
        assert!(!manager.is_manipulating());
        assert_eq!(manager.state("a"), WidgetState::Selected);
    }

    #[test]
    fn test_remove_clears_everything() {
        let mut manager = WidgetManager::new();
        manager.select("a");
        manager.set_hovered(Some("a"));
        manager.remove("a");
        assert_eq!(manager.selected(), None);
        assert_eq!(manager.hovered(), None);
        assert_eq!(manager.state("a"), WidgetState::Normal);
    }
}
