//! Widget interaction state.

/// The interaction state of a placed widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetState {
    /// Normal display state - no interaction.
    #[default]
    Normal,
    /// Pointer is over the widget.
    Hovered,
    /// Widget is selected (shows handles, responds to keyboard moves).
    Selected,
    /// Widget is being moved by pointer or keyboard.
    Dragging,
    /// Widget is being resized from a handle.
    Resizing,
}

impl WidgetState {
    /// Check if widget is selected (including while it is being manipulated).
    pub fn is_selected(&self) -> bool {
        matches!(self, Self::Selected | Self::Dragging | Self::Resizing)
    }

    /// Check if widget is being moved or resized.
    pub fn is_manipulating(&self) -> bool {
        matches!(self, Self::Dragging | Self::Resizing)
    }
}
