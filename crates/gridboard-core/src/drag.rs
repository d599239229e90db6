//! In-flight drag and resize gestures.
//!
//! A [`DragSession`] only computes a preview placement. Nothing touches the
//! dashboard until [`DragSession::finish`] hands back the command to apply.

use crate::dashboard::LayoutCommand;
use crate::geometry::{GridDelta, GridPosition, constrain_to_grid, delta_to_grid_units};
use crate::widget::HandleKind;
use kurbo::{Point, Vec2};

/// What the gesture changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    /// Moving the whole widget.
    Move,
    /// Dragging a resize handle.
    Resize(HandleKind),
}

/// Where the gesture comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragInput {
    Pointer,
    /// Picked up with Enter/Space and moved with the arrow keys.
    Keyboard,
}

/// State of an active drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    /// The widget being manipulated.
    pub widget_id: String,
    pub kind: DragKind,
    pub input: DragInput,
    /// Starting point of the drag in container pixels.
    pub start_point: Point,
    /// Current point of the drag.
    pub current_point: Point,
    /// Placement before the gesture started.
    pub original: GridPosition,
    preview: GridPosition,
}

impl DragSession {
    /// Start a pointer gesture at `start_point`.
    pub fn pointer(
        widget_id: impl Into<String>,
        kind: DragKind,
        start_point: Point,
        original: GridPosition,
    ) -> Self {
        Self {
            widget_id: widget_id.into(),
            kind,
            input: DragInput::Pointer,
            start_point,
            current_point: start_point,
            original,
            preview: original,
        }
    }

    /// Pick a widget up from the keyboard.
    pub fn keyboard(widget_id: impl Into<String>, original: GridPosition) -> Self {
        Self {
            widget_id: widget_id.into(),
            kind: DragKind::Move,
            input: DragInput::Keyboard,
            start_point: Point::ZERO,
            current_point: Point::ZERO,
            original,
            preview: original,
        }
    }

    pub fn is_keyboard(&self) -> bool {
        self.input == DragInput::Keyboard
    }

    /// Get the drag delta in pixels.
    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }

    /// Placement the widget would take if the gesture ended now.
    pub fn preview(&self) -> GridPosition {
        self.preview
    }

    /// Track the pointer and recompute the preview.
    pub fn update(&mut self, pointer: Point, cell_size: f64, gap: f64, columns: u32) -> GridPosition {
        self.current_point = pointer;
        let delta = delta_to_grid_units(self.delta(), cell_size, gap);
        self.preview = apply_delta(self.kind, self.original, delta, columns);
        self.preview
    }

    /// Shift the preview by whole cells (keyboard drag).
    pub fn nudge(&mut self, delta: GridDelta, columns: u32) -> GridPosition {
        self.preview = apply_delta(self.kind, self.preview, delta, columns);
        self.preview
    }

    /// The command that commits the gesture, or `None` if nothing changed.
    pub fn finish(self) -> Option<LayoutCommand> {
        if self.preview == self.original {
            return None;
        }
        let id = self.widget_id;
        Some(match self.kind {
            DragKind::Move => LayoutCommand::Move {
                id,
                x: self.preview.x,
                y: self.preview.y,
            },
            DragKind::Resize(_) => LayoutCommand::Resize {
                id,
                width: self.preview.width,
                height: self.preview.height,
            },
        })
    }

    /// Abandon the gesture, returning the placement to restore.
    pub fn cancel(self) -> GridPosition {
        self.original
    }
}

fn apply_delta(kind: DragKind, from: GridPosition, delta: GridDelta, columns: u32) -> GridPosition {
    match kind {
        DragKind::Move => {
            let (x, y) = from.offset(delta);
            let (x, y) = constrain_to_grid(x, y, from.width, from.height, columns);
            GridPosition { x, y, ..from }
        }
        DragKind::Resize(handle) => {
            let grow = |size: u32, d: i32, origin: u32| -> u32 {
                let max = i64::from(columns.saturating_sub(origin).max(1));
                (i64::from(size) + i64::from(d)).clamp(1, max) as u32
            };
            let width = if handle.resizes_width() {
                grow(from.width, delta.d_col, from.x)
            } else {
                from.width
            };
            let height = if handle.resizes_height() {
                grow(from.height, delta.d_row, from.y)
            } else {
                from.height
            };
            GridPosition { width, height, ..from }
        }
    }
}
