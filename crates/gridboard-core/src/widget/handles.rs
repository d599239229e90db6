//! Resize handles drawn on a selected widget.

use kurbo::{Point, Rect};

/// Which edge or corner a handle resizes.
///
/// Widgets are anchored at their top-left cell, so only handles on the
/// right and bottom sides exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Right,
    Bottom,
    BottomRight,
}

impl HandleKind {
    /// Whether dragging this handle changes the width.
    pub fn resizes_width(self) -> bool {
        matches!(self, HandleKind::Right | HandleKind::BottomRight)
    }

    /// Whether dragging this handle changes the height.
    pub fn resizes_height(self) -> bool {
        matches!(self, HandleKind::Bottom | HandleKind::BottomRight)
    }
}

/// A manipulation handle on a widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub kind: HandleKind,
    /// Center of the handle in container pixels.
    pub position: Point,
}

impl Handle {
    pub fn new(kind: HandleKind, position: Point) -> Self {
        Self { kind, position }
    }

    /// Check if a point lies within `tolerance` pixels of this handle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= tolerance * tolerance
    }
}

/// Handles for a widget occupying `rect`.
pub fn widget_handles(rect: Rect) -> [Handle; 3] {
    let center = rect.center();
    [
        Handle::new(HandleKind::Right, Point::new(rect.x1, center.y)),
        Handle::new(HandleKind::Bottom, Point::new(center.x, rect.y1)),
        Handle::new(HandleKind::BottomRight, Point::new(rect.x1, rect.y1)),
    ]
}

/// The handle under `point`, preferring the corner when handles overlap.
pub fn hit_test_handle(rect: Rect, point: Point, tolerance: f64) -> Option<HandleKind> {
    widget_handles(rect)
        .into_iter()
        .rev()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.kind)
}
