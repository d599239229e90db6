//! Deferred mounting of off-screen widgets.
//!
//! A [`LazyLoader`] is a one-shot latch: once the observed element has been
//! seen in the (margin-expanded) viewport it reports visible forever and stops
//! observing.

use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Intersection observation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LazyOptions {
    /// Fraction of the element that must be inside the root to trigger.
    pub threshold: f64,
    /// Pixels the viewport is grown by on every side, so loading starts early.
    pub root_margin: f64,
}

impl Default for LazyOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: 50.0,
        }
    }
}

/// Fraction of `element` inside `viewport` grown by `root_margin`.
///
/// A zero-area element counts as fully visible when it lies inside the root.
pub fn intersection_ratio(element: Rect, viewport: Rect, root_margin: f64) -> f64 {
    let root = viewport.inflate(root_margin, root_margin);
    let area = element.area();
    let hit = element.intersect(root);
    if area <= 0.0 {
        let inside = element.x0 >= root.x0
            && element.x1 <= root.x1
            && element.y0 >= root.y0
            && element.y1 <= root.y1;
        return if inside { 1.0 } else { 0.0 };
    }
    (hit.area() / area).clamp(0.0, 1.0)
}

/// Visibility latch for one element.
#[derive(Debug, Clone, PartialEq)]
pub struct LazyLoader {
    options: LazyOptions,
    visible: bool,
    observing: bool,
}

impl Default for LazyLoader {
    fn default() -> Self {
        Self::new(LazyOptions::default())
    }
}

impl LazyLoader {
    pub fn new(options: LazyOptions) -> Self {
        Self {
            options,
            visible: false,
            observing: true,
        }
    }

    pub fn options(&self) -> LazyOptions {
        self.options
    }

    /// Feed one intersection observation. Returns the latch value.
    pub fn observe(&mut self, is_intersecting: bool, ratio: f64) -> bool {
        if !self.observing {
            return self.visible;
        }
        if is_intersecting && ratio >= self.options.threshold {
            self.visible = true;
            self.observing = false;
            log::trace!("Lazy element became visible at ratio {:.2}", ratio);
        }
        self.visible
    }

    /// Compute the observation from element and viewport rects.
    pub fn observe_rects(&mut self, element: Rect, viewport: Rect) -> bool {
        let ratio = intersection_ratio(element, viewport, self.options.root_margin);
        self.observe(ratio > 0.0, ratio)
    }

    /// Has the element ever been visible.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Still waiting for the first sighting.
    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Mount full content rather than a placeholder.
    pub fn should_mount(&self) -> bool {
        self.visible
    }

    /// Stop observing without triggering, e.g. when the element unmounts.
    pub fn disconnect(&mut self) {
        self.observing = false;
    }
}
