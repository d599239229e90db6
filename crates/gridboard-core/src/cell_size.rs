//! Responsive cell sizing.
//!
//! A [`SizeSource`] stands in for an observed element (the dashboard
//! container) or the viewport. The host reports new widths with
//! [`SizeSource::set_width`]; subscribers are flagged and pick the change up
//! on their next poll, so any number of resizes between polls collapse into
//! one recomputation.

use crate::geometry::{GridSize, cell_size};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

struct ObserverSlot {
    pending: Cell<bool>,
}

#[derive(Default)]
struct SourceInner {
    /// `None` while the element is not mounted.
    width: Cell<Option<f64>>,
    observers: RefCell<Vec<Weak<ObserverSlot>>>,
}

/// A shared handle to something with a measurable width.
#[derive(Clone, Default)]
pub struct SizeSource {
    inner: Rc<SourceInner>,
}

impl fmt::Debug for SizeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeSource")
            .field("width", &self.inner.width.get())
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl PartialEq for SizeSource {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl SizeSource {
    /// A source that is not mounted yet.
    pub fn unmounted() -> Self {
        Self::default()
    }

    /// A mounted source with an initial width.
    pub fn with_width(width: f64) -> Self {
        let source = Self::default();
        source.inner.width.set(Some(width));
        source
    }

    /// Current width, or `None` if not mounted.
    pub fn width(&self) -> Option<f64> {
        self.inner.width.get()
    }

    /// Check if the element is mounted.
    pub fn is_mounted(&self) -> bool {
        self.inner.width.get().is_some()
    }

    /// Report a new measured width and notify observers.
    pub fn set_width(&self, width: f64) {
        self.inner.width.set(Some(width));
        self.notify();
    }

    /// Change the width without notifying observers, as when a layout
    /// change resizes the element before its observer fires.
    #[cfg(test)]
    pub(crate) fn set_width_unobserved(&self, width: f64) {
        self.inner.width.set(Some(width));
    }

    /// Report that the element went away.
    pub fn unmount(&self) {
        self.inner.width.set(None);
        self.notify();
    }

    /// Start observing size changes. Dropping the subscription unobserves.
    pub fn observe(&self) -> ResizeSubscription {
        let slot = Rc::new(ObserverSlot {
            pending: Cell::new(false),
        });
        self.inner.observers.borrow_mut().push(Rc::downgrade(&slot));
        ResizeSubscription {
            slot: Some(slot),
            source: Rc::downgrade(&self.inner),
        }
    }

    /// Number of live observers.
    pub fn observer_count(&self) -> usize {
        self.inner
            .observers
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    fn notify(&self) {
        let mut observers = self.inner.observers.borrow_mut();
        observers.retain(|weak| match weak.upgrade() {
            Some(slot) => {
                slot.pending.set(true);
                true
            }
            None => false,
        });
    }
}

/// An active observation of a [`SizeSource`].
pub struct ResizeSubscription {
    slot: Option<Rc<ObserverSlot>>,
    source: Weak<SourceInner>,
}

impl fmt::Debug for ResizeSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizeSubscription")
            .field("active", &self.is_active())
            .finish()
    }
}

impl ResizeSubscription {
    /// Consume a pending notification, if any.
    pub fn take_pending(&self) -> bool {
        self.slot
            .as_ref()
            .map(|slot| slot.pending.replace(false))
            .unwrap_or(false)
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_some()
    }

    /// Stop observing. Safe to call more than once, and after the source is gone.
    pub fn disconnect(&mut self) {
        let Some(slot) = self.slot.take() else {
            return;
        };
        if let Some(source) = self.source.upgrade() {
            source
                .observers
                .borrow_mut()
                .retain(|weak| !std::ptr::eq(weak.as_ptr(), Rc::as_ptr(&slot)));
        }
    }
}

impl Drop for ResizeSubscription {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Inputs to the cell size computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridParams {
    pub grid_size: GridSize,
    pub gap: f64,
    pub padding: f64,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            grid_size: GridSize::default(),
            gap: 16.0,
            padding: 16.0,
        }
    }
}

/// Keeps the cell size in step with the container width.
#[derive(Debug)]
pub struct CellSizeTracker {
    container: SizeSource,
    params: GridParams,
    cell_size: f64,
    container_sub: Option<ResizeSubscription>,
    viewport_sub: Option<ResizeSubscription>,
}

impl CellSizeTracker {
    /// Measure once and start observing the container and (optionally) the viewport.
    pub fn mount(container: &SizeSource, viewport: Option<&SizeSource>, params: GridParams) -> Self {
        let mut tracker = Self {
            container: container.clone(),
            params,
            cell_size: 0.0,
            container_sub: Some(container.observe()),
            viewport_sub: viewport.map(SizeSource::observe),
        };
        tracker.recalculate();
        log::debug!(
            "Cell size tracker mounted: width={:?}, cell={}",
            container.width(),
            tracker.cell_size
        );
        tracker
    }

    /// Current cell size in pixels.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn params(&self) -> GridParams {
        self.params
    }

    /// The observed container.
    pub fn container(&self) -> &SizeSource {
        &self.container
    }

    /// Check if observers are still attached.
    pub fn is_observing(&self) -> bool {
        self.container_sub.as_ref().is_some_and(ResizeSubscription::is_active)
    }

    /// Recompute from the container's current width.
    ///
    /// An unmounted container measures as width 0.
    pub fn recalculate(&mut self) -> f64 {
        let width = self.container.width().unwrap_or(0.0);
        self.cell_size = cell_size(width, self.params.grid_size, self.params.gap, self.params.padding);
        self.cell_size
    }

    /// Change grid size, gap, or padding. Returns the new cell size.
    pub fn set_params(&mut self, params: GridParams) -> f64 {
        self.params = params;
        self.recalculate()
    }

    /// Apply pending resize notifications.
    ///
    /// Returns the new cell size if it changed.
    pub fn poll(&mut self) -> Option<f64> {
        if !self.is_observing() {
            return None;
        }
        let container = self.container_sub.as_ref().is_some_and(ResizeSubscription::take_pending);
        let viewport = self.viewport_sub.as_ref().is_some_and(ResizeSubscription::take_pending);
        if !container && !viewport {
            return None;
        }

        let previous = self.cell_size;
        let next = self.recalculate();
        if (next - previous).abs() > f64::EPSILON {
            log::trace!("Cell size changed: {} -> {}", previous, next);
            Some(next)
        } else {
            None
        }
    }

    /// Detach all observers. Later polls do nothing.
    pub fn teardown(&mut self) {
        if let Some(mut sub) = self.container_sub.take() {
            sub.disconnect();
        }
        if let Some(mut sub) = self.viewport_sub.take() {
            sub.disconnect();
        }
        log::debug!("Cell size tracker torn down");
    }
}

impl Drop for CellSizeTracker {
    fn drop(&mut self) {
        if self.container_sub.is_some() || self.viewport_sub.is_some() {
            self.teardown();
        }
    }
}
