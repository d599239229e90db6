//! Single-threaded scheduling primitives.
//!
//! The dashboard runs cooperatively on one thread. Three kinds of deferred
//! work exist: per-frame animation callbacks ([`FrameScheduler`]), debounce
//! deadlines ([`DebounceTimer`] read against a [`Clock`]), and resize
//! notifications (see [`crate::cell_size`]). The host drives all of them.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
pub use web_time::{Duration, Instant};
#[cfg(not(target_arch = "wasm32"))]
pub use std::time::{Duration, Instant};

/// Identifier of a pending frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

type FrameCallback = Box<dyn FnOnce()>;

#[derive(Default)]
struct SchedulerInner {
    next_id: u64,
    pending: BTreeMap<FrameId, FrameCallback>,
    frames_run: u64,
}

/// Host-driven equivalent of `requestAnimationFrame`.
///
/// Cloning yields another handle to the same queue. Callbacks requested while
/// a frame is running are deferred to the next frame.
#[derive(Clone, Default)]
pub struct FrameScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FrameScheduler")
            .field("pending", &inner.pending.len())
            .field("frames_run", &inner.frames_run)
            .finish()
    }
}

impl FrameScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a callback for the next frame.
    pub fn request_frame(&self, callback: impl FnOnce() + 'static) -> FrameId {
        let mut inner = self.inner.borrow_mut();
        let id = FrameId(inner.next_id);
        inner.next_id += 1;
        inner.pending.insert(id, Box::new(callback));
        id
    }

    /// Cancel a pending request. Unknown or already-run ids are ignored.
    pub fn cancel_frame(&self, id: FrameId) {
        self.inner.borrow_mut().pending.remove(&id);
    }

    /// Check if any callback is waiting for a frame.
    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().pending.is_empty()
    }

    /// Number of callbacks waiting for a frame.
    pub fn pending_count(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Total frames run so far.
    pub fn frames_run(&self) -> u64 {
        self.inner.borrow().frames_run
    }

    /// Run one frame. Returns the number of callbacks invoked.
    pub fn run_frame(&self) -> usize {
        let due: Vec<FrameId> = {
            let mut inner = self.inner.borrow_mut();
            inner.frames_run += 1;
            inner.pending.keys().copied().collect()
        };

        let mut ran = 0;
        for id in due {
            // A callback earlier in this frame may have cancelled this one
            let callback = self.inner.borrow_mut().pending.remove(&id);
            if let Some(callback) = callback {
                callback();
                ran += 1;
            }
        }
        ran
    }

    /// Run frames until nothing is pending or `max_frames` is reached.
    /// Returns the number of frames run.
    pub fn run_until_idle(&self, max_frames: usize) -> usize {
        let mut frames = 0;
        while frames < max_frames && self.has_pending() {
            self.run_frame();
            frames += 1;
        }
        frames
    }
}

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Rc<Cell<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// A single resettable deadline.
///
/// Arming replaces any pending deadline. Cancelling is idempotent.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebounceTimer {
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the timer so it fires `delay` after `now`.
    pub fn arm(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    /// Stop the timer without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Check if a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The pending deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fire if the deadline has passed. Disarms the timer when it fires.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_runs_once() {
        let scheduler = FrameScheduler::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        scheduler.request_frame(move || c.set(c.get() + 1));

        assert_eq!(scheduler.run_frame(), 1);
        assert_eq!(scheduler.run_frame(), 0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let scheduler = FrameScheduler::new();
        let id = scheduler.request_frame(|| panic!("cancelled frame ran"));
        scheduler.cancel_frame(id);
        scheduler.cancel_frame(id);
        assert!(!scheduler.has_pending());
        assert_eq!(scheduler.run_frame(), 0);
    }

    #[test]
    fn test_requests_during_frame_defer() {
        let scheduler = FrameScheduler::new();
        let count = Rc::new(Cell::new(0));
        let (s, c) = (scheduler.clone(), count.clone());
        scheduler.request_frame(move || {
            c.set(c.get() + 1);
            let c2 = c.clone();
            s.request_frame(move || c2.set(c2.get() + 1));
        });

        scheduler.run_frame();
        assert_eq!(count.get(), 1);
        assert!(scheduler.has_pending());
        assert_eq!(scheduler.run_until_idle(10), 1);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_debounce_timer() {
        let clock = ManualClock::new();
        let mut timer = DebounceTimer::new();
        timer.arm(clock.now(), Duration::from_millis(100));

        clock.advance(Duration::from_millis(60));
        assert!(!timer.fire_if_due(clock.now()));

        // Re-arming extends the window
        timer.arm(clock.now(), Duration::from_millis(100));
        clock.advance(Duration::from_millis(60));
        assert!(!timer.fire_if_due(clock.now()));

        clock.advance(Duration::from_millis(40));
        assert!(timer.fire_if_due(clock.now()));
        assert!(!timer.is_armed());
        assert!(!timer.fire_if_due(clock.now()));

        timer.cancel();
        timer.cancel();
        assert!(!timer.is_armed());
    }
}
