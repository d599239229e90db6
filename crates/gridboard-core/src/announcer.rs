//! Screen reader announcements.
//!
//! Messages are queued and published together once the debounce window
//! closes, so a burst of actions produces one live-region update holding
//! every message. Errors and warnings skip the window and publish at once on
//! the assertive channel.

use crate::scheduler::{Clock, DebounceTimer, Duration, SystemClock};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing announcement actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnouncerError {
    #[error("Unknown announcement action: {0}")]
    UnknownAction(String),
}

/// Default debounce window for polite announcements.
pub const DEFAULT_ANNOUNCE_DELAY: Duration = Duration::from_millis(100);

/// Live-region politeness of a published batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Politeness {
    #[default]
    Polite,
    Assertive,
}

/// Widget actions with a fixed announcement sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum A11yAction {
    Add,
    Remove,
    Move,
    Resize,
    Lock,
    Unlock,
    Select,
    Deselect,
    EditOn,
    EditOff,
    DragStart,
    DragEnd,
    DragCancel,
    Collision,
    FullscreenOn,
    FullscreenOff,
}

impl A11yAction {
    pub fn as_str(self) -> &'static str {
        match self {
            A11yAction::Add => "add",
            A11yAction::Remove => "remove",
            A11yAction::Move => "move",
            A11yAction::Resize => "resize",
            A11yAction::Lock => "lock",
            A11yAction::Unlock => "unlock",
            A11yAction::Select => "select",
            A11yAction::Deselect => "deselect",
            A11yAction::EditOn => "edit-on",
            A11yAction::EditOff => "edit-off",
            A11yAction::DragStart => "drag-start",
            A11yAction::DragEnd => "drag-end",
            A11yAction::DragCancel => "drag-cancel",
            A11yAction::Collision => "collision",
            A11yAction::FullscreenOn => "fullscreen-on",
            A11yAction::FullscreenOff => "fullscreen-off",
        }
    }

    /// The sentence announced for this action on `widget`.
    pub fn message(self, widget: &str) -> String {
        match self {
            A11yAction::Add => format!("{widget} widget added to the dashboard"),
            A11yAction::Remove => format!("{widget} widget removed from the dashboard"),
            A11yAction::Move => format!("{widget} widget moved"),
            A11yAction::Resize => format!("{widget} widget resized"),
            A11yAction::Lock => format!("{widget} widget locked"),
            A11yAction::Unlock => format!("{widget} widget unlocked"),
            A11yAction::Select => format!("{widget} widget selected"),
            A11yAction::Deselect => format!("{widget} widget deselected"),
            A11yAction::EditOn => {
                "Edit mode on. Widgets can now be moved and resized".to_string()
            }
            A11yAction::EditOff => "Edit mode off. Layout saved".to_string(),
            A11yAction::DragStart => format!(
                "Picked up {widget} widget. Use arrow keys to move, Enter to drop, Escape to cancel"
            ),
            A11yAction::DragEnd => format!("{widget} widget dropped"),
            A11yAction::DragCancel => format!("Move of {widget} widget cancelled"),
            A11yAction::Collision => {
                format!("{widget} widget cannot move there: another widget is in the way")
            }
            A11yAction::FullscreenOn => format!("{widget} widget shown fullscreen"),
            A11yAction::FullscreenOff => format!("{widget} widget fullscreen closed"),
        }
    }
}

impl FromStr for A11yAction {
    type Err = AnnouncerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [A11yAction; 16] = [
            A11yAction::Add,
            A11yAction::Remove,
            A11yAction::Move,
            A11yAction::Resize,
            A11yAction::Lock,
            A11yAction::Unlock,
            A11yAction::Select,
            A11yAction::Deselect,
            A11yAction::EditOn,
            A11yAction::EditOff,
            A11yAction::DragStart,
            A11yAction::DragEnd,
            A11yAction::DragCancel,
            A11yAction::Collision,
            A11yAction::FullscreenOn,
            A11yAction::FullscreenOff,
        ];
        ALL.into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| AnnouncerError::UnknownAction(s.to_string()))
    }
}

impl fmt::Display for A11yAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyboard help read out on request.
pub fn help_text(is_edit_mode: bool) -> &'static str {
    if is_edit_mode {
        "Edit mode. Tab selects the next widget. Arrow keys move the selected widget one cell. \
         Shift plus arrow keys resize it. Enter or Space picks it up for moving and drops it. \
         Escape cancels. L locks or unlocks, Delete removes, F toggles fullscreen, E leaves edit mode."
    } else {
        "Dashboard. Tab selects the next widget, F toggles fullscreen, E enters edit mode to rearrange widgets."
    }
}

/// Debounced announcement queue for one page.
#[derive(Debug)]
pub struct Announcer<C: Clock = SystemClock> {
    clock: C,
    queue: Vec<String>,
    timer: DebounceTimer,
    announcements: Vec<String>,
    politeness: Politeness,
    publishes: usize,
}

impl Default for Announcer<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> Announcer<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            queue: Vec::new(),
            timer: DebounceTimer::new(),
            announcements: Vec::new(),
            politeness: Politeness::Polite,
            publishes: 0,
        }
    }

    /// Queue a message with the default delay.
    pub fn announce(&mut self, message: impl Into<String>) {
        self.announce_with_delay(message, DEFAULT_ANNOUNCE_DELAY);
    }

    /// Queue a message and restart the window. A zero delay publishes at once.
    pub fn announce_with_delay(&mut self, message: impl Into<String>, delay: Duration) {
        self.queue.push(message.into());
        if delay.is_zero() {
            self.flush(Politeness::Assertive);
        } else {
            self.timer.arm(self.clock.now(), delay);
        }
    }

    /// Publish an error immediately.
    pub fn announce_error(&mut self, message: &str) {
        self.announce_with_delay(format!("Error: {message}"), Duration::ZERO);
    }

    /// Publish a warning immediately.
    pub fn announce_warning(&mut self, message: &str) {
        self.announce_with_delay(format!("Warning: {message}"), Duration::ZERO);
    }

    /// Queue the keyboard help text.
    pub fn announce_help(&mut self, is_edit_mode: bool) {
        self.announce(help_text(is_edit_mode));
    }

    /// Queue the sentence for a widget action.
    ///
    /// Unknown actions are announced as "<action> performed".
    pub fn announce_widget(&mut self, action: &str, widget_name: &str) {
        let message = match action.parse::<A11yAction>() {
            Ok(action) => action.message(widget_name),
            Err(AnnouncerError::UnknownAction(action)) => format!("{action} performed"),
        };
        self.announce(message);
    }

    /// Queue the sentence for a known widget action.
    pub fn announce_action(&mut self, action: A11yAction, widget_name: &str) {
        self.announce(action.message(widget_name));
    }

    /// Publish the queue if the window has closed. Returns true on publish.
    pub fn poll(&mut self) -> bool {
        if self.timer.fire_if_due(self.clock.now()) {
            self.flush(Politeness::Polite);
            true
        } else {
            false
        }
    }

    fn flush(&mut self, politeness: Politeness) {
        self.timer.cancel();
        if self.queue.is_empty() {
            return;
        }
        self.announcements = std::mem::take(&mut self.queue);
        self.politeness = politeness;
        self.publishes += 1;
        log::debug!("Announcing {} message(s)", self.announcements.len());
    }

    /// Cancel any pending publish and clear everything.
    pub fn clear_announcements(&mut self) {
        self.timer.cancel();
        self.queue.clear();
        self.announcements.clear();
    }

    /// The currently published batch.
    pub fn announcements(&self) -> &[String] {
        &self.announcements
    }

    /// Politeness of the current batch.
    pub fn politeness(&self) -> Politeness {
        self.politeness
    }

    /// Messages waiting for the window to close.
    pub fn pending(&self) -> &[String] {
        &self.queue
    }

    /// Number of batches published so far.
    pub fn publish_count(&self) -> usize {
        self.publishes
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock> Drop for Announcer<C> {
    fn drop(&mut self) {
        self.clear_announcements();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualClock;

    fn announcer() -> (Announcer<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (Announcer::new(clock.clone()), clock)
    }

    #[test]
    fn test_burst_coalesces_into_one_publish() {
        let (mut a, clock) = announcer();
        a.announce("one");
        clock.advance(Duration::from_millis(20));
        a.announce("two");
        clock.advance(Duration::from_millis(30));
        a.announce("three");

        clock.advance(Duration::from_millis(99));
        assert!(!a.poll());
        assert!(a.announcements().is_empty());

        clock.advance(Duration::from_millis(1));
        assert!(a.poll());
        assert_eq!(a.announcements(), ["one", "two", "three"]);
        assert_eq!(a.publish_count(), 1);
        assert!(a.pending().is_empty());
        assert!(!a.poll());
    }

    #[test]
    fn test_error_publishes_immediately() {
        let (mut a, _clock) = announcer();
        a.announce_error("layout could not be saved");
        assert_eq!(a.announcements(), ["Error: layout could not be saved"]);
        assert_eq!(a.politeness(), Politeness::Assertive);
    }

    #[test]
    fn test_error_carries_queued_messages() {
        let (mut a, _clock) = announcer();
        a.announce("first");
        a.announce_warning("grid is full");
        assert_eq!(a.announcements(), ["first", "Warning: grid is full"]);
        assert!(!a.poll());
        assert_eq!(a.publish_count(), 1);
    }

    #[test]
    fn test_widget_action_templates() {
        let (mut a, clock) = announcer();
        a.announce_widget("add", "Calendar");
        a.announce_widget("explode", "Calendar");
        clock.advance(DEFAULT_ANNOUNCE_DELAY);
        a.poll();
        assert_eq!(
            a.announcements(),
            ["Calendar widget added to the dashboard", "explode performed"]
        );
    }

    #[test]
    fn test_every_action_parses() {
        for name in [
            "add", "remove", "move", "resize", "lock", "unlock", "select", "deselect", "edit-on",
            "edit-off", "drag-start", "drag-end", "drag-cancel", "collision", "fullscreen-on",
            "fullscreen-off",
        ] {
            let action: A11yAction = name.parse().unwrap();
            assert_eq!(action.as_str(), name);
        }
        assert_eq!(
            "explode".parse::<A11yAction>(),
            Err(AnnouncerError::UnknownAction("explode".to_string()))
        );
    }

    #[test]
    fn test_clear_cancels_pending() {
        let (mut a, clock) = announcer();
        a.announce("gone");
        a.clear_announcements();
        a.clear_announcements();
        clock.advance(Duration::from_secs(1));
        assert!(!a.poll());
        assert!(a.announcements().is_empty());
    }
}
