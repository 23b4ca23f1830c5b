//! Scene events and the debounce timer.
//!
//! The renderer collaborator reports tree and gesture activity as discrete
//! [`SceneEvent`]s. The history engine decides per event whether a capture
//! is warranted; rapid bursts (continuous drags, fast typing) are coalesced
//! by [`DebounceTimer`] into a single capture.
//!
//! Everything here is single-threaded: the timer holds a deadline and the
//! host event loop polls it via `Editor::tick(now)`. There is no hidden
//! thread and no callback; cancellation is an explicit state transition,
//! which is what makes the undo-cancels-pending-capture ordering testable.

use sb_core::ElementId;
use std::time::{Duration, Instant};

/// Tree and gesture activity reported by the renderer/scene-graph layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    /// An element was added to the tree.
    ChildAdded(ElementId),
    /// An element was removed from the tree.
    ChildRemoved(ElementId),
    /// A drag gesture started. Never captures: intermediate positions are
    /// transient noise.
    DragStart,
    /// A drag gesture ended; the element rests at its final position.
    DragEnd,
    /// An in-place text editor opened on an element.
    EditorOpened(ElementId),
    /// An in-place text editor closed.
    EditorClosed(ElementId),
    /// A finalized (non-composing) keystroke landed in a text field.
    KeyCommitted,
}

impl SceneEvent {
    /// Whether this event should request a (debounced) capture.
    pub fn qualifies_for_capture(&self) -> bool {
        match self {
            SceneEvent::ChildAdded(_)
            | SceneEvent::ChildRemoved(_)
            | SceneEvent::DragEnd
            | SceneEvent::EditorClosed(_)
            | SceneEvent::KeyCommitted => true,
            SceneEvent::DragStart | SceneEvent::EditorOpened(_) => false,
        }
    }
}

/// Default coalescing window for automatic captures.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// An explicit, cancellable one-shot timer.
///
/// Arming while already pending resets the deadline, so a burst of
/// qualifying events yields exactly one expiry after the burst quiets
/// down. A capture fires later than it was requested, never earlier, and
/// never reorders relative to other captures.
#[derive(Debug, Clone)]
pub struct DebounceTimer {
    window: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Start (or restart) the window from `now`.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// Drop any pending deadline.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether the window has elapsed. Does not clear the deadline; the
    /// caller cancels once it has acted on the expiry.
    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(deadline) if now >= deadline)
    }
}

impl Default for DebounceTimer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_resets_the_window() {
        let mut timer = DebounceTimer::new(Duration::from_millis(100));
        let t0 = Instant::now();

        timer.arm(t0);
        assert!(!timer.is_due(t0 + Duration::from_millis(50)));

        // Re-arming mid-window pushes the deadline out.
        timer.arm(t0 + Duration::from_millis(50));
        assert!(!timer.is_due(t0 + Duration::from_millis(120)));
        assert!(timer.is_due(t0 + Duration::from_millis(150)));
    }

    #[test]
    fn cancel_clears_pending() {
        let mut timer = DebounceTimer::new(Duration::from_millis(100));
        let t0 = Instant::now();
        timer.arm(t0);
        assert!(timer.is_pending());
        timer.cancel();
        assert!(!timer.is_pending());
        assert!(!timer.is_due(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn qualifying_events() {
        let id = sb_core::ElementId::next();
        assert!(SceneEvent::ChildAdded(id).qualifies_for_capture());
        assert!(SceneEvent::DragEnd.qualifies_for_capture());
        assert!(!SceneEvent::DragStart.qualifies_for_capture());
        assert!(!SceneEvent::EditorOpened(id).qualifies_for_capture());
    }
}
