//! The history engine: snapshot capture, coalescing, and undo/redo.
//!
//! Every history entry is a **full tree snapshot**, not a patch. This is a
//! deliberate simplicity-over-memory tradeoff: restores always have a
//! complete tree to reconstruct from, which is what makes re-identification
//! of an open text editor possible after the tree is wholly replaced.
//!
//! Capture policy, in order of the gates a candidate passes through:
//!
//! 1. the suppression lock (programmatic batches) and the executing flag
//!    (an in-progress restore) silence automatic captures entirely;
//! 2. the composition guard inhibits keystroke captures while an IME
//!    composition is building text;
//! 3. the debounce timer coalesces event bursts into one capture;
//! 4. the equality filter discards captures identical to the current head.
//!
//! `undo`/`redo` synchronously cancel pending capture work *before* seeking
//! (cancel-then-seek): a stale debounced capture firing after the cursor
//! moved would silently erase the just-exposed redo branch.

use crate::events::{DEFAULT_DEBOUNCE_WINDOW, DebounceTimer, SceneEvent};
use crate::restore;
use crate::session::EditorSession;
use sb_core::snapshot::{Snapshot, serialize_tree};
use std::time::{Duration, Instant};

// ─── Snapshot store ──────────────────────────────────────────────────────

/// Append/seek stack of snapshots with a single cursor.
///
/// Snapshots are opaque payloads here: the store never inspects contents,
/// only positions. Invariant: `cursor < entries.len()` whenever the store
/// is non-empty; `seek_*` moves only the cursor, `push` is the only
/// operation that truncates.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    entries: Vec<Snapshot>,
    cursor: usize,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The snapshot at the cursor (the currently-displayed state).
    pub fn head(&self) -> Option<&Snapshot> {
        self.entries.get(self.cursor)
    }

    /// Append a snapshot. If the cursor is behind the tail, every entry
    /// after it is discarded first (undo-branch truncation).
    pub fn push(&mut self, snapshot: Snapshot) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(snapshot);
        self.cursor = self.entries.len() - 1;
    }

    /// Step the cursor back and return the newly current snapshot.
    /// `None` when already at the oldest entry (reported, not fatal).
    pub fn seek_back(&mut self) -> Option<&Snapshot> {
        if self.cursor == 0 || self.entries.is_empty() {
            return None;
        }
        self.cursor -= 1;
        Some(&self.entries[self.cursor])
    }

    /// Step the cursor forward and return the newly current snapshot.
    /// `None` when already at the tail (reported, not fatal).
    pub fn seek_forward(&mut self) -> Option<&Snapshot> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(&self.entries[self.cursor])
    }

    pub fn can_seek_back(&self) -> bool {
        self.cursor > 0 && !self.entries.is_empty()
    }

    pub fn can_seek_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Clear all entries. Used only on document teardown.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

/// Equality filter: a candidate that deep-equals the snapshot at the
/// cursor is "no change", treated identically to nothing-to-push.
fn unchanged_from_head(store: &SnapshotStore, candidate: &Snapshot) -> bool {
    store.head() == Some(candidate)
}

// ─── Scoped flag guards ──────────────────────────────────────────────────

/// Decrements the suppression depth on drop, so the lock is released on
/// every exit path, panics included.
struct PauseGuard<'a> {
    depth: &'a mut usize,
}

impl<'a> PauseGuard<'a> {
    fn acquire(depth: &'a mut usize) -> Self {
        *depth += 1;
        Self { depth }
    }
}

impl Drop for PauseGuard<'_> {
    fn drop(&mut self) {
        *self.depth -= 1;
    }
}

/// Clears the executing flag on drop.
struct ExecutingGuard<'a> {
    flag: &'a mut bool,
}

impl<'a> ExecutingGuard<'a> {
    fn set(flag: &'a mut bool) -> Self {
        *flag = true;
        Self { flag }
    }
}

impl Drop for ExecutingGuard<'_> {
    fn drop(&mut self) {
        *self.flag = false;
    }
}

// ─── History engine ──────────────────────────────────────────────────────

/// The capture coordinator plus everything it coordinates: store, debounce
/// timer, suppression lock, composition guard, and the undo/redo entry
/// points. Effective states: Idle, Debounce-Pending (timer armed), and
/// Suppressed (`paused > 0` or `executing`).
pub struct History {
    store: SnapshotStore,
    debounce: DebounceTimer,

    /// Suppression depth: automatic capture is paused while > 0.
    /// A counter rather than a boolean so nested `without_listen` calls
    /// cannot prematurely re-enable listening for an outer call.
    paused: usize,

    /// Set only while a restore is applying a snapshot; prevents the
    /// restore's own tree mutations from triggering capture.
    executing: bool,

    /// True between composition-start and composition-end.
    composing: bool,

    /// One capture deferred to the next tick, scheduled by composition end
    /// so the text backend commits before the tree is read.
    pending_commit: bool,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::with_debounce_window(DEFAULT_DEBOUNCE_WINDOW)
    }

    #[must_use]
    pub fn with_debounce_window(window: Duration) -> Self {
        Self {
            store: SnapshotStore::new(),
            debounce: DebounceTimer::new(window),
            paused: 0,
            executing: false,
            composing: false,
            pending_commit: false,
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.store.can_seek_back()
    }

    pub fn can_redo(&self) -> bool {
        self.store.can_seek_forward()
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    fn is_suppressed(&self) -> bool {
        self.paused > 0 || self.executing
    }

    /// Whether a debounced capture is waiting for its window to elapse.
    pub fn capture_pending(&self) -> bool {
        self.debounce.is_pending() || self.pending_commit
    }

    // ─── Event intake (capture coordinator) ──────────────────────────────

    /// Feed one scene event. Qualifying events arm (or re-arm) the
    /// debounce window; nothing is captured until the window elapses.
    pub fn on_event(&mut self, event: SceneEvent, now: Instant) {
        if !event.qualifies_for_capture() {
            return;
        }
        if self.is_suppressed() {
            log::trace!("history: {event:?} ignored (suppressed)");
            return;
        }
        if self.composing && event == SceneEvent::KeyCommitted {
            // Individual composition keystrokes never reach the debounce.
            log::trace!("history: keystroke ignored (composition active)");
            return;
        }
        self.debounce.arm(now);
        log::trace!("history: {event:?} armed capture window");
    }

    /// Drive the timer and the deferred composition capture. Returns true
    /// if a snapshot was pushed.
    pub fn tick(&mut self, session: &EditorSession, now: Instant) -> bool {
        let mut captured = false;
        if self.pending_commit {
            self.pending_commit = false;
            captured |= self.capture(session);
        }
        if self.debounce.is_due(now) {
            self.debounce.cancel();
            captured |= self.capture(session);
        }
        captured
    }

    /// Explicit capture path for tool code after an atomic multi-step
    /// edit. Immediate (no debounce). Silently no-ops during a restore so
    /// tools reacting to restore side effects cannot corrupt history.
    pub fn save(&mut self, session: &EditorSession) -> bool {
        if self.executing {
            return false;
        }
        self.capture(session)
    }

    /// Serialize, filter, push. Returns true if a new entry was stored.
    fn capture(&mut self, session: &EditorSession) -> bool {
        if self.is_suppressed() {
            return false;
        }
        let candidate = serialize_tree(&session.graph);
        if unchanged_from_head(&self.store, &candidate) {
            log::trace!("history: capture discarded (no change)");
            return false;
        }
        self.store.push(candidate);
        log::debug!(
            "history: captured state {} of {}",
            self.store.cursor + 1,
            self.store.len()
        );
        true
    }

    // ─── Suppression lock ────────────────────────────────────────────────

    /// Run `action` with automatic capture paused. Entering the outermost
    /// lock drops any pending debounced capture: a half-applied batch
    /// state must never be recorded, and lock release does not flush.
    /// Reentrant: nested calls keep suppression active until the outermost
    /// call exits; the depth is released even if `action` panics.
    pub fn without_listen<R>(&mut self, action: impl FnOnce() -> R) -> R {
        if self.paused == 0 {
            self.debounce.cancel();
            self.pending_commit = false;
        }
        let _guard = PauseGuard::acquire(&mut self.paused);
        action()
    }

    // ─── Composition guard ───────────────────────────────────────────────

    pub fn composition_start(&mut self) {
        self.composing = true;
    }

    /// End the composition. When the session has a text element open for
    /// in-place editing, exactly one capture is deferred to the next tick.
    pub fn composition_end(&mut self, session: &EditorSession) {
        self.composing = false;
        if self.is_suppressed() {
            return;
        }
        if session.editing.is_some() {
            self.pending_commit = true;
        }
    }

    // ─── Undo / redo ─────────────────────────────────────────────────────

    /// Step back one state. `Ok(false)` when there is nothing to undo;
    /// `Err` only for reconstruction faults.
    pub fn undo(&mut self, session: &mut EditorSession) -> Result<bool, String> {
        if !self.store.can_seek_back() {
            // A no-op undo leaves pending capture work alone.
            log::debug!("history: nothing to undo");
            return Ok(false);
        }
        // Cancel-then-seek: pending capture work must never fire after the
        // cursor moves.
        self.cancel_pending();
        let Some(snapshot) = self.store.seek_back().cloned() else {
            return Ok(false);
        };
        self.apply(session, &snapshot)?;
        Ok(true)
    }

    /// Step forward one state. Symmetric with [`History::undo`].
    pub fn redo(&mut self, session: &mut EditorSession) -> Result<bool, String> {
        if !self.store.can_seek_forward() {
            log::debug!("history: nothing to redo");
            return Ok(false);
        }
        self.cancel_pending();
        let Some(snapshot) = self.store.seek_forward().cloned() else {
            return Ok(false);
        };
        self.apply(session, &snapshot)?;
        Ok(true)
    }

    fn cancel_pending(&mut self) {
        self.debounce.cancel();
        self.pending_commit = false;
    }

    fn apply(&mut self, session: &mut EditorSession, snapshot: &Snapshot) -> Result<(), String> {
        let _guard = ExecutingGuard::set(&mut self.executing);
        restore::apply(session, snapshot)
    }

    /// Drop all history. Used only on document teardown.
    pub fn clear(&mut self) {
        self.cancel_pending();
        self.store.reset();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
