//! Editor facade: wires the session, the history engine, and the input
//! layer together.
//!
//! This is the integration surface a host embeds. The host owns hit
//! testing and the render loop; it reports hits into `begin_drag`, drives
//! time via `tick(now)`, and forwards raw input through `input`.
//!
//! Capture wiring at a glance:
//!
//! - structural edits (`add_element`, `remove_element`) emit scene events
//!   that arm the debounced capture;
//! - drag gestures capture once, on release, at the final position;
//! - batch edits (group, ungroup, paste) run under the suppression lock
//!   and record exactly one entry via the explicit `save` path;
//! - IME composition routes through the composition guard so only the
//!   committed text produces an entry.

use crate::events::SceneEvent;
use crate::history::History;
use crate::input::InputEvent;
use crate::session::{EditorSession, SceneMutation};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use sb_core::model::SceneNode;
use sb_core::ElementId;
use smallvec::SmallVec;
use std::time::{Duration, Instant};

struct DragState {
    target: ElementId,
    last_x: f32,
    last_y: f32,
}

/// One editor over one document.
pub struct Editor {
    pub session: EditorSession,
    pub history: History,
    drag: Option<DragState>,
}

impl Editor {
    /// Create an editor over an empty document. The initial state is
    /// captured immediately so the first user action can be undone back
    /// to it.
    #[must_use]
    pub fn new() -> Self {
        Self::with_history(History::new())
    }

    #[must_use]
    pub fn with_debounce_window(window: Duration) -> Self {
        Self::with_history(History::with_debounce_window(window))
    }

    fn with_history(mut history: History) -> Self {
        let session = EditorSession::new();
        history.save(&session);
        Self {
            session,
            history,
            drag: None,
        }
    }

    fn forward(&mut self, events: SmallVec<[SceneEvent; 2]>, now: Instant) {
        for event in events {
            self.history.on_event(event, now);
        }
    }

    // ─── Structural edits ────────────────────────────────────────────────

    /// Add an element (under the root when `parent` is `None`).
    pub fn add_element(
        &mut self,
        parent: Option<ElementId>,
        node: SceneNode,
        now: Instant,
    ) -> ElementId {
        let id = node.id;
        let events = self.session.apply_mutation(SceneMutation::AddNode {
            parent,
            node: Box::new(node),
        });
        self.forward(events, now);
        id
    }

    pub fn remove_element(&mut self, id: ElementId, now: Instant) {
        let events = self.session.apply_mutation(SceneMutation::RemoveNode { id });
        self.forward(events, now);
    }

    // ─── Drag gesture ────────────────────────────────────────────────────

    /// Begin dragging `target` (the host's hit-test result) from (x, y).
    pub fn begin_drag(&mut self, target: ElementId, x: f32, y: f32, now: Instant) {
        self.session.select(target);
        self.drag = Some(DragState {
            target,
            last_x: x,
            last_y: y,
        });
        self.history.on_event(SceneEvent::DragStart, now);
    }

    /// Continue a drag. Intermediate positions mutate the tree live but
    /// never produce history entries.
    pub fn drag_to(&mut self, x: f32, y: f32) {
        if let Some(drag) = &mut self.drag {
            let (dx, dy) = (x - drag.last_x, y - drag.last_y);
            drag.last_x = x;
            drag.last_y = y;
            let target = drag.target;
            self.session
                .apply_mutation(SceneMutation::MoveNode { id: target, dx, dy });
        }
    }

    /// Release the drag; the element rests at its final position and one
    /// debounced capture is requested.
    pub fn end_drag(&mut self, now: Instant) {
        if self.drag.take().is_some() {
            self.history.on_event(SceneEvent::DragEnd, now);
        }
    }

    // ─── Batch edits (suppression lock + explicit save) ──────────────────

    /// Group the current selection. One history entry for the whole batch.
    pub fn group_selection(&mut self) -> Option<ElementId> {
        if self.session.selection.len() < 2 {
            return None;
        }
        let ids = self.session.selection.clone();
        let session = &mut self.session;
        // Events fired under the lock are dropped, not queued.
        let events = self
            .history
            .without_listen(|| session.apply_mutation(SceneMutation::GroupNodes { ids }));
        let group_id = events.iter().find_map(|e| match e {
            SceneEvent::ChildAdded(id) => Some(*id),
            _ => None,
        })?;
        self.session.select(group_id);
        self.history.save(&self.session);
        Some(group_id)
    }

    /// Dissolve a group. One history entry for the whole batch.
    pub fn ungroup(&mut self, id: ElementId) {
        let session = &mut self.session;
        self.history
            .without_listen(|| session.apply_mutation(SceneMutation::UngroupNode { id }));
        self.history.save(&self.session);
    }

    /// Paste pre-built elements. One history entry regardless of count.
    pub fn paste(&mut self, nodes: Vec<SceneNode>) -> Vec<ElementId> {
        let session = &mut self.session;
        let ids = self.history.without_listen(|| {
            nodes
                .into_iter()
                .map(|node| {
                    let id = node.id;
                    session.apply_mutation(SceneMutation::AddNode {
                        parent: None,
                        node: Box::new(node),
                    });
                    id
                })
                .collect::<Vec<_>>()
        });
        self.session.selection = ids.clone();
        self.history.save(&self.session);
        ids
    }

    // ─── In-place text editing ───────────────────────────────────────────

    pub fn open_text_editor(&mut self, id: ElementId, now: Instant) -> bool {
        if self.session.open_text_editor(id) {
            self.history.on_event(SceneEvent::EditorOpened(id), now);
            true
        } else {
            false
        }
    }

    pub fn close_text_editor(&mut self, now: Instant) {
        if let Some(id) = self.session.close_text_editor() {
            self.history.on_event(SceneEvent::EditorClosed(id), now);
        }
    }

    /// A finalized (non-IME) text change in the open editor.
    pub fn text_input(&mut self, content: &str, now: Instant) {
        let Some(editing) = self.session.editing else {
            return;
        };
        self.session.set_text_content(editing.target, content);
        // Inhibited by the composition guard while an IME is composing.
        self.history.on_event(SceneEvent::KeyCommitted, now);
    }

    // ─── Raw input ───────────────────────────────────────────────────────

    /// Route a raw input event. Returns a resolved shortcut action the
    /// facade does not own (clipboard), so the host can fulfill it.
    pub fn input(&mut self, event: InputEvent, now: Instant) -> Option<ShortcutAction> {
        match event {
            InputEvent::Key { key, modifiers } => {
                let action = ShortcutMap::resolve(
                    &key,
                    modifiers.ctrl,
                    modifiers.shift,
                    modifiers.alt,
                    modifiers.meta,
                )?;
                self.dispatch(action, now)
            }
            InputEvent::PointerMove { x, y, .. } => {
                self.drag_to(x, y);
                None
            }
            InputEvent::PointerUp { .. } => {
                self.end_drag(now);
                None
            }
            // Press routing needs a hit-test result; hosts call
            // `begin_drag` directly.
            InputEvent::PointerDown { .. } => None,
            InputEvent::CompositionStart => {
                self.history.composition_start();
                None
            }
            InputEvent::CompositionUpdate(text) => {
                if let Some(editing) = self.session.editing {
                    self.session.set_text_content(editing.target, &text);
                }
                None
            }
            InputEvent::CompositionEnd(text) => {
                if let Some(editing) = self.session.editing {
                    self.session.set_text_content(editing.target, &text);
                }
                self.history.composition_end(&self.session);
                None
            }
        }
    }

    fn dispatch(&mut self, action: ShortcutAction, now: Instant) -> Option<ShortcutAction> {
        match action {
            ShortcutAction::Undo => {
                if let Err(err) = self.undo() {
                    log::error!("undo failed: {err}");
                }
            }
            ShortcutAction::Redo => {
                if let Err(err) = self.redo() {
                    log::error!("redo failed: {err}");
                }
            }
            ShortcutAction::Delete => {
                for id in self.session.selection.clone() {
                    self.remove_element(id, now);
                }
            }
            ShortcutAction::SelectAll => {
                self.session.selection = self
                    .session
                    .graph
                    .children(self.session.graph.root)
                    .into_iter()
                    .map(|idx| self.session.graph.graph[idx].id)
                    .collect();
            }
            ShortcutAction::Deselect => self.session.deselect_all(),
            ShortcutAction::Group => {
                self.group_selection();
            }
            ShortcutAction::Ungroup => {
                if let Some(&id) = self.session.selection.first() {
                    self.ungroup(id);
                }
            }
            ShortcutAction::SendBackward
            | ShortcutAction::BringForward
            | ShortcutAction::SendToBack
            | ShortcutAction::BringToFront => self.zorder_action(action),
            // Clipboard contents live with the host.
            ShortcutAction::Copy | ShortcutAction::Cut | ShortcutAction::Paste => {
                return Some(action);
            }
        }
        None
    }

    fn zorder_action(&mut self, action: ShortcutAction) {
        let Some(&id) = self.session.selection.first() else {
            return;
        };
        let mutation = match action {
            ShortcutAction::SendBackward => SceneMutation::SendBackward { id },
            ShortcutAction::BringForward => SceneMutation::BringForward { id },
            ShortcutAction::SendToBack => SceneMutation::SendToBack { id },
            ShortcutAction::BringToFront => SceneMutation::BringToFront { id },
            _ => return,
        };
        self.session.apply_mutation(mutation);
        // Z-order changes capture through the explicit path.
        self.history.save(&self.session);
    }

    // ─── History entry points ────────────────────────────────────────────

    pub fn undo(&mut self) -> Result<bool, String> {
        self.history.undo(&mut self.session)
    }

    pub fn redo(&mut self) -> Result<bool, String> {
        self.history.redo(&mut self.session)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Drive the debounce timer and any deferred composition capture.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.history.tick(&self.session, now)
    }

    /// Tear the document down: fresh tree, empty history, new baseline.
    pub fn clear_document(&mut self) {
        self.session = EditorSession::new();
        self.drag = None;
        self.history.clear();
        self.history.save(&self.session);
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}
