//! The state applier: rebuild the live tree from a snapshot.
//!
//! A restore is a full reconstruction, never an incremental patch. After
//! the rebuild two pieces of state must be repaired because the serialized
//! form does not carry them:
//!
//! - hit-test flags on the inner text nodes of text containers (the frame
//!   is the hit target, never the glyph run);
//! - the in-place text editor, if one was open when undo/redo fired. The
//!   rebuilt tree holds fresh identities, so the edited element is
//!   re-located in three tiers: by identity, then by a kind-and-name
//!   search, then by giving up and deselecting. A stale reference is never
//!   left behind.
//!
//! Reconstruction faults propagate loudly: a partially applied snapshot
//! would leave tree and history cursor inconsistent.

use crate::session::{EditorSession, TextEditState};
use sb_core::model::NodeKind;
use sb_core::snapshot::{Snapshot, reconstruct};

/// Apply `snapshot` to the session. The caller (the history engine) holds
/// the executing flag for the full duration.
pub fn apply(session: &mut EditorSession, snapshot: &Snapshot) -> Result<(), String> {
    // Record the in-place editing state before the tree is replaced.
    let reopen = session.editing;

    let graph = reconstruct(snapshot)?;
    session.graph = graph;
    normalize_text_containers(session);
    session.stack_index.rebuild(&session.graph);

    match reopen {
        Some(prev) => reopen_editor(session, prev),
        None => {
            // Never leave a selection pointing at destroyed live objects.
            session.selection.clear();
        }
    }
    Ok(())
}

/// Re-disable hit testing and force visibility on the inner text node of
/// every top-level text container. The serialized form does not preserve
/// hit-test flags, and reconstruction defaults them to true.
fn normalize_text_containers(session: &mut EditorSession) {
    for idx in session.graph.children(session.graph.root) {
        if !session.graph.is_text_container(idx) {
            continue;
        }
        let inner = session.graph.children(idx)[0];
        let text = &mut session.graph.graph[inner];
        debug_assert!(matches!(text.kind, NodeKind::Text { .. }));
        text.hit_test = false;
        text.visible = true;
    }
}

/// Three-tier re-identification of the element that was being edited.
fn reopen_editor(session: &mut EditorSession, prev: TextEditState) {
    // Tier 1: stable identity. Succeeds only when the edited element
    // survived outside the rebuilt subtree.
    let located = if session.graph.get(prev.target).is_some() {
        Some(prev.target)
    } else {
        // Tier 2: kind-and-name search over the rebuilt tree.
        prev.name
            .and_then(|name| session.graph.find_by_name(prev.kind_tag, name))
    };

    match located {
        Some(id) => {
            log::debug!("restore: reopened text editor on {id}");
            session.selection = vec![id];
            session.editing = Some(TextEditState {
                target: id,
                name: prev.name,
                kind_tag: prev.kind_tag,
            });
        }
        None => {
            // Tier 3: close the editor affordance and deselect rather than
            // pointing the UI at a stale reference.
            log::debug!("restore: edited element not re-identifiable, deselecting");
            session.selection.clear();
            session.editing = None;
        }
    }
}
