//! The live editor session: scene graph, stacking index, selection, and
//! in-place text-editing state.
//!
//! All canvas interactions are expressed as [`SceneMutation`]s applied
//! through [`EditorSession::apply_mutation`]. The session owns the tree
//! but knows nothing about history; the history engine observes the
//! events mutations produce and snapshots the tree when they settle.

use crate::events::SceneEvent;
use sb_core::id::{ElementId, Name};
use sb_core::model::{NodeKind, SceneGraph, SceneNode, Style};
use sb_core::zorder::{self, StackIndex};
use smallvec::{SmallVec, smallvec};

/// In-place text-editing state, recorded so a restore can re-locate the
/// edited element in the rebuilt tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEditState {
    /// Live identity of the edited element.
    pub target: ElementId,
    /// Display name at the time editing began (re-identification fallback).
    pub name: Option<Name>,
    /// Kind tag of the edited element, for the name-based search.
    pub kind_tag: &'static str,
}

/// A mutation applied to the scene tree from canvas interaction.
#[derive(Debug, Clone)]
pub enum SceneMutation {
    MoveNode {
        id: ElementId,
        dx: f32,
        dy: f32,
    },
    ResizeNode {
        id: ElementId,
        width: f32,
        height: f32,
    },
    AddNode {
        /// `None` adds under the document root.
        parent: Option<ElementId>,
        node: Box<SceneNode>,
    },
    RemoveNode {
        id: ElementId,
    },
    SetText {
        id: ElementId,
        content: String,
    },
    SetStyle {
        id: ElementId,
        style: Style,
    },
    /// Collect elements under a new group node.
    GroupNodes {
        ids: Vec<ElementId>,
    },
    /// Dissolve a group, extracting its children to the parent.
    UngroupNode {
        id: ElementId,
    },
    SendBackward {
        id: ElementId,
    },
    BringForward {
        id: ElementId,
    },
    SendToBack {
        id: ElementId,
    },
    BringToFront {
        id: ElementId,
    },
}

/// The live mutable state of one editing session.
pub struct EditorSession {
    /// The current scene graph (single source of truth).
    pub graph: SceneGraph,

    /// Stacking-order index, kept consistent with the graph's paint order.
    pub stack_index: StackIndex,

    /// Currently selected element(s).
    pub selection: Vec<ElementId>,

    /// In-place text editor state, if one is open.
    pub editing: Option<TextEditState>,
}

impl EditorSession {
    #[must_use]
    pub fn new() -> Self {
        let graph = SceneGraph::new();
        let mut stack_index = StackIndex::default();
        stack_index.rebuild(&graph);
        Self {
            graph,
            stack_index,
            selection: Vec::new(),
            editing: None,
        }
    }

    /// Apply a mutation, returning the scene events it produced.
    /// The hot path during drag; `MoveNode` must stay cheap.
    pub fn apply_mutation(&mut self, mutation: SceneMutation) -> SmallVec<[SceneEvent; 2]> {
        match mutation {
            SceneMutation::MoveNode { id, dx, dy } => {
                if let Some(node) = self.graph.get_mut(id) {
                    node.x += dx;
                    node.y += dy;
                }
                smallvec![]
            }
            SceneMutation::ResizeNode { id, width, height } => {
                if let Some(node) = self.graph.get_mut(id) {
                    match &mut node.kind {
                        NodeKind::Rect {
                            width: w,
                            height: h,
                        }
                        | NodeKind::Frame {
                            width: w,
                            height: h,
                            ..
                        }
                        | NodeKind::Image {
                            width: w,
                            height: h,
                            ..
                        } => {
                            *w = width;
                            *h = height;
                        }
                        NodeKind::Ellipse { rx, ry } => {
                            *rx = width / 2.0;
                            *ry = height / 2.0;
                        }
                        _ => {}
                    }
                }
                smallvec![]
            }
            SceneMutation::AddNode { parent, node } => {
                let parent_idx = parent
                    .and_then(|p| self.graph.index_of(p))
                    .unwrap_or(self.graph.root);
                let id = self.graph.add_node(parent_idx, *node);
                self.stack_index.rebuild(&self.graph);
                smallvec![SceneEvent::ChildAdded(id)]
            }
            SceneMutation::RemoveNode { id } => {
                let Some(idx) = self.graph.index_of(id) else {
                    return smallvec![];
                };
                self.graph.remove_subtree(idx);
                self.stack_index.rebuild(&self.graph);
                self.selection.retain(|&s| s != id);
                if self.editing.is_some_and(|e| e.target == id) {
                    self.editing = None;
                }
                smallvec![SceneEvent::ChildRemoved(id)]
            }
            SceneMutation::SetText { id, content } => {
                self.set_text_content(id, &content);
                smallvec![]
            }
            SceneMutation::SetStyle { id, style } => {
                if let Some(node) = self.graph.get_mut(id) {
                    node.style = style;
                }
                smallvec![]
            }
            SceneMutation::GroupNodes { ids } => self.group_nodes(&ids),
            SceneMutation::UngroupNode { id } => self.ungroup_node(id),
            SceneMutation::SendBackward { id } => self.zorder_op(id, zorder::send_backward),
            SceneMutation::BringForward { id } => self.zorder_op(id, zorder::bring_forward),
            SceneMutation::SendToBack { id } => self.zorder_op(id, zorder::send_to_back),
            SceneMutation::BringToFront { id } => self.zorder_op(id, zorder::bring_to_front),
        }
    }

    fn zorder_op(
        &mut self,
        id: ElementId,
        op: fn(&mut SceneGraph, sb_core::NodeIndex) -> bool,
    ) -> SmallVec<[SceneEvent; 2]> {
        if let Some(idx) = self.graph.index_of(id)
            && op(&mut self.graph, idx)
        {
            self.stack_index.rebuild(&self.graph);
        }
        smallvec![]
    }

    fn group_nodes(&mut self, ids: &[ElementId]) -> SmallVec<[SceneEvent; 2]> {
        let indices: Vec<_> = ids.iter().filter_map(|&id| self.graph.index_of(id)).collect();
        if indices.is_empty() {
            return smallvec![];
        }
        let parent_idx = self.graph.parent(indices[0]).unwrap_or(self.graph.root);

        // Group origin: the min corner of its members.
        let min_x = indices
            .iter()
            .map(|&i| self.graph.graph[i].x)
            .fold(f32::MAX, f32::min);
        let min_y = indices
            .iter()
            .map(|&i| self.graph.graph[i].y)
            .fold(f32::MAX, f32::min);

        let group = SceneNode::new(NodeKind::Group).at(min_x, min_y);
        let group_id = self.graph.add_node(parent_idx, group);
        let group_idx = self.graph.index_of(group_id).expect("group just inserted");

        for &idx in &indices {
            self.graph.reparent_node(idx, group_idx);
            let node = &mut self.graph.graph[idx];
            node.x -= min_x;
            node.y -= min_y;
        }
        self.stack_index.rebuild(&self.graph);
        smallvec![SceneEvent::ChildAdded(group_id)]
    }

    fn ungroup_node(&mut self, id: ElementId) -> SmallVec<[SceneEvent; 2]> {
        let Some(group_idx) = self.graph.index_of(id) else {
            return smallvec![];
        };
        if !matches!(self.graph.graph[group_idx].kind, NodeKind::Group) {
            return smallvec![];
        }
        let parent_idx = self.graph.parent(group_idx).unwrap_or(self.graph.root);
        let (gx, gy) = {
            let g = &self.graph.graph[group_idx];
            (g.x, g.y)
        };

        for child_idx in self.graph.children(group_idx) {
            self.graph.reparent_node(child_idx, parent_idx);
            let node = &mut self.graph.graph[child_idx];
            node.x += gx;
            node.y += gy;
        }
        self.graph.remove_subtree(group_idx);
        self.stack_index.rebuild(&self.graph);
        self.selection.retain(|&s| s != id);
        smallvec![SceneEvent::ChildRemoved(id)]
    }

    /// Set text content on a text element or on the inner text node of a
    /// text container.
    pub fn set_text_content(&mut self, id: ElementId, content: &str) {
        let Some(idx) = self.graph.index_of(id) else {
            return;
        };
        let target_idx = if self.graph.is_text_container(idx) {
            self.graph.children(idx)[0]
        } else {
            idx
        };
        if let NodeKind::Text {
            content: ref mut c,
        } = self.graph.graph[target_idx].kind
        {
            *c = content.to_string();
        }
    }

    /// Current text content of a text element or container, if any.
    pub fn text_content(&self, id: ElementId) -> Option<&str> {
        let idx = self.graph.index_of(id)?;
        let target_idx = if self.graph.is_text_container(idx) {
            self.graph.children(idx)[0]
        } else {
            idx
        };
        match &self.graph.graph[target_idx].kind {
            NodeKind::Text { content } => Some(content),
            _ => None,
        }
    }

    // ─── Selection & in-place editing ────────────────────────────────────

    pub fn select(&mut self, id: ElementId) {
        self.selection = vec![id];
    }

    pub fn deselect_all(&mut self) {
        self.selection.clear();
    }

    /// Open in-place text editing on an element. Records the identity and
    /// display name so restores can re-locate the target.
    /// Returns false if the element does not exist.
    pub fn open_text_editor(&mut self, id: ElementId) -> bool {
        let Some(node) = self.graph.get(id) else {
            return false;
        };
        self.editing = Some(TextEditState {
            target: id,
            name: node.name,
            kind_tag: node.kind.tag(),
        });
        self.selection = vec![id];
        true
    }

    pub fn close_text_editor(&mut self) -> Option<ElementId> {
        self.editing.take().map(|e| e.target)
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rect(name: &str) -> SceneNode {
        SceneNode::named(
            NodeKind::Rect {
                width: 100.0,
                height: 50.0,
            },
            name,
        )
    }

    #[test]
    fn add_and_move() {
        let mut session = EditorSession::new();
        let events = session.apply_mutation(SceneMutation::AddNode {
            parent: None,
            node: Box::new(rect("box")),
        });
        let id = match events[0] {
            SceneEvent::ChildAdded(id) => id,
            _ => panic!("expected ChildAdded"),
        };

        session.apply_mutation(SceneMutation::MoveNode {
            id,
            dx: 30.0,
            dy: 10.0,
        });
        let node = session.graph.get(id).unwrap();
        assert_eq!((node.x, node.y), (30.0, 10.0));
    }

    #[test]
    fn remove_clears_selection_and_editing() {
        let mut session = EditorSession::new();
        let events = session.apply_mutation(SceneMutation::AddNode {
            parent: None,
            node: Box::new(rect("box")),
        });
        let SceneEvent::ChildAdded(id) = events[0] else {
            panic!("expected ChildAdded");
        };
        session.select(id);
        session.open_text_editor(id);

        session.apply_mutation(SceneMutation::RemoveNode { id });
        assert!(session.selection.is_empty());
        assert!(session.editing.is_none());
    }

    #[test]
    fn group_then_ungroup_preserves_absolute_positions() {
        let mut session = EditorSession::new();
        let a = match session.apply_mutation(SceneMutation::AddNode {
            parent: None,
            node: Box::new(rect("a").at(10.0, 20.0)),
        })[0]
        {
            SceneEvent::ChildAdded(id) => id,
            _ => unreachable!(),
        };
        let b = match session.apply_mutation(SceneMutation::AddNode {
            parent: None,
            node: Box::new(rect("b").at(50.0, 80.0)),
        })[0]
        {
            SceneEvent::ChildAdded(id) => id,
            _ => unreachable!(),
        };

        let events = session.apply_mutation(SceneMutation::GroupNodes { ids: vec![a, b] });
        let SceneEvent::ChildAdded(group_id) = events[0] else {
            panic!("expected group add event");
        };
        // Members became group-relative.
        assert_eq!(session.graph.get(a).map(|n| (n.x, n.y)), Some((0.0, 0.0)));
        assert_eq!(
            session.graph.get(b).map(|n| (n.x, n.y)),
            Some((40.0, 60.0))
        );

        session.apply_mutation(SceneMutation::UngroupNode { id: group_id });
        assert_eq!(session.graph.get(a).map(|n| (n.x, n.y)), Some((10.0, 20.0)));
        assert_eq!(session.graph.get(b).map(|n| (n.x, n.y)), Some((50.0, 80.0)));
        assert!(session.graph.get(group_id).is_none());
    }

    #[test]
    fn structural_mutations_keep_stack_index_consistent() {
        let mut session = EditorSession::new();
        for name in ["a", "b", "c"] {
            session.apply_mutation(SceneMutation::AddNode {
                parent: None,
                node: Box::new(rect(name)),
            });
        }
        assert!(session.stack_index.is_consistent_with(&session.graph));

        let ids: Vec<_> = session.stack_index.iter().collect();
        session.apply_mutation(SceneMutation::BringToFront { id: ids[0] });
        assert!(session.stack_index.is_consistent_with(&session.graph));
        assert_eq!(session.stack_index.position_of(ids[0]), Some(2));
    }
}
