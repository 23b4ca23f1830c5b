//! Layer ordering: sibling z-order operations and the stacking index.
//!
//! Paint order is sibling order: the last child of a parent draws on top.
//! The [`StackIndex`] is a flat, back-to-front index over the whole tree,
//! maintained separately from the snapshot mechanism; anything that
//! replaces the tree wholesale (a restore) must rebuild it.

use crate::id::ElementId;
use crate::model::SceneGraph;
use petgraph::graph::NodeIndex;

/// Move a child one step backward in z-order (swap with previous sibling).
/// Returns true if the z-order changed.
pub fn send_backward(graph: &mut SceneGraph, child: NodeIndex) -> bool {
    let Some((parent, siblings, pos)) = locate(graph, child) else {
        return false;
    };
    if pos == 0 {
        return false; // already at back
    }
    reorder(graph, parent, siblings, pos, pos - 1)
}

/// Move a child one step forward in z-order (swap with next sibling).
/// Returns true if the z-order changed.
pub fn bring_forward(graph: &mut SceneGraph, child: NodeIndex) -> bool {
    let Some((parent, siblings, pos)) = locate(graph, child) else {
        return false;
    };
    if pos >= siblings.len() - 1 {
        return false; // already at front
    }
    reorder(graph, parent, siblings, pos, pos + 1)
}

/// Move a child to the back of z-order (first sibling).
pub fn send_to_back(graph: &mut SceneGraph, child: NodeIndex) -> bool {
    let Some((parent, siblings, pos)) = locate(graph, child) else {
        return false;
    };
    if pos == 0 {
        return false;
    }
    reorder(graph, parent, siblings, pos, 0)
}

/// Move a child to the front of z-order (last sibling).
pub fn bring_to_front(graph: &mut SceneGraph, child: NodeIndex) -> bool {
    let Some((parent, siblings, pos)) = locate(graph, child) else {
        return false;
    };
    let last = siblings.len() - 1;
    if pos == last {
        return false;
    }
    reorder(graph, parent, siblings, pos, last)
}

fn locate(graph: &SceneGraph, child: NodeIndex) -> Option<(NodeIndex, Vec<NodeIndex>, usize)> {
    let parent = graph.parent(child)?;
    let siblings = graph.children(parent);
    let pos = siblings.iter().position(|&s| s == child)?;
    Some((parent, siblings, pos))
}

fn reorder(
    graph: &mut SceneGraph,
    parent: NodeIndex,
    mut siblings: Vec<NodeIndex>,
    from: usize,
    to: usize,
) -> bool {
    let child = siblings.remove(from);
    siblings.insert(to, child);
    graph.set_child_order(parent, siblings);
    true
}

// ─── Stacking index ──────────────────────────────────────────────────────

/// Flat stacking order over the whole tree, back to front.
///
/// The index is derived state: it mirrors the tree's paint order but lives
/// outside it, so consumers (selection chrome, layer panels) can resolve a
/// stacking position without walking the graph.
#[derive(Debug, Default, Clone)]
pub struct StackIndex {
    order: Vec<ElementId>,
}

impl StackIndex {
    /// Rebuild the whole index from the graph's current paint order.
    pub fn rebuild(&mut self, graph: &SceneGraph) {
        self.order.clear();
        collect(graph, graph.root, &mut self.order);
    }

    /// Stacking position of an element (0 = rearmost). `None` when the
    /// element is unknown, which after a restore means the index is stale.
    pub fn position_of(&self, id: ElementId) -> Option<usize> {
        self.order.iter().position(|&e| e == id)
    }

    /// All elements, back to front.
    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether the index agrees with the graph's paint order. Restores
    /// must leave this holding true.
    pub fn is_consistent_with(&self, graph: &SceneGraph) -> bool {
        let mut fresh = Vec::new();
        collect(graph, graph.root, &mut fresh);
        fresh == self.order
    }
}

fn collect(graph: &SceneGraph, idx: NodeIndex, out: &mut Vec<ElementId>) {
    for child in graph.children(idx) {
        out.push(graph.graph[child].id);
        collect(graph, child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKind, SceneNode};
    use pretty_assertions::assert_eq;

    fn three_rects() -> (SceneGraph, [ElementId; 3]) {
        let mut sg = SceneGraph::new();
        let mk = |name: &str| {
            SceneNode::named(
                NodeKind::Rect {
                    width: 10.0,
                    height: 10.0,
                },
                name,
            )
        };
        let a = sg.add_node(sg.root, mk("a"));
        let b = sg.add_node(sg.root, mk("b"));
        let c = sg.add_node(sg.root, mk("c"));
        (sg, [a, b, c])
    }

    fn order_of(sg: &SceneGraph) -> Vec<ElementId> {
        sg.children(sg.root)
            .into_iter()
            .map(|idx| sg.graph[idx].id)
            .collect()
    }

    #[test]
    fn swap_neighbors() {
        let (mut sg, [a, b, c]) = three_rects();
        let b_idx = sg.index_of(b).unwrap();

        assert!(bring_forward(&mut sg, b_idx));
        assert_eq!(order_of(&sg), vec![a, c, b]);

        assert!(send_backward(&mut sg, b_idx));
        assert_eq!(order_of(&sg), vec![a, b, c]);
    }

    #[test]
    fn extremes_are_no_ops_at_the_edge() {
        let (mut sg, [a, _b, c]) = three_rects();
        let a_idx = sg.index_of(a).unwrap();
        let c_idx = sg.index_of(c).unwrap();

        assert!(!send_backward(&mut sg, a_idx), "already at back");
        assert!(!bring_to_front(&mut sg, c_idx), "already at front");
        assert!(send_to_back(&mut sg, c_idx));
        assert_eq!(order_of(&sg)[0], c);
    }

    #[test]
    fn stack_index_tracks_paint_order() {
        let (mut sg, [a, b, c]) = three_rects();
        let mut index = StackIndex::default();
        index.rebuild(&sg);
        assert_eq!(index.position_of(a), Some(0));
        assert_eq!(index.position_of(c), Some(2));
        assert!(index.is_consistent_with(&sg));

        let a_idx = sg.index_of(a).unwrap();
        bring_to_front(&mut sg, a_idx);
        assert!(!index.is_consistent_with(&sg), "stale after reorder");
        index.rebuild(&sg);
        assert_eq!(index.position_of(a), Some(2));
        assert_eq!(index.position_of(b), Some(0));
    }
}
