//! Core scene-graph data model.
//!
//! The document is a tree of visual elements (shapes, text, images, groups)
//! held in a directed graph where edges represent parent→child containment.
//! Sibling order is paint order: the last child of a parent draws on top.
//!
//! Live nodes carry an [`ElementId`] identity and a runtime `hit_test`
//! flag; neither survives serialization (see the `snapshot` module).

use crate::id::{ElementId, Name};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── Colors & Paint ──────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RRGGBB` or `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgba(
                byte(0)? as f32 / 255.0,
                byte(2)? as f32 / 255.0,
                byte(4)? as f32 / 255.0,
                1.0,
            )),
            8 => Some(Self::rgba(
                byte(0)? as f32 / 255.0,
                byte(2)? as f32 / 255.0,
                byte(4)? as f32 / 255.0,
                byte(6)? as f32 / 255.0,
            )),
            _ => None,
        }
    }

    /// Emit as a hex string, alpha included only when not fully opaque.
    pub fn to_hex(&self) -> String {
        let r = (self.r * 255.0).round() as u8;
        let g = (self.g * 255.0).round() as u8;
        let b = (self.b * 255.0).round() as u8;
        let a = (self.a * 255.0).round() as u8;
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

/// Fill or stroke paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Paint {
    Solid(Color),
    LinearGradient { angle: f32, stops: Vec<(f32, Color)> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub paint: Paint,
    pub width: f32,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            paint: Paint::Solid(Color::rgba(0.0, 0.0, 0.0, 1.0)),
            width: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub weight: u16, // 100..900
    pub size: f32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Inter".into(),
            weight: 400,
            size: 14.0,
        }
    }
}

/// A single path command (SVG-like but simplified).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PathCmd {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    QuadTo(f32, f32, f32, f32),            // control, end
    CubicTo(f32, f32, f32, f32, f32, f32), // c1, c2, end
    Close,
}

/// Inline style overrides on a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub fill: Option<Paint>,
    pub stroke: Option<Stroke>,
    pub font: Option<FontSpec>,
    pub corner_radius: Option<f32>,
    pub opacity: Option<f32>,
}

// ─── Scene Graph Nodes ───────────────────────────────────────────────────

/// The element kinds in the scene tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Root of the document.
    Root,

    /// Contains children, no visual of its own.
    Group,

    /// Visible container with explicit size and optional clipping.
    Frame { width: f32, height: f32, clip: bool },

    /// Rectangle.
    Rect { width: f32, height: f32 },

    /// Ellipse / circle.
    Ellipse { rx: f32, ry: f32 },

    /// Freeform path (pen tool output).
    Path { commands: Vec<PathCmd> },

    /// Text content. On the board, text lives inside a Frame container;
    /// the inner text node itself is never a hit-test target.
    Text { content: String },

    /// Placed image.
    Image {
        source: String,
        width: f32,
        height: f32,
    },
}

impl NodeKind {
    /// Stable lowercase tag used in serialized form.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Group => "group",
            NodeKind::Frame { .. } => "frame",
            NodeKind::Rect { .. } => "rect",
            NodeKind::Ellipse { .. } => "ellipse",
            NodeKind::Path { .. } => "path",
            NodeKind::Text { .. } => "text",
            NodeKind::Image { .. } => "image",
        }
    }
}

/// A single element in the scene tree.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Live identity. Assigned at construction, never serialized.
    pub id: ElementId,

    /// User-visible label. Serialized; the re-identification fallback key.
    pub name: Option<Name>,

    /// What kind of element this is.
    pub kind: NodeKind,

    /// Inline style.
    pub style: Style,

    /// Parent-relative position.
    pub x: f32,
    pub y: f32,

    pub visible: bool,

    /// Whether this node participates in hit testing. Runtime-only:
    /// re-derived after reconstruction (inner text nodes get `false`).
    pub hit_test: bool,

    /// Arbitrary per-element metadata carried through snapshots untouched.
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl SceneNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: ElementId::next(),
            name: None,
            kind,
            style: Style::default(),
            x: 0.0,
            y: 0.0,
            visible: true,
            hit_test: true,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn named(kind: NodeKind, name: &str) -> Self {
        let mut node = Self::new(kind);
        node.name = Some(Name::intern(name));
        node
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }
}

// ─── Scene Graph ─────────────────────────────────────────────────────────

/// The complete document: a tree of [`SceneNode`] values.
///
/// Edges go from parent → child. Sibling paint order is tracked explicitly
/// per parent so z-order survives arbitrary insertion/removal patterns.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    /// The underlying directed graph.
    pub graph: StableDiGraph<SceneNode, ()>,

    /// The root node index.
    pub root: NodeIndex,

    /// Index from ElementId → NodeIndex for fast lookup.
    pub id_index: HashMap<ElementId, NodeIndex>,

    /// Explicit sibling order per parent (paint order, back to front).
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl SceneGraph {
    /// Create a new empty scene graph with a root node.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root_node = SceneNode::named(NodeKind::Root, "root");
        let root_id = root_node.id;
        let root = graph.add_node(root_node);

        let mut id_index = HashMap::new();
        id_index.insert(root_id, root);

        Self {
            graph,
            root,
            id_index,
            child_order: HashMap::new(),
        }
    }

    /// Add a node as the frontmost child of `parent`. Returns its identity.
    pub fn add_node(&mut self, parent: NodeIndex, node: SceneNode) -> ElementId {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.id_index.insert(id, idx);
        self.child_order.entry(parent).or_default().push(idx);
        id
    }

    /// Remove a node and its entire subtree, keeping indices synchronized.
    pub fn remove_subtree(&mut self, idx: NodeIndex) -> Option<SceneNode> {
        for child in self.children(idx) {
            self.remove_subtree(child);
        }
        if let Some(parent) = self.parent(idx)
            && let Some(order) = self.child_order.get_mut(&parent)
        {
            order.retain(|&c| c != idx);
        }
        self.child_order.remove(&idx);
        let removed = self.graph.remove_node(idx);
        if let Some(node) = &removed {
            self.id_index.remove(&node.id);
        }
        removed
    }

    /// Look up a node by identity.
    pub fn get(&self, id: ElementId) -> Option<&SceneNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    /// Look up a node mutably by identity.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut SceneNode> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    /// Get the graph index for an identity.
    pub fn index_of(&self, id: ElementId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    /// Get the parent index of a node.
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children of a node in paint order (back to front).
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        if let Some(order) = self.child_order.get(&idx) {
            return order.clone();
        }
        // No explicit order recorded: fall back to deterministic index order.
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    /// Overwrite the sibling order of `parent`. Callers must pass a
    /// permutation of the current children.
    pub(crate) fn set_child_order(&mut self, parent: NodeIndex, order: Vec<NodeIndex>) {
        self.child_order.insert(parent, order);
    }

    /// Reparent a node to a new parent (appended frontmost).
    pub fn reparent_node(&mut self, child: NodeIndex, new_parent: NodeIndex) {
        if let Some(old_parent) = self.parent(child) {
            if let Some(edge) = self.graph.find_edge(old_parent, child) {
                self.graph.remove_edge(edge);
            }
            if let Some(order) = self.child_order.get_mut(&old_parent) {
                order.retain(|&c| c != child);
            }
        }
        self.graph.add_edge(new_parent, child, ());
        self.child_order.entry(new_parent).or_default().push(child);
    }

    /// Number of non-root elements.
    pub fn element_count(&self) -> usize {
        self.graph.node_count().saturating_sub(1)
    }

    /// Search for an element by kind tag and display name. This is the
    /// fallback lookup used when identity cannot be resolved after a
    /// restore; scan order is paint order, front to back.
    pub fn find_by_name(&self, kind_tag: &str, name: Name) -> Option<ElementId> {
        self.find_by_name_under(self.root, kind_tag, name)
    }

    fn find_by_name_under(&self, idx: NodeIndex, kind_tag: &str, name: Name) -> Option<ElementId> {
        for child in self.children(idx).into_iter().rev() {
            let node = &self.graph[child];
            if node.kind.tag() == kind_tag && node.name == Some(name) {
                return Some(node.id);
            }
            if let Some(found) = self.find_by_name_under(child, kind_tag, name) {
                return Some(found);
            }
        }
        None
    }

    /// Whether `idx` is a text container: a Frame whose single child is a
    /// Text node. The board represents on-canvas text this way so the
    /// frame, not the glyph run, is the hit-test and selection target.
    pub fn is_text_container(&self, idx: NodeIndex) -> bool {
        if !matches!(self.graph[idx].kind, NodeKind::Frame { .. }) {
            return false;
        }
        let children = self.children(idx);
        children.len() == 1 && matches!(self.graph[children[0]].kind, NodeKind::Text { .. })
    }

    /// Rebuild the `id_index` (needed after wholesale graph replacement).
    pub fn rebuild_index(&mut self) {
        self.id_index.clear();
        for idx in self.graph.node_indices() {
            let id = self.graph[idx].id;
            self.id_index.insert(id, idx);
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience: build a text container (Frame wrapping a Text child).
pub fn make_text_container(
    graph: &mut SceneGraph,
    parent: NodeIndex,
    name: &str,
    content: &str,
) -> ElementId {
    let frame = SceneNode::named(
        NodeKind::Frame {
            width: 120.0,
            height: 32.0,
            clip: false,
        },
        name,
    );
    let frame_id = graph.add_node(parent, frame);
    let frame_idx = graph.index_of(frame_id).unwrap();
    let mut text = SceneNode::new(NodeKind::Text {
        content: content.to_string(),
    });
    text.hit_test = false;
    graph.add_node(frame_idx, text);
    frame_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scene_graph_basics() {
        let mut sg = SceneGraph::new();
        let rect = SceneNode::named(
            NodeKind::Rect {
                width: 100.0,
                height: 50.0,
            },
            "box1",
        );
        let id = sg.add_node(sg.root, rect);

        assert!(sg.get(id).is_some());
        assert_eq!(sg.children(sg.root).len(), 1);
        assert_eq!(sg.element_count(), 1);
    }

    #[test]
    fn remove_subtree_removes_descendants() {
        let mut sg = SceneGraph::new();
        let group_id = sg.add_node(sg.root, SceneNode::named(NodeKind::Group, "grp"));
        let group_idx = sg.index_of(group_id).unwrap();
        let child_id = sg.add_node(
            group_idx,
            SceneNode::new(NodeKind::Rect {
                width: 10.0,
                height: 10.0,
            }),
        );

        sg.remove_subtree(group_idx);
        assert!(sg.get(group_id).is_none());
        assert!(sg.get(child_id).is_none());
        assert_eq!(sg.element_count(), 0);
    }

    #[test]
    fn color_hex_roundtrip() {
        let c = Color::from_hex("#6C5CE7").unwrap();
        assert_eq!(c.to_hex(), "#6C5CE7");

        let c2 = Color::from_hex("#FF000080").unwrap();
        assert!((c2.a - 128.0 / 255.0).abs() < 0.01);
        assert_eq!(c2.to_hex().len(), 9); // #RRGGBBAA
    }

    #[test]
    fn find_by_name_prefers_frontmost() {
        let mut sg = SceneGraph::new();
        let back = sg.add_node(
            sg.root,
            SceneNode::named(
                NodeKind::Text {
                    content: "a".into(),
                },
                "label",
            ),
        );
        let front = sg.add_node(
            sg.root,
            SceneNode::named(
                NodeKind::Text {
                    content: "b".into(),
                },
                "label",
            ),
        );

        let found = sg.find_by_name("text", Name::intern("label")).unwrap();
        assert_eq!(found, front);
        assert_ne!(found, back);
    }

    #[test]
    fn text_container_shape() {
        let mut sg = SceneGraph::new();
        let root = sg.root;
        let id = make_text_container(&mut sg, root, "title", "Hello");
        let idx = sg.index_of(id).unwrap();
        assert!(sg.is_text_container(idx));

        // A plain frame is not a text container.
        let plain = sg.add_node(
            sg.root,
            SceneNode::new(NodeKind::Frame {
                width: 10.0,
                height: 10.0,
                clip: true,
            }),
        );
        assert!(!sg.is_text_container(sg.index_of(plain).unwrap()));
    }

    #[test]
    fn reparent_updates_orders() {
        let mut sg = SceneGraph::new();
        let a = sg.add_node(sg.root, SceneNode::named(NodeKind::Group, "a"));
        let b = sg.add_node(sg.root, SceneNode::named(NodeKind::Group, "b"));
        let a_idx = sg.index_of(a).unwrap();
        let b_idx = sg.index_of(b).unwrap();

        sg.reparent_node(b_idx, a_idx);
        assert_eq!(sg.children(sg.root), vec![a_idx]);
        assert_eq!(sg.children(a_idx), vec![b_idx]);
        assert_eq!(sg.parent(b_idx), Some(a_idx));
    }
}
