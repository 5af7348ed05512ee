use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::graph_utils::ids::new_id;
use crate::persistence::store::GraphStorage;

// Basic type aliases for clarity
pub type NodeId = Uuid;
pub type RelId = Uuid;

/// A positioned point in the graph. `label` and `color` are display-only;
/// empty means unset and is omitted from the persisted entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
}

/// An edge between two nodes. Stored directionally, deduplicated as
/// undirected when created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Rel {
    pub from: NodeId,
    pub to: NodeId,
}

/// Pan offset and zoom of the infinite canvas. Only the offset is mutated by
/// interactions; `scale` rides along in the persisted shape.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Canvas {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Default for Canvas {
    fn default() -> Self {
        Canvas { x: 0.0, y: 0.0, scale: 1.0 }
    }
}

/// A partial update for [`Graph::set_node_fields`]. Absent fields are left
/// untouched; an empty `label`/`color` clears the field.
#[derive(Clone, Debug, Default)]
pub struct NodeFields {
    pub label: Option<String>,
    pub color: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
}

/// The in-memory graph: node map, relationship map, and a bidirectional
/// adjacency index kept in lockstep by every mutation.
///
/// The index invariant: every node id owns exactly one outgoing and one
/// incoming set (possibly empty), and every relationship id appears in
/// exactly the outgoing set of its `from` node and the incoming set of its
/// `to` node. The index is rebuilt once at construction and incrementally
/// maintained afterwards; it is never persisted.
pub struct Graph {
    pub canvas: Canvas,
    pub nodes: HashMap<NodeId, Node>,
    pub rels: HashMap<RelId, Rel>,
    pub rels_from_node: HashMap<NodeId, HashSet<RelId>>,
    pub rels_to_node: HashMap<NodeId, HashSet<RelId>>,
    storage: Option<GraphStorage>,
}

impl Graph {
    /// Build a graph from loaded state and index its relationships. Pass
    /// `None` for `storage` to run without persistence (tests do).
    pub fn new(
        canvas: Canvas,
        nodes: HashMap<NodeId, Node>,
        rels: HashMap<RelId, Rel>,
        storage: Option<GraphStorage>,
    ) -> Self {
        let mut graph = Graph {
            canvas,
            nodes,
            rels,
            rels_from_node: HashMap::new(),
            rels_to_node: HashMap::new(),
            storage,
        };
        graph.index_rels();
        graph
    }

    fn index_rels(&mut self) {
        for node_id in self.nodes.keys() {
            self.rels_from_node.insert(*node_id, HashSet::new());
            self.rels_to_node.insert(*node_id, HashSet::new());
        }
        for (rel_id, rel) in &self.rels {
            self.rels_from_node.entry(rel.from).or_default().insert(*rel_id);
            self.rels_to_node.entry(rel.to).or_default().insert(*rel_id);
        }
    }

    /// Apply only the fields present in `fields`, leaving the rest untouched,
    /// and persist the node map. An unknown id is a no-op returning `false`.
    pub fn set_node_fields(&mut self, node_id: NodeId, fields: NodeFields) -> bool {
        let Some(node) = self.nodes.get_mut(&node_id) else {
            return false;
        };
        if let Some(label) = fields.label {
            node.label = label;
        }
        if let Some(color) = fields.color {
            node.color = color;
        }
        if let Some(x) = fields.x {
            node.x = x;
        }
        if let Some(y) = fields.y {
            node.y = y;
        }
        self.save_nodes();
        true
    }

    /// Overwrite the viewport pan offset, leave the scale, persist the
    /// viewport.
    pub fn set_canvas_pos(&mut self, x: f32, y: f32) {
        self.canvas.x = x;
        self.canvas.y = y;
        self.save_canvas();
    }

    /// Insert a node at the given position with no label or color and return
    /// its new id.
    pub fn create_node(&mut self, x: f32, y: f32) -> NodeId {
        let node_id = new_id();
        self.nodes.insert(node_id, Node { x, y, label: String::new(), color: String::new() });
        self.rels_from_node.insert(node_id, HashSet::new());
        self.rels_to_node.insert(node_id, HashSet::new());
        self.save_nodes();
        node_id
    }

    /// Connect two nodes. Returns `None` without mutating if a relationship
    /// already joins the pair in either direction, or if an endpoint is
    /// missing. The duplicate check scans all relationships; fine at this
    /// scale.
    pub fn create_rel(&mut self, from: NodeId, to: NodeId) -> Option<RelId> {
        for rel in self.rels.values() {
            if (rel.from == from && rel.to == to) || (rel.from == to && rel.to == from) {
                return None;
            }
        }
        if !self.nodes.contains_key(&from) || !self.nodes.contains_key(&to) {
            return None;
        }

        let rel_id = new_id();
        self.rels.insert(rel_id, Rel { from, to });
        self.rels_from_node.entry(from).or_default().insert(rel_id);
        self.rels_to_node.entry(to).or_default().insert(rel_id);
        self.save_rels();
        Some(rel_id)
    }

    /// Remove a node and cascade-delete every relationship touching it,
    /// keeping the adjacency sets of the surviving endpoints consistent.
    /// Persists nodes always, relationships only when one was removed.
    pub fn delete_node(&mut self, node_id: NodeId) -> bool {
        if self.nodes.remove(&node_id).is_none() {
            return false;
        }

        let mut rels_altered = false;

        if let Some(outgoing) = self.rels_from_node.remove(&node_id) {
            for rel_id in outgoing {
                if let Some(rel) = self.rels.remove(&rel_id) {
                    if let Some(incoming) = self.rels_to_node.get_mut(&rel.to) {
                        incoming.remove(&rel_id);
                    }
                    rels_altered = true;
                }
            }
        }

        if let Some(incoming) = self.rels_to_node.remove(&node_id) {
            for rel_id in incoming {
                if let Some(rel) = self.rels.remove(&rel_id) {
                    if let Some(outgoing) = self.rels_from_node.get_mut(&rel.from) {
                        outgoing.remove(&rel_id);
                    }
                    rels_altered = true;
                }
            }
        }

        self.save_nodes();
        if rels_altered {
            self.save_rels();
        }
        true
    }

    /// Remove a relationship. Sweeps every node's adjacency sets rather than
    /// trusting the stored endpoints, which keeps the index clean even if it
    /// had drifted. Idempotent.
    pub fn delete_rel(&mut self, rel_id: RelId) -> bool {
        let existed = self.rels.remove(&rel_id).is_some();

        for outgoing in self.rels_from_node.values_mut() {
            outgoing.remove(&rel_id);
        }
        for incoming in self.rels_to_node.values_mut() {
            incoming.remove(&rel_id);
        }

        self.save_rels();
        existed
    }

    pub fn get_node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    pub fn get_rel(&self, rel_id: RelId) -> Option<&Rel> {
        self.rels.get(&rel_id)
    }

    /// Case-insensitive substring search over node labels, skipping unlabeled
    /// nodes and the excluded id. An empty query matches nothing.
    pub fn find_nodes_by_label(&self, query: &str, exclude: Option<NodeId>) -> Vec<NodeId> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.nodes
            .iter()
            .filter(|(id, node)| {
                Some(**id) != exclude
                    && !node.label.is_empty()
                    && node.label.to_lowercase().contains(&query)
            })
            .map(|(id, _)| *id)
            .collect()
    }

    fn save_nodes(&self) {
        if let Some(storage) = &self.storage {
            storage.save_nodes(&self.nodes);
        }
    }

    fn save_rels(&self) {
        if let Some(storage) = &self.storage {
            storage.save_rels(&self.rels);
        }
    }

    fn save_canvas(&self) {
        if let Some(storage) = &self.storage {
            storage.save_canvas(&self.canvas);
        }
    }
}
