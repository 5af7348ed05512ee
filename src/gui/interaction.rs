use eframe::egui::{pos2, Pos2};

use crate::graph_utils::graph::{Graph, NodeFields, NodeId};
use crate::gui::scene::{Hit, Scene, LABEL_PAD_X, LABEL_PAD_Y};

/// Per-axis displacement under which a completed node drag counts as a
/// click. There is no separate click handler for nodes.
pub const CLICK_TOLERANCE: f32 = 3.0;

enum DragState {
    Idle,
    // A node drag binds the node, its committed model position, and the
    // pointer position at drag start
    Node { node_id: NodeId, origin: Pos2, pointer_origin: Pos2 },
    // A canvas drag binds the committed pan offset and the pointer origin
    Canvas { origin: Pos2, pointer_origin: Pos2 },
}

/// State machine over pointer events that tells apart "click a node",
/// "drag a node", and "pan the canvas".
///
/// While a drag is live the engine writes positions straight into the scene's
/// elements; the model sees nothing until pointer-up, when the final position
/// is committed (and persisted) in one call. One drag at a time; a
/// pointer-down during a drag is ignored.
pub struct InteractionEngine {
    state: DragState,
}

impl InteractionEngine {
    pub fn new() -> Self {
        InteractionEngine { state: DragState::Idle }
    }

    pub fn is_dragging(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    /// Pointer-down entry: a node or label hit starts a node drag, the bare
    /// background starts a canvas drag.
    pub fn pointer_down(&mut self, hit: Hit, pointer: Pos2, graph: &Graph) {
        match hit {
            Hit::Node(node_id) | Hit::Label(node_id) => {
                self.begin_dragging_node(node_id, pointer, graph)
            }
            Hit::Background => {
                if self.is_dragging() {
                    return;
                }
                self.state = DragState::Canvas {
                    origin: pos2(graph.canvas.x, graph.canvas.y),
                    pointer_origin: pointer,
                };
            }
        }
    }

    /// Start dragging a node at the given pointer position. Also the direct
    /// entry point for callers outside the pointer handlers, e.g. right after
    /// click-to-add creates a node, so the user can place it without a second
    /// press.
    pub fn begin_dragging_node(&mut self, node_id: NodeId, pointer: Pos2, graph: &Graph) {
        if self.is_dragging() {
            return;
        }
        let Some(node) = graph.get_node(node_id) else {
            return;
        };
        self.state = DragState::Node {
            node_id,
            origin: pos2(node.x, node.y),
            pointer_origin: pointer,
        };
    }

    /// Apply the current pointer position to the live scene elements: the
    /// dragged node's circle and label, and the near endpoint of every line
    /// in its outgoing and incoming sets — or the rendered pan offset for a
    /// canvas drag. The model is never touched here.
    pub fn pointer_moved(&mut self, pointer: Pos2, graph: &Graph, scene: &mut Scene) {
        match &self.state {
            DragState::Idle => {}
            DragState::Node { node_id, origin, pointer_origin } => {
                let new_pos = *origin + (pointer - *pointer_origin);

                if let Some(circle) = scene.nodes.get_mut(node_id) {
                    circle.cx = new_pos.x;
                    circle.cy = new_pos.y;
                }
                if let Some(label) = scene.labels.get_mut(node_id) {
                    label.x = new_pos.x + LABEL_PAD_X;
                    label.y = new_pos.y + LABEL_PAD_Y;
                }
                if let Some(outgoing) = graph.rels_from_node.get(node_id) {
                    for rel_id in outgoing {
                        if let Some(line) = scene.rels.get_mut(rel_id) {
                            line.x1 = new_pos.x;
                            line.y1 = new_pos.y;
                        }
                    }
                }
                if let Some(incoming) = graph.rels_to_node.get(node_id) {
                    for rel_id in incoming {
                        if let Some(line) = scene.rels.get_mut(rel_id) {
                            line.x2 = new_pos.x;
                            line.y2 = new_pos.y;
                        }
                    }
                }
            }
            DragState::Canvas { origin, pointer_origin } => {
                let new_offset = *origin + (pointer - *pointer_origin);
                scene.offset = new_offset.to_vec2();
            }
        }
    }

    /// End the drag: commit the final node position or pan offset to the
    /// model (which persists it). Returns the node id when the gesture moved
    /// less than [`CLICK_TOLERANCE`] on both axes and should be treated as a
    /// click.
    pub fn pointer_up(&mut self, pointer: Pos2, graph: &mut Graph) -> Option<NodeId> {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Idle => None,
            DragState::Node { node_id, origin, pointer_origin } => {
                let delta = pointer - pointer_origin;
                let new_pos = origin + delta;
                graph.set_node_fields(node_id, NodeFields {
                    x: Some(new_pos.x),
                    y: Some(new_pos.y),
                    ..Default::default()
                });
                if delta.x.abs() < CLICK_TOLERANCE && delta.y.abs() < CLICK_TOLERANCE {
                    Some(node_id)
                } else {
                    None
                }
            }
            DragState::Canvas { origin, pointer_origin } => {
                let new_offset = origin + (pointer - pointer_origin);
                graph.set_canvas_pos(new_offset.x, new_offset.y);
                None
            }
        }
    }
}

impl Default for InteractionEngine {
    fn default() -> Self {
        Self::new()
    }
}
