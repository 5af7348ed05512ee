use std::collections::HashMap;

use eframe::egui::{pos2, vec2, Color32, FontId, Painter, Pos2, Rect, Stroke, Vec2};

use crate::graph_utils::graph::{Graph, NodeId, RelId};

pub const NODE_RADIUS: f32 = 10.0;
pub const LABEL_PAD_X: f32 = NODE_RADIUS + 4.0;
// Label elements anchor at their top-left corner, so the vertical pad pulls
// the text up to sit level with the node
pub const LABEL_PAD_Y: f32 = -7.0;

const DEFAULT_NODE_COLOR: Color32 = Color32::from_rgb(225, 225, 225);
const DEFAULT_REL_COLOR: Color32 = Color32::from_rgb(160, 160, 160);
const LABEL_COLOR: Color32 = Color32::from_rgb(230, 230, 230);
const LABEL_FONT_SIZE: f32 = 14.0;

/// One rendered relationship line. Endpoints are world coordinates.
pub struct LineEl {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// One rendered node circle.
pub struct CircleEl {
    pub cx: f32,
    pub cy: f32,
    pub r: f32,
    pub fill: Color32,
}

/// One rendered node label. `size` is filled in with the measured text size
/// during painting and used for hit-testing.
pub struct TextEl {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub size: Vec2,
}

/// What a pointer-down landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hit {
    Node(NodeId),
    Label(NodeId),
    Background,
}

/// The retained render surface: one element per relationship, node, and
/// label, addressable by id so the interaction engine can move them directly
/// during a drag without a structural re-render.
///
/// Elements hold world coordinates; `offset` is the rendered pan transform
/// applied at paint and hit-test time. `rebuild` repopulates everything from
/// the model and runs only when the model changed at rest, never per pointer
/// move.
#[derive(Default)]
pub struct Scene {
    pub offset: Vec2,
    pub rels: HashMap<RelId, LineEl>,
    pub nodes: HashMap<NodeId, CircleEl>,
    pub labels: HashMap<NodeId, TextEl>,
}

impl Scene {
    pub fn from_graph(graph: &Graph) -> Self {
        let mut scene = Scene::default();
        scene.rebuild(graph);
        scene
    }

    /// Structural re-render: repopulate all elements from the model.
    pub fn rebuild(&mut self, graph: &Graph) {
        self.offset = vec2(graph.canvas.x, graph.canvas.y);

        self.rels.clear();
        for (rel_id, rel) in &graph.rels {
            let (Some(from), Some(to)) = (graph.nodes.get(&rel.from), graph.nodes.get(&rel.to))
            else {
                continue;
            };
            self.rels.insert(*rel_id, LineEl { x1: from.x, y1: from.y, x2: to.x, y2: to.y });
        }

        self.nodes.clear();
        self.labels.clear();
        for (node_id, node) in &graph.nodes {
            let fill = if node.color.is_empty() {
                DEFAULT_NODE_COLOR
            } else {
                Color32::from_hex(&node.color).unwrap_or(DEFAULT_NODE_COLOR)
            };
            self.nodes.insert(*node_id, CircleEl { cx: node.x, cy: node.y, r: NODE_RADIUS, fill });

            if !node.label.is_empty() {
                self.labels.insert(*node_id, TextEl {
                    x: node.x + LABEL_PAD_X,
                    y: node.y + LABEL_PAD_Y,
                    text: node.label.clone(),
                    size: Vec2::ZERO,
                });
            }
        }
    }

    /// Draw lines, then circles, then labels, shifted by the pan offset.
    /// Measured label sizes are cached on the elements for hit-testing.
    pub fn paint(&mut self, painter: &Painter) {
        let offset = self.offset;
        let stroke = Stroke { width: 1.5, color: DEFAULT_REL_COLOR };

        for line in self.rels.values() {
            painter.line_segment(
                [pos2(line.x1, line.y1) + offset, pos2(line.x2, line.y2) + offset],
                stroke,
            );
        }

        for circle in self.nodes.values() {
            painter.circle_filled(pos2(circle.cx, circle.cy) + offset, circle.r, circle.fill);
        }

        let font = FontId::proportional(LABEL_FONT_SIZE);
        for label in self.labels.values_mut() {
            let galley = painter.layout_no_wrap(label.text.clone(), font.clone(), LABEL_COLOR);
            label.size = galley.size();
            painter.galley(pos2(label.x, label.y) + offset, galley, LABEL_COLOR);
        }
    }

    /// Resolve what a screen-space pointer position lands on: the nearest
    /// node circle within its radius wins, then label boxes, else the
    /// background.
    pub fn hit_test(&self, screen_pos: Pos2) -> Hit {
        let world = screen_pos - self.offset;

        let mut best: Option<(NodeId, f32)> = None;
        for (node_id, circle) in &self.nodes {
            let d2 = (circle.cx - world.x).powi(2) + (circle.cy - world.y).powi(2);
            if d2 <= circle.r * circle.r && best.map_or(true, |(_, b)| d2 < b) {
                best = Some((*node_id, d2));
            }
        }
        if let Some((node_id, _)) = best {
            return Hit::Node(node_id);
        }

        for (node_id, label) in &self.labels {
            let rect = Rect::from_min_size(pos2(label.x, label.y), label.size);
            if rect.contains(world) {
                return Hit::Label(*node_id);
            }
        }

        Hit::Background
    }
}
