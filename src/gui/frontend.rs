use eframe::egui::{self, vec2, Align2, Color32, Key, Pos2, RichText, Sense, TextEdit};
use uuid::Uuid;

use crate::graph_utils::graph::{Graph, NodeFields, NodeId, RelId};
use crate::gui::interaction::InteractionEngine;
use crate::gui::scene::Scene;

// How long the add-node button stays hidden after handing its freshly
// created node to the drag engine
const ADD_NODE_COOLDOWN_SECS: f64 = 0.5;

fn short_id(id: Uuid) -> String {
    let s = id.to_string();
    format!("{}…", &s[..8])
}

pub struct GraphApp {
    graph: Graph,
    scene: Scene,
    engine: InteractionEngine,
    // The scene is rebuilt from the model at the next frame, set whenever
    // committed state changed
    scene_dirty: bool,
    last_pointer: Pos2,
    // Popup state
    edit_node: Option<NodeId>,
    label_input: String,
    color_input: String,
    add_rel_from: Option<NodeId>,
    rel_query: String,
    add_node_hidden_until: f64,
}

impl GraphApp {
    pub fn new(graph: Graph) -> Self {
        let scene = Scene::from_graph(&graph);
        GraphApp {
            graph,
            scene,
            engine: InteractionEngine::new(),
            scene_dirty: false,
            last_pointer: Pos2::ZERO,
            edit_node: None,
            label_input: String::new(),
            color_input: String::new(),
            add_rel_from: None,
            rel_query: String::new(),
            add_node_hidden_until: 0.0,
        }
    }

    fn open_node_editor(&mut self, node_id: NodeId) {
        let Some(node) = self.graph.get_node(node_id) else {
            return;
        };
        self.label_input = node.label.clone();
        self.color_input = node.color.clone();
        self.edit_node = Some(node_id);
    }

    fn node_display(&self, node_id: NodeId) -> String {
        match self.graph.get_node(node_id) {
            Some(node) if !node.label.is_empty() => node.label.clone(),
            _ => short_id(node_id),
        }
    }

    fn show_canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_rect_before_wrap();
            // The whole canvas is one interactive surface; popups float above
            // it on their own layers and win the hover
            let bg_resp = ui.allocate_rect(available, Sense::click_and_drag());

            if let Some(pos) = ui.input(|i| i.pointer.latest_pos()) {
                self.last_pointer = pos;
            }
            let pressed = ui.input(|i| i.pointer.primary_pressed());
            let released = ui.input(|i| i.pointer.primary_released());

            if pressed && bg_resp.hovered() {
                let hit = self.scene.hit_test(self.last_pointer);
                self.engine.pointer_down(hit, self.last_pointer, &self.graph);
            }
            if self.engine.is_dragging() {
                self.engine.pointer_moved(self.last_pointer, &self.graph, &mut self.scene);
            }
            if released && self.engine.is_dragging() {
                if let Some(clicked) = self.engine.pointer_up(self.last_pointer, &mut self.graph) {
                    self.open_node_editor(clicked);
                }
                // Committed state changed; re-render structurally at rest
                self.scene_dirty = true;
            }

            let painter = ui.painter_at(available);
            self.scene.paint(&painter);
        });
    }

    fn show_add_node_button(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.time) < self.add_node_hidden_until {
            return;
        }
        egui::Area::new(egui::Id::new("add-node-button"))
            .anchor(Align2::LEFT_BOTTOM, vec2(16.0, -16.0))
            .show(ctx, |ui| {
                if ui.button("Add node").clicked() {
                    let pos = ui
                        .input(|i| i.pointer.interact_pos())
                        .unwrap_or(self.last_pointer);
                    let world = pos - self.scene.offset;
                    let node_id = self.graph.create_node(world.x, world.y);
                    // Hand the new node straight to the engine so the same
                    // gesture places it
                    self.engine.begin_dragging_node(node_id, pos, &self.graph);
                    self.scene_dirty = true;
                    self.add_node_hidden_until = ui.input(|i| i.time) + ADD_NODE_COOLDOWN_SECS;
                }
            });
    }

    fn show_edit_node_window(&mut self, ctx: &egui::Context) {
        let Some(node_id) = self.edit_node else {
            return;
        };
        if self.graph.get_node(node_id).is_none() {
            self.edit_node = None;
            return;
        }

        let mut open = true;
        egui::Window::new("Edit node")
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Label");
                    ui.text_edit_singleline(&mut self.label_input);
                });
                ui.horizontal(|ui| {
                    ui.label("Color");
                    ui.add(TextEdit::singleline(&mut self.color_input).hint_text("#rrggbb"));
                });

                ui.separator();

                let mut rel_ids: Vec<RelId> = self
                    .graph
                    .rels_from_node
                    .get(&node_id)
                    .into_iter()
                    .chain(self.graph.rels_to_node.get(&node_id))
                    .flatten()
                    .copied()
                    .collect();
                rel_ids.sort();
                if !rel_ids.is_empty() {
                    ui.label("Relationships");
                }
                let mut to_delete: Option<RelId> = None;
                for rel_id in rel_ids {
                    let Some(rel) = self.graph.get_rel(rel_id) else {
                        continue;
                    };
                    let row = format!(
                        "{} → {}",
                        self.node_display(rel.from),
                        self.node_display(rel.to)
                    );
                    ui.horizontal(|ui| {
                        ui.label(row);
                        if ui.small_button("✕").clicked() {
                            to_delete = Some(rel_id);
                        }
                    });
                }
                if let Some(rel_id) = to_delete {
                    self.graph.delete_rel(rel_id);
                    self.scene_dirty = true;
                }
                if ui.button("Add relationship…").clicked() {
                    self.rel_query.clear();
                    self.add_rel_from = Some(node_id);
                }

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        self.graph.set_node_fields(node_id, NodeFields {
                            label: Some(self.label_input.trim().to_string()),
                            color: Some(self.color_input.trim().to_string()),
                            ..Default::default()
                        });
                        self.scene_dirty = true;
                        self.edit_node = None;
                    }
                    if ui.button(RichText::new("Delete").color(Color32::RED)).clicked() {
                        self.graph.delete_node(node_id);
                        self.scene_dirty = true;
                        self.edit_node = None;
                        self.add_rel_from = None;
                    }
                    if ui.button("Cancel").clicked() {
                        self.edit_node = None;
                    }
                });
            });
        if !open {
            self.edit_node = None;
        }
    }

    fn show_add_rel_window(&mut self, ctx: &egui::Context) {
        let Some(from_id) = self.add_rel_from else {
            return;
        };
        if self.graph.get_node(from_id).is_none() {
            self.add_rel_from = None;
            return;
        }

        let mut open = true;
        egui::Window::new("Add relationship")
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("From");
                    let mut from_display = self.node_display(from_id);
                    ui.add_enabled(false, TextEdit::singleline(&mut from_display));
                });
                ui.horizontal(|ui| {
                    ui.label("To");
                    ui.add(TextEdit::singleline(&mut self.rel_query).hint_text("Node label.."));
                });

                let mut matches = self.graph.find_nodes_by_label(&self.rel_query, Some(from_id));
                matches.sort();
                for candidate in matches {
                    if ui.button(self.node_display(candidate)).clicked() {
                        // A duplicate pair returns no id and creates nothing;
                        // the popup closes either way
                        self.graph.create_rel(from_id, candidate);
                        self.scene_dirty = true;
                        self.add_rel_from = None;
                    }
                }
            });
        if !open {
            self.add_rel_from = None;
        }
    }
}

impl eframe::App for GraphApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.scene_dirty {
            self.scene.rebuild(&self.graph);
            self.scene_dirty = false;
        }

        self.show_canvas(ctx);
        self.show_add_node_button(ctx);
        self.show_edit_node_window(ctx);
        self.show_add_rel_window(ctx);

        // Esc closes the topmost popup
        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            if self.add_rel_from.is_some() {
                self.add_rel_from = None;
            } else {
                self.edit_node = None;
            }
        }
    }
}
