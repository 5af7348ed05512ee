use std::collections::{HashMap, HashSet};

use eframe::egui::pos2;
use uuid::Uuid;

use graph_sketch::graph_utils::graph::{Canvas, Graph, Node, NodeFields, Rel};
use graph_sketch::graph_utils::ids::new_id;
use graph_sketch::gui::interaction::InteractionEngine;
use graph_sketch::gui::scene::{Hit, Scene, LABEL_PAD_X, LABEL_PAD_Y};
use graph_sketch::persistence::store::GraphStorage;

fn new_graph() -> Graph {
    Graph::new(Canvas::default(), HashMap::new(), HashMap::new(), None)
}

fn bare_node(x: f32, y: f32) -> Node {
    Node { x, y, label: String::new(), color: String::new() }
}

// The index must always be exactly derivable from the relationship map:
// one outgoing and one incoming set per node, every rel in precisely the
// sets of its own endpoints, no dangling rel ids.
fn assert_index_consistent(graph: &Graph) {
    assert_eq!(graph.rels_from_node.len(), graph.nodes.len());
    assert_eq!(graph.rels_to_node.len(), graph.nodes.len());
    for node_id in graph.nodes.keys() {
        assert!(graph.rels_from_node.contains_key(node_id));
        assert!(graph.rels_to_node.contains_key(node_id));
    }
    for (rel_id, rel) in &graph.rels {
        for (node_id, outgoing) in &graph.rels_from_node {
            assert_eq!(outgoing.contains(rel_id), *node_id == rel.from);
        }
        for (node_id, incoming) in &graph.rels_to_node {
            assert_eq!(incoming.contains(rel_id), *node_id == rel.to);
        }
    }
    for set in graph.rels_from_node.values().chain(graph.rels_to_node.values()) {
        for rel_id in set {
            assert!(graph.rels.contains_key(rel_id));
        }
    }
}

#[test]
fn create_node_initializes_empty_adjacency() {
    let mut graph = new_graph();
    let id = graph.create_node(10.0, 20.0);

    let node = graph.get_node(id).expect("node should exist");
    assert_eq!((node.x, node.y), (10.0, 20.0));
    assert!(node.label.is_empty());
    assert!(node.color.is_empty());
    assert!(graph.rels_from_node[&id].is_empty());
    assert!(graph.rels_to_node[&id].is_empty());
    assert_index_consistent(&graph);
}

#[test]
fn create_rel_rejects_duplicate_unordered_pair() {
    let mut graph = new_graph();
    let a = graph.create_node(0.0, 0.0);
    let b = graph.create_node(1.0, 1.0);

    let first = graph.create_rel(a, b);
    assert!(first.is_some());
    // Same pair, reversed direction: silently rejected
    assert!(graph.create_rel(b, a).is_none());
    assert!(graph.create_rel(a, b).is_none());

    assert_eq!(graph.rels.len(), 1);
    let rel = graph.get_rel(first.unwrap()).unwrap();
    assert!(rel.from == a && rel.to == b);
    assert_index_consistent(&graph);
}

#[test]
fn create_rel_requires_both_endpoints() {
    let mut graph = new_graph();
    let a = graph.create_node(0.0, 0.0);
    assert!(graph.create_rel(a, new_id()).is_none());
    assert!(graph.create_rel(new_id(), a).is_none());
    assert!(graph.rels.is_empty());
}

#[test]
fn delete_node_cascades_through_both_directions() {
    let mut graph = new_graph();
    let a = graph.create_node(0.0, 0.0);
    let b = graph.create_node(1.0, 0.0);
    let c = graph.create_node(2.0, 0.0);
    graph.create_rel(a, b).unwrap();
    graph.create_rel(b, c).unwrap();

    assert!(graph.delete_node(b));

    assert!(graph.rels.is_empty());
    assert!(graph.get_node(a).is_some());
    assert!(graph.get_node(c).is_some());
    assert!(graph.rels_from_node[&a].is_empty());
    assert!(graph.rels_to_node[&a].is_empty());
    assert!(graph.rels_from_node[&c].is_empty());
    assert!(graph.rels_to_node[&c].is_empty());
    assert!(!graph.rels_from_node.contains_key(&b));
    assert!(!graph.rels_to_node.contains_key(&b));
    assert_index_consistent(&graph);
}

#[test]
fn set_node_fields_patches_only_present_fields() {
    let mut graph = new_graph();
    let id = graph.create_node(0.0, 0.0);
    graph.set_node_fields(id, NodeFields {
        label: Some("water".into()),
        color: Some("#3196cc".into()),
        ..Default::default()
    });

    assert!(graph.set_node_fields(id, NodeFields {
        color: Some("#fff".into()),
        ..Default::default()
    }));

    let node = graph.get_node(id).unwrap();
    assert_eq!(node.label, "water");
    assert_eq!(node.color, "#fff");
}

#[test]
fn set_node_fields_unknown_node_is_a_noop() {
    let mut graph = new_graph();
    assert!(!graph.set_node_fields(new_id(), NodeFields {
        label: Some("ghost".into()),
        ..Default::default()
    }));
    assert!(graph.nodes.is_empty());
}

#[test]
fn delete_rel_is_idempotent() {
    let mut graph = new_graph();
    let a = graph.create_node(0.0, 0.0);
    let b = graph.create_node(1.0, 1.0);
    let rel_id = graph.create_rel(a, b).unwrap();

    assert!(graph.delete_rel(rel_id));
    let rels_after_first = graph.rels.clone();
    let from_after_first = graph.rels_from_node.clone();
    let to_after_first = graph.rels_to_node.clone();

    assert!(!graph.delete_rel(rel_id));
    assert_eq!(graph.rels.len(), rels_after_first.len());
    assert_eq!(graph.rels_from_node, from_after_first);
    assert_eq!(graph.rels_to_node, to_after_first);
    assert_index_consistent(&graph);
}

#[test]
fn index_stays_consistent_under_mixed_mutations() {
    let mut graph = new_graph();
    let mut node_ids = Vec::new();
    for i in 0..6 {
        node_ids.push(graph.create_node(i as f32, 0.0));
    }
    for window in node_ids.windows(2) {
        graph.create_rel(window[0], window[1]);
    }
    graph.create_rel(node_ids[0], node_ids[5]);
    assert_index_consistent(&graph);

    graph.delete_node(node_ids[2]);
    assert_index_consistent(&graph);

    let surviving_rel = *graph.rels.keys().next().unwrap();
    graph.delete_rel(surviving_rel);
    assert_index_consistent(&graph);

    let d = graph.create_node(9.0, 9.0);
    graph.create_rel(node_ids[0], d);
    assert_index_consistent(&graph);
}

#[test]
fn index_is_built_from_loaded_state() {
    let a = new_id();
    let b = new_id();
    let rel_id = new_id();
    let nodes = HashMap::from([(a, bare_node(0.0, 0.0)), (b, bare_node(5.0, 5.0))]);
    let rels = HashMap::from([(rel_id, Rel { from: a, to: b })]);

    let graph = Graph::new(Canvas::default(), nodes, rels, None);

    assert_eq!(graph.rels_from_node[&a], HashSet::from([rel_id]));
    assert_eq!(graph.rels_to_node[&b], HashSet::from([rel_id]));
    assert!(graph.rels_from_node[&b].is_empty());
    assert!(graph.rels_to_node[&a].is_empty());
    assert_index_consistent(&graph);
}

#[test]
fn ids_are_unique() {
    let mut seen = HashSet::new();
    for _ in 0..1000 {
        assert!(seen.insert(new_id()));
    }
}

#[test]
fn find_nodes_by_label_is_case_insensitive_and_excludes() {
    let mut graph = new_graph();
    let water = graph.create_node(0.0, 0.0);
    let seawater = graph.create_node(1.0, 0.0);
    let ice = graph.create_node(2.0, 0.0);
    let unlabeled = graph.create_node(3.0, 0.0);
    graph.set_node_fields(water, NodeFields { label: Some("Water".into()), ..Default::default() });
    graph.set_node_fields(seawater, NodeFields { label: Some("seawater".into()), ..Default::default() });
    graph.set_node_fields(ice, NodeFields { label: Some("ice".into()), ..Default::default() });

    let found: HashSet<Uuid> = graph.find_nodes_by_label("water", None).into_iter().collect();
    assert_eq!(found, HashSet::from([water, seawater]));

    let found: HashSet<Uuid> = graph
        .find_nodes_by_label("WATER", Some(water))
        .into_iter()
        .collect();
    assert_eq!(found, HashSet::from([seawater]));

    assert!(graph.find_nodes_by_label("", None).is_empty());
    assert!(graph.find_nodes_by_label("water", None).iter().all(|id| *id != unlabeled));
}

#[test]
fn short_node_drag_counts_as_click_long_drag_does_not() {
    let mut graph = new_graph();
    let id = graph.create_node(100.0, 100.0);
    let mut engine = InteractionEngine::new();

    // Displacement (2, 1): under the 3-unit threshold on both axes
    engine.pointer_down(Hit::Node(id), pos2(100.0, 100.0), &graph);
    assert!(engine.is_dragging());
    let clicked = engine.pointer_up(pos2(102.0, 101.0), &mut graph);
    assert_eq!(clicked, Some(id));
    let node = graph.get_node(id).unwrap();
    assert_eq!((node.x, node.y), (102.0, 101.0));

    // Displacement (10, 0): a real drag, no click
    engine.pointer_down(Hit::Node(id), pos2(102.0, 101.0), &graph);
    let clicked = engine.pointer_up(pos2(112.0, 101.0), &mut graph);
    assert_eq!(clicked, None);
    let node = graph.get_node(id).unwrap();
    assert_eq!((node.x, node.y), (112.0, 101.0));
    assert!(!engine.is_dragging());
}

#[test]
fn node_drag_moves_scene_elements_without_touching_the_model() {
    let a = new_id();
    let b = new_id();
    let c = new_id();
    let out_rel = new_id();
    let in_rel = new_id();
    let nodes = HashMap::from([
        (a, Node { x: 0.0, y: 0.0, label: "alpha".into(), color: String::new() }),
        (b, bare_node(100.0, 0.0)),
        (c, bare_node(50.0, 50.0)),
    ]);
    let rels = HashMap::from([
        (out_rel, Rel { from: a, to: b }),
        (in_rel, Rel { from: c, to: a }),
    ]);
    let mut graph = Graph::new(Canvas::default(), nodes, rels, None);
    let mut scene = Scene::from_graph(&graph);
    let mut engine = InteractionEngine::new();

    engine.pointer_down(Hit::Label(a), pos2(0.0, 0.0), &graph);
    engine.pointer_moved(pos2(20.0, 10.0), &graph, &mut scene);

    let circle = &scene.nodes[&a];
    assert_eq!((circle.cx, circle.cy), (20.0, 10.0));
    let label = &scene.labels[&a];
    assert_eq!((label.x, label.y), (20.0 + LABEL_PAD_X, 10.0 + LABEL_PAD_Y));
    // Outgoing rel follows at its "from" end, incoming at its "to" end
    let out_line = &scene.rels[&out_rel];
    assert_eq!((out_line.x1, out_line.y1), (20.0, 10.0));
    assert_eq!((out_line.x2, out_line.y2), (100.0, 0.0));
    let in_line = &scene.rels[&in_rel];
    assert_eq!((in_line.x2, in_line.y2), (20.0, 10.0));
    assert_eq!((in_line.x1, in_line.y1), (50.0, 50.0));
    // The model only learns the position at release
    let node = graph.get_node(a).unwrap();
    assert_eq!((node.x, node.y), (0.0, 0.0));

    engine.pointer_up(pos2(20.0, 10.0), &mut graph);
    let node = graph.get_node(a).unwrap();
    assert_eq!((node.x, node.y), (20.0, 10.0));
}

#[test]
fn canvas_drag_commits_offset_and_preserves_scale() {
    let canvas = Canvas { x: 5.0, y: 7.0, scale: 1.5 };
    let mut graph = Graph::new(canvas, HashMap::new(), HashMap::new(), None);
    let mut scene = Scene::from_graph(&graph);
    let mut engine = InteractionEngine::new();

    engine.pointer_down(Hit::Background, pos2(10.0, 10.0), &graph);
    engine.pointer_moved(pos2(30.0, 25.0), &graph, &mut scene);

    assert_eq!((scene.offset.x, scene.offset.y), (25.0, 22.0));
    // Live update only; the model keeps the committed offset until release
    assert_eq!((graph.canvas.x, graph.canvas.y), (5.0, 7.0));

    engine.pointer_up(pos2(30.0, 25.0), &mut graph);
    assert_eq!((graph.canvas.x, graph.canvas.y), (25.0, 22.0));
    assert_eq!(graph.canvas.scale, 1.5);
}

#[test]
fn pointer_down_during_a_drag_is_ignored() {
    let mut graph = new_graph();
    let a = graph.create_node(0.0, 0.0);
    let b = graph.create_node(100.0, 100.0);
    let mut engine = InteractionEngine::new();

    engine.pointer_down(Hit::Node(a), pos2(0.0, 0.0), &graph);
    // Neither another node nor the background may steal the drag
    engine.pointer_down(Hit::Node(b), pos2(100.0, 100.0), &graph);
    engine.pointer_down(Hit::Background, pos2(50.0, 50.0), &graph);

    engine.pointer_up(pos2(10.0, 0.0), &mut graph);
    let node_a = graph.get_node(a).unwrap();
    assert_eq!((node_a.x, node_a.y), (10.0, 0.0));
    let node_b = graph.get_node(b).unwrap();
    assert_eq!((node_b.x, node_b.y), (100.0, 100.0));
    assert_eq!((graph.canvas.x, graph.canvas.y), (0.0, 0.0));
}

#[test]
fn moves_and_releases_while_idle_are_noops() {
    let mut graph = new_graph();
    let id = graph.create_node(40.0, 40.0);
    let mut scene = Scene::from_graph(&graph);
    let mut engine = InteractionEngine::new();

    engine.pointer_moved(pos2(200.0, 200.0), &graph, &mut scene);
    let circle = &scene.nodes[&id];
    assert_eq!((circle.cx, circle.cy), (40.0, 40.0));

    assert_eq!(engine.pointer_up(pos2(200.0, 200.0), &mut graph), None);
    let node = graph.get_node(id).unwrap();
    assert_eq!((node.x, node.y), (40.0, 40.0));
}

#[test]
fn begin_dragging_unknown_node_is_a_noop() {
    let graph = new_graph();
    let mut engine = InteractionEngine::new();
    engine.begin_dragging_node(new_id(), pos2(0.0, 0.0), &graph);
    assert!(!engine.is_dragging());
}

#[test]
fn storage_serves_demo_defaults_when_empty() {
    let dir = tempfile::tempdir().unwrap();
    let storage = GraphStorage::with_dir(dir.path(), "main");

    let canvas = storage.load_canvas();
    assert_eq!((canvas.x, canvas.y, canvas.scale), (0.0, 0.0, 1.0));

    let nodes = storage.load_nodes();
    let rels = storage.load_rels();
    assert_eq!(nodes.len(), 2);
    assert_eq!(rels.len(), 1);
    let labels: HashSet<&str> = nodes.values().map(|n| n.label.as_str()).collect();
    assert_eq!(labels, HashSet::from(["water", "ice"]));
    // The demo rel joins the demo nodes
    let rel = rels.values().next().unwrap();
    assert!(nodes.contains_key(&rel.from));
    assert!(nodes.contains_key(&rel.to));
}

#[test]
fn storage_round_trips_graph_mutations() {
    let dir = tempfile::tempdir().unwrap();
    let storage = GraphStorage::with_dir(dir.path(), "roundtrip");

    let mut graph = Graph::new(
        Canvas::default(),
        HashMap::new(),
        HashMap::new(),
        Some(storage.clone()),
    );
    let a = graph.create_node(1.0, 2.0);
    let b = graph.create_node(3.0, 4.0);
    graph.set_node_fields(a, NodeFields {
        label: Some("water".into()),
        color: Some("#3196cc".into()),
        ..Default::default()
    });
    let rel_id = graph.create_rel(a, b).unwrap();
    graph.set_canvas_pos(-40.0, 12.5);

    let reloaded = Graph::new(
        storage.load_canvas(),
        storage.load_nodes(),
        storage.load_rels(),
        None,
    );
    assert_eq!((reloaded.canvas.x, reloaded.canvas.y), (-40.0, 12.5));
    assert_eq!(reloaded.canvas.scale, 1.0);
    let node = reloaded.get_node(a).unwrap();
    assert_eq!((node.x, node.y), (1.0, 2.0));
    assert_eq!(node.label, "water");
    assert_eq!(node.color, "#3196cc");
    let rel = reloaded.get_rel(rel_id).unwrap();
    assert!(rel.from == a && rel.to == b);
    assert_index_consistent(&reloaded);

    // A cascade delete lands on disk too
    graph.delete_node(a);
    let nodes = storage.load_nodes();
    let rels = storage.load_rels();
    assert!(!nodes.contains_key(&a));
    assert!(rels.is_empty());
}

#[test]
fn storage_namespaces_do_not_collide() {
    let dir = tempfile::tempdir().unwrap();
    let first = GraphStorage::with_dir(dir.path(), "first");
    let second = GraphStorage::with_dir(dir.path(), "second");

    let mut graph = Graph::new(
        Canvas::default(),
        HashMap::new(),
        HashMap::new(),
        Some(first.clone()),
    );
    graph.create_node(0.0, 0.0);
    graph.create_node(1.0, 1.0);
    graph.create_node(2.0, 2.0);

    assert_eq!(first.load_nodes().len(), 3);
    // The sibling namespace still serves the demo defaults
    let other_nodes = second.load_nodes();
    assert_eq!(other_nodes.len(), 2);
    assert!(other_nodes.values().any(|n| n.label == "water"));
}

#[test]
fn persisted_node_entry_omits_empty_fields() {
    let value = serde_json::to_value(bare_node(1.0, 2.0)).unwrap();
    assert_eq!(value, serde_json::json!({ "x": 1.0, "y": 2.0 }));

    let labeled = serde_json::to_value(Node {
        x: 1.0,
        y: 2.0,
        label: "water".into(),
        color: "#3196cc".into(),
    })
    .unwrap();
    assert_eq!(
        labeled,
        serde_json::json!({ "x": 1.0, "y": 2.0, "label": "water", "color": "#3196cc" })
    );
}
