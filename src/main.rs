use graph_sketch::graph_utils::graph::Graph;
use graph_sketch::gui::frontend::GraphApp;
use graph_sketch::persistence::settings::AppSettings;
use graph_sketch::persistence::store::GraphStorage;

use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let settings = match AppSettings::load() {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("failed to load settings, using defaults: {e:#}");
            AppSettings::default()
        }
    };
    let storage = GraphStorage::open(&settings);
    log::info!("opening graph '{}'", settings.graph_name);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 710.0])
            // Provide sensible bounds so the UI stays usable on small screens
            .with_min_inner_size([700.0, 420.0])
            .with_resizable(true),
        ..Default::default()
    };
    eframe::run_native(
        "Graph-Sketch",
        options,
        Box::new(move |_cc| {
            let graph = Graph::new(
                storage.load_canvas(),
                storage.load_nodes(),
                storage.load_rels(),
                Some(storage),
            );
            Ok(Box::new(GraphApp::new(graph)) as Box<dyn eframe::App>)
        }),
    )
}
