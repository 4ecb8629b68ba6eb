mod app;
mod color;
mod config;
mod data;
mod engine;
mod error;
mod picks;
mod state;
mod ui;
mod view;

use std::path::Path;

use app::PickMeApp;
use eframe::egui;
use env_logger::Env;

fn main() -> eframe::Result {
    // Logger not installed yet: messages from reading settings are dropped.
    let config = config::load_config(Path::new(config::CONFIG_FILE));
    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_level.as_filter()))
        .init();
    log::info!("Starting with settings {:?}", config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "PickMe – Seismic Phase Picker",
        options,
        Box::new(|_cc| Ok(Box::new(PickMeApp::new(config)))),
    )
}
