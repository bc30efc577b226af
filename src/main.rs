mod app;
mod color;
mod state;
mod ui;

use app::RustyMassApp;
use eframe::egui;
use rusty_mass::config::{AppConfig, DEFAULT_CONFIG_PATH};

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::load_or_default(DEFAULT_CONFIG_PATH);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Mass – Invariant Mass Viewer",
        options,
        Box::new(move |_cc| Ok(Box::new(RustyMassApp::new(&config)))),
    )
}
