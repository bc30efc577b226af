use eframe::egui;

use rusty_mass::config::AppConfig;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyMassApp {
    pub state: AppState,
}

impl RustyMassApp {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            state: AppState::new(config.analysis.request()),
        }
    }
}

impl eframe::App for RustyMassApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar and request controls ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: statistics ----
        egui::SidePanel::left("statistics_panel")
            .default_width(320.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &self.state);
            });

        // ---- Central panel: histograms ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::histogram_plots(ui, &self.state);
        });
    }
}
