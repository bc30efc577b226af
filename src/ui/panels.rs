use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use rusty_mass::analysis::ranges::RangeStatistic;
use rusty_mass::analysis::{SingleParticle, ViewMode};

use crate::state::AppState;

/// Largest bin count offered by the bins control.
const MAX_BINS: i64 = 1000;

// ---------------------------------------------------------------------------
// Left side panel – statistics tables
// ---------------------------------------------------------------------------

/// Render the energy-window statistics for every single-particle category.
pub fn side_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("Statistics");
    ui.separator();

    let Some(result) = &state.result else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for particle in SingleParticle::ALL {
                let Some(stats) = result.statistics.get(particle.key()) else {
                    continue;
                };
                egui::CollapsingHeader::new(RichText::new(title_case(particle.key())).strong())
                    .id_salt(particle.key())
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        ui.push_id(particle.key(), |ui: &mut Ui| statistics_table(ui, stats));
                    });
            }
        });
}

fn statistics_table(ui: &mut Ui, stats: &[RangeStatistic]) {
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto().at_least(130.0))
        .column(Column::auto().at_least(50.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Range");
            });
            header.col(|ui| {
                ui.strong("Events");
            });
            header.col(|ui| {
                ui.strong("Mean (GeV)");
            });
        })
        .body(|mut body| {
            for stat in stats {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(&stat.range_label);
                    });
                    row.col(|ui| {
                        ui.label(stat.event_count.to_string());
                    });
                    row.col(|ui| {
                        ui.label(stat.mean_mass.to_string());
                    });
                });
            }
        });
}

fn title_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar with the request controls.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!("{} events loaded", table.len()));
        } else if state.loading {
            ui.label("Loading…");
        }

        ui.separator();

        // ---- View mode ----
        let mut view_mode = state.request.view_mode;
        egui::ComboBox::from_id_salt("view_mode")
            .selected_text(view_mode.as_str())
            .show_ui(ui, |ui: &mut Ui| {
                for mode in ViewMode::ALL {
                    ui.selectable_value(&mut view_mode, mode, mode.as_str());
                }
            });
        state.set_view_mode(view_mode);

        // ---- Bins ----
        let mut bins = state.request.effective_bins() as i64;
        ui.label("Bins");
        ui.add(egui::DragValue::new(&mut bins).range(1..=MAX_BINS));
        state.set_bins(bins);

        if ui
            .selectable_label(state.request.log_scale, "Log scale")
            .clicked()
        {
            state.toggle_log_scale();
        }

        // ---- Group scope (Parquet sources only) ----
        if !state.groups.is_empty() {
            ui.separator();
            let mut group = state.request.group_id.clone();
            egui::ComboBox::from_id_salt("group_scope")
                .selected_text(group.as_deref().unwrap_or("all groups"))
                .show_ui(ui, |ui: &mut Ui| {
                    ui.selectable_value(&mut group, None, "all groups");
                    for id in &state.groups {
                        ui.selectable_value(&mut group, Some(id.clone()), id);
                    }
                });
            state.set_group(group);
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open collision data")
        .add_filter("Supported files", &["csv", "txt", "tsv", "parquet", "pq"])
        .add_filter("Delimited text", &["csv", "txt", "tsv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}
