use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::phase_color;
use crate::config::AppConfig;
use crate::data::filter::ALLOWED_CORNERS;
use crate::picks::Onset;
use crate::state::{AppState, PresetDraft};

// ---------------------------------------------------------------------------
// Left side panel – presets, picking options, picks table
// ---------------------------------------------------------------------------

/// Preset list edits, applied once the panel has been drawn.
enum PresetAction {
    Edit(usize),
    Remove(usize),
    Commit,
    Cancel,
}

/// Render the left side panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    let Some(engine) = state.engine.as_ref() else {
        ui.heading("Picks");
        ui.separator();
        ui.label("No waveforms loaded.");
        return;
    };

    let mut action = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Filter presets ----
            ui.heading("Filters");
            ui.separator();
            if engine.presets().is_empty() {
                ui.label("No presets yet.");
            }
            for (i, preset) in engine.presets().iter().enumerate() {
                ui.horizontal(|ui: &mut Ui| {
                    let mut text = RichText::new(preset.to_string());
                    if engine.active_filter() == Some(i) {
                        text = text.strong();
                    }
                    if ui
                        .selectable_label(state.selected_preset == Some(i), text)
                        .clicked()
                    {
                        state.selected_preset = Some(i);
                    }
                    if ui.small_button("Edit").clicked() {
                        action = Some(PresetAction::Edit(i));
                    }
                    if ui.small_button("✕").clicked() {
                        action = Some(PresetAction::Remove(i));
                    }
                });
            }

            ui.add_space(4.0);
            let draft = &mut state.preset_draft;
            let title = match draft.editing {
                Some(_) => "Edit preset",
                None => "New preset",
            };
            egui::CollapsingHeader::new(RichText::new(title).strong())
                .id_salt("preset_editor")
                .default_open(draft.editing.is_some())
                .show(ui, |ui: &mut Ui| {
                    egui::Grid::new("preset_grid")
                        .num_columns(2)
                        .show(ui, |ui: &mut Ui| {
                            ui.label("Name");
                            ui.text_edit_singleline(&mut draft.name);
                            ui.end_row();

                            ui.label("freqmin [Hz]");
                            ui.add(egui::DragValue::new(&mut draft.freqmin).speed(0.05).range(0.001..=1e4));
                            ui.end_row();

                            ui.label("freqmax [Hz]");
                            ui.add(egui::DragValue::new(&mut draft.freqmax).speed(0.05).range(0.001..=1e4));
                            ui.end_row();

                            ui.label("Corners");
                            egui::ComboBox::from_id_salt("corners")
                                .selected_text(draft.corners.to_string())
                                .show_ui(ui, |ui: &mut Ui| {
                                    for corners in ALLOWED_CORNERS {
                                        ui.selectable_value(&mut draft.corners, corners, corners.to_string());
                                    }
                                });
                            ui.end_row();
                        });
                    ui.horizontal(|ui: &mut Ui| {
                        let label = if draft.editing.is_some() { "Update" } else { "Add" };
                        if ui.button(label).clicked() {
                            action = Some(PresetAction::Commit);
                        }
                        if draft.editing.is_some() && ui.button("Cancel").clicked() {
                            action = Some(PresetAction::Cancel);
                        }
                    });
                });

            // ---- Picking options ----
            ui.add_space(8.0);
            ui.heading("Picking");
            ui.separator();
            ui.label("Hold q (P), w (S) or e (custom) and click a trace.");
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Custom phase");
                ui.add(egui::TextEdit::singleline(&mut state.custom_phase).desired_width(60.0));
                egui::ComboBox::from_id_salt("used_phases")
                    .selected_text("used")
                    .show_ui(ui, |ui: &mut Ui| {
                        for hint in engine.phase_hints() {
                            if ui.selectable_label(state.custom_phase == hint, hint).clicked() {
                                state.custom_phase = hint.to_string();
                            }
                        }
                    });
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Onset");
                egui::ComboBox::from_id_salt("onset")
                    .selected_text(state.onset.map_or("unset", |o| o.as_str()))
                    .show_ui(ui, |ui: &mut Ui| {
                        ui.selectable_value(&mut state.onset, None, "unset");
                        for onset in [Onset::Impulsive, Onset::Emergent, Onset::Questionable] {
                            ui.selectable_value(&mut state.onset, Some(onset), onset.as_str());
                        }
                    });
            });

            // ---- Picks of the current station ----
            ui.add_space(8.0);
            ui.heading("Picks");
            ui.separator();
            let markers = engine.current_picks();
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(false)
                .column(Column::auto())
                .column(Column::auto())
                .column(Column::remainder())
                .header(18.0, |mut header| {
                    header.col(|ui| {
                        ui.strong("Phase");
                    });
                    header.col(|ui| {
                        ui.strong("Channel");
                    });
                    header.col(|ui| {
                        ui.strong("Time (UTC)");
                    });
                })
                .body(|mut body| {
                    for marker in &markers {
                        let pick = marker.pick;
                        body.row(18.0, |mut row| {
                            row.col(|ui| {
                                ui.label(
                                    RichText::new(&pick.phase_hint).color(phase_color(marker.class)),
                                );
                            });
                            row.col(|ui| {
                                ui.label(&pick.waveform_id.channel);
                            });
                            row.col(|ui| {
                                ui.label(pick.time.format("%H:%M:%S%.3f").to_string());
                            });
                        });
                    }
                });
            if engine.ledger().is_empty() {
                ui.label("No picks yet.");
            } else {
                ui.label(format!("{} picks in total", engine.ledger().len()));
            }
        });

    match action {
        Some(PresetAction::Edit(i)) => {
            if let Some(preset) = state.engine.as_ref().and_then(|e| e.presets().get(i)) {
                state.preset_draft = PresetDraft::edit(i, preset);
            }
        }
        Some(PresetAction::Remove(i)) => state.remove_preset(i),
        Some(PresetAction::Commit) => state.commit_preset_draft(),
        Some(PresetAction::Cancel) => state.preset_draft = PresetDraft::default(),
        None => {}
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open waveforms…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            ui.add_enabled_ui(state.engine.is_some(), |ui: &mut Ui| {
                if ui.button("Save picks").clicked() {
                    save_catalog(state);
                    ui.close_menu();
                }
                if ui.button("Save picks as…").clicked() {
                    save_catalog_dialog(state);
                    ui.close_menu();
                }
                if ui.button("Load picks…").clicked() {
                    load_catalog_dialog(state);
                    ui.close_menu();
                }
                if ui.button("Save plot image…").clicked() {
                    save_plot_dialog(ui.ctx(), state);
                    ui.close_menu();
                }
            });
            ui.separator();
            if ui.button("Quit").clicked() {
                ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });
        ui.menu_button("Help", |ui: &mut Ui| {
            ui.strong("Controls");
            ui.label(controls_help(&state.config));
        });

        ui.separator();

        let Some(engine) = state.engine.as_mut() else {
            return;
        };

        if ui.button("◀").on_hover_text("Previous station (s)").clicked() {
            engine.go_previous();
        }
        let position = engine.station_index();
        let mut jump = None;
        egui::ComboBox::from_id_salt("station")
            .selected_text(engine.current_station())
            .show_ui(ui, |ui: &mut Ui| {
                for (i, station) in engine.stations().iter().enumerate() {
                    if ui.selectable_label(i == position, station).clicked() {
                        jump = Some(station.clone());
                    }
                }
            });
        if ui.button("▶").on_hover_text("Next station (d)").clicked() {
            engine.go_next();
        }
        if let Some(station) = jump {
            let result = engine.select_station(&station);
            state.report(result);
            return;
        }

        ui.separator();

        let filtered = engine.active_filter().is_some();
        if ui
            .selectable_label(filtered, "Bandpass")
            .on_hover_text("Toggle filter (f)")
            .clicked()
        {
            state.toggle_filter();
        }
    });
}

/// Key bindings and the files written on exit.
fn controls_help(config: &AppConfig) -> String {
    format!(
        "d / s: next / previous station\n\
         f: toggle the selected bandpass filter\n\
         q + click: P pick\n\
         w + click: S pick\n\
         e + click: custom phase pick\n\
         Drag to pan, scroll to zoom, double-click to reset\n\
         \n\
         Filter presets: {}\n\
         Backup catalog (written on exit): {}",
        config.filter_store.display(),
        config.backup_catalog.display()
    )
}

// ---------------------------------------------------------------------------
// Status bar
// ---------------------------------------------------------------------------

pub fn status_bar(ui: &mut Ui, state: &AppState) {
    ui.horizontal(|ui: &mut Ui| {
        match &state.engine {
            Some(engine) => {
                if let Some(name) = state.source.as_deref().and_then(|p| p.file_name()) {
                    ui.label(name.to_string_lossy().into_owned());
                    ui.separator();
                }
                ui.label(engine.status().to_string());
                if let Some(path) = engine.catalog_path() {
                    ui.separator();
                    ui.label(format!("Catalog: {}", path.display()));
                }
            }
            None => {
                ui.label("No session");
            }
        }
        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open waveforms")
        .add_filter("Supported files", &["json", "csv"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(collection) => {
                log::info!(
                    "Loaded {} traces on {} stations from {:?}",
                    collection.len(),
                    collection.stations().len(),
                    path
                );
                state.open_collection(collection, &path);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

/// Save to the remembered catalog path, asking for one the first time.
pub fn save_catalog(state: &mut AppState) {
    let Some(engine) = state.engine.as_mut() else {
        return;
    };
    if engine.catalog_path().is_none() {
        save_catalog_dialog(state);
        return;
    }
    let result = engine.save_catalog();
    if let Some(path) = state.report(result) {
        state.status_message = Some(format!("Saved picks to {}", path.display()));
    }
}

pub fn save_catalog_dialog(state: &mut AppState) {
    let Some(engine) = state.engine.as_mut() else {
        return;
    };
    let file = rfd::FileDialog::new()
        .set_title("Save picks")
        .add_filter("QuakeML", &["xml"])
        .set_file_name("picks.xml")
        .save_file();
    if let Some(path) = file {
        let result = engine.save_catalog_as(path);
        if let Some(path) = state.report(result) {
            state.status_message = Some(format!("Saved picks to {}", path.display()));
        }
    }
}

pub fn load_catalog_dialog(state: &mut AppState) {
    let Some(engine) = state.engine.as_mut() else {
        return;
    };
    let file = rfd::FileDialog::new()
        .set_title("Load picks")
        .add_filter("QuakeML", &["xml"])
        .pick_file();
    if let Some(path) = file {
        let result = engine.load_catalog(&path);
        if let Some(count) = state.report(result) {
            state.status_message = Some(format!("Loaded {count} picks"));
        }
    }
}

/// Ask for a PNG path and request a screenshot; the image is written when
/// it arrives (see `PickMeApp::handle_screenshot`).
pub fn save_plot_dialog(ctx: &egui::Context, state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Save plot image")
        .add_filter("PNG", &["png"])
        .set_file_name("plot.png")
        .save_file();
    if let Some(path) = file {
        state.pending_screenshot = Some(path.with_extension("png"));
        ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(Default::default()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controls_help_names_files() {
        let config = AppConfig::default();
        let help = controls_help(&config);
        assert!(help.contains("q + click: P pick"));
        assert!(help.contains(".pick_filters.json"));
        assert!(help.contains(".picks-backup.xml"));
    }
}
