use std::path::Path;

use anyhow::Context;
use eframe::egui::{self, ColorImage, Key};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct PickMeApp {
    pub state: AppState,
}

impl PickMeApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }

    /// Station and filter shortcuts, ignored while a text field has focus.
    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (next, previous, filter) = ctx.input(|i| {
            (
                i.key_pressed(Key::D),
                i.key_pressed(Key::S),
                i.key_pressed(Key::F),
            )
        });
        if let Some(engine) = self.state.engine.as_mut() {
            if next {
                engine.go_next();
            }
            if previous {
                engine.go_previous();
            }
        }
        if filter {
            self.state.toggle_filter();
        }
    }

    /// Write the screenshot requested from the File menu, once it arrives.
    fn handle_screenshot(&mut self, ctx: &egui::Context) {
        let image = ctx.input(|i| {
            i.events.iter().find_map(|e| match e {
                egui::Event::Screenshot { image, .. } => Some(image.clone()),
                _ => None,
            })
        });
        let (Some(image), Some(path)) = (image, self.state.pending_screenshot.take()) else {
            return;
        };
        match save_png(&path, &image) {
            Ok(()) => {
                log::info!("Saved plot image to {:?}", path);
                self.state.status_message = Some(format!("Saved plot to {}", path.display()));
            }
            Err(e) => {
                log::error!("Failed to save plot image: {e:#}");
                self.state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

fn save_png(path: &Path, shot: &ColorImage) -> anyhow::Result<()> {
    let [width, height] = shot.size;
    image::save_buffer(
        path,
        shot.as_raw(),
        width as u32,
        height as u32,
        image::ColorType::Rgba8,
    )
    .with_context(|| format!("writing {}", path.display()))
}

impl eframe::App for PickMeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);
        self.handle_screenshot(ctx);

        // ---- Top panel: menu bar, station and filter controls ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Bottom panel: status line ----
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            panels::status_bar(ui, &self.state);
        });

        // ---- Left side panel: presets and picks ----
        egui::SidePanel::left("pick_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: one plot per channel ----
        let request = egui::CentralPanel::default()
            .show(ctx, |ui| {
                plot::station_plot(ui, self.state.engine.as_ref(), &self.state.custom_phase)
            })
            .inner;
        if let Some(request) = request {
            self.state.place_pick(request.x, &request.phase, &request.channel);
        }

        if ctx.input(|i| i.viewport().close_requested()) {
            self.state.shutdown();
        }
    }
}
