use eframe::egui::{self, Align2, Key, RichText, Ui};
use egui_plot::{Line, Plot, PlotPoint, PlotPoints, Text, VLine};

use crate::color::{phase_color, TRACE_COLOR};
use crate::engine::{AnnotationEngine, PickMarker};

/// A click on a channel plot with a phase key held.
#[derive(Debug, Clone, PartialEq)]
pub struct PickRequest {
    /// Sample position of the click.
    pub x: f64,
    pub channel: String,
    pub phase: String,
}

/// Phase bound to the pick key currently held, if any.
fn held_phase(ui: &Ui, custom_phase: &str) -> Option<String> {
    ui.input(|i| {
        if i.key_down(Key::Q) {
            Some("P".to_string())
        } else if i.key_down(Key::W) {
            Some("S".to_string())
        } else if i.key_down(Key::E) {
            Some(custom_phase.to_string())
        } else {
            None
        }
    })
}

// ---------------------------------------------------------------------------
// Station plot (central panel)
// ---------------------------------------------------------------------------

/// Render one plot per channel, stacked, with shared x axis.
///
/// Returns the pick requested by a click, to be applied by the caller.
pub fn station_plot(
    ui: &mut Ui,
    engine: Option<&AnnotationEngine>,
    custom_phase: &str,
) -> Option<PickRequest> {
    let Some(engine) = engine else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a waveform file to start picking  (File → Open…)");
        });
        return None;
    };

    let view = engine.view();
    let markers = engine.current_picks();
    let channels: Vec<_> = view.channels().collect();
    let n = channels.len().max(1) as f32;
    let spacing = ui.spacing().item_spacing.y;
    let height = ((ui.available_height() - spacing * (n - 1.0)) / n).max(60.0);
    let link = egui::Id::new("station_axis").with(view.station());

    let mut request = None;
    for (i, ch) in channels.iter().enumerate() {
        let last = i + 1 == channels.len();
        let mut plot = Plot::new(("channel_plot", ch.channel))
            .height(height)
            .link_axis(link, [true, false])
            .link_cursor(link, [true, false])
            .y_axis_label(ch.channel)
            .show_axes([last, true])
            .allow_boxed_zoom(true)
            .allow_double_click_reset(true);
        if last {
            plot = plot.x_axis_label(format!(
                "Sample ({} to {} UTC, delta {} s)",
                ch.starttime.format("%Y-%m-%d %H:%M:%S%.3f"),
                ch.endtime.format("%H:%M:%S%.3f"),
                ch.delta
            ));
        }

        let max = ch.samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let label_y = if max.is_finite() { max } else { 0.0 };

        let response = plot.show(ui, |plot_ui| {
            let points: PlotPoints = ch
                .samples
                .iter()
                .enumerate()
                .map(|(j, &v)| [j as f64, v])
                .collect();
            plot_ui.line(Line::new(points).color(TRACE_COLOR).width(1.0));

            for marker in &markers {
                draw_marker(plot_ui, marker, label_y);
            }

            plot_ui.pointer_coordinate()
        });

        if response.response.clicked() {
            if let (Some(pos), Some(phase)) = (response.inner, held_phase(ui, custom_phase)) {
                request = Some(PickRequest {
                    x: pos.x,
                    channel: ch.channel.to_string(),
                    phase,
                });
            }
        }
    }
    request
}

fn draw_marker(plot_ui: &mut egui_plot::PlotUi, marker: &PickMarker<'_>, label_y: f64) {
    let color = phase_color(marker.class);
    plot_ui.vline(VLine::new(marker.x).color(color).width(2.0));
    plot_ui.text(
        Text::new(
            PlotPoint::new(marker.x, label_y),
            RichText::new(&marker.pick.phase_hint).strong(),
        )
        .color(color)
        .anchor(Align2::LEFT_TOP),
    );
}
