use eframe::egui::Color32;

use crate::picks::PhaseClass;

// ---------------------------------------------------------------------------
// Pick colours
// ---------------------------------------------------------------------------

/// Line colour of a pick marker.
pub fn phase_color(class: PhaseClass) -> Color32 {
    match class {
        PhaseClass::P => Color32::from_rgb(0x2c, 0xa0, 0x2c),
        PhaseClass::S => Color32::from_rgb(0xd6, 0x27, 0x28),
        PhaseClass::Other => Color32::from_rgb(0x1f, 0x77, 0xb4),
    }
}

/// Colour of the waveform traces.
pub const TRACE_COLOR: Color32 = Color32::from_rgb(0x20, 0x20, 0x20);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_colors_are_distinct() {
        let colors = [
            phase_color(PhaseClass::P),
            phase_color(PhaseClass::S),
            phase_color(PhaseClass::Other),
        ];
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert_ne!(colors[0], colors[2]);
        assert!(colors[0].g() > colors[0].r());
        assert!(colors[1].r() > colors[1].g());
        assert!(colors[2].b() > colors[2].r());
    }
}
