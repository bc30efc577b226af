use eframe::egui::Color32;
use palette::Srgb;

// ---------------------------------------------------------------------------
// Chart colours: CSS colour names from the chart spec → Color32
// ---------------------------------------------------------------------------

/// Resolve a CSS colour name (`"darkblue"`, `"purple"`, ...). Unknown names
/// render gray.
pub fn css_color(name: &str) -> Color32 {
    palette::named::from_str(&name.to_ascii_lowercase())
        .map(|rgb: Srgb<u8>| Color32::from_rgb(rgb.red, rgb.green, rgb.blue))
        .unwrap_or(Color32::GRAY)
}

/// Apply a trace opacity in `[0, 1]`.
pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

/// Colour of a trace as drawn: named colour at the trace's opacity.
pub fn trace_color(name: &str, opacity: f32) -> Color32 {
    with_opacity(css_color(name), opacity)
}
