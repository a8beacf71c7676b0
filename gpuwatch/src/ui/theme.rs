//! Shared UI theme constants.

use ratatui::style::Color;

pub const MEMORY: Color = Color::LightMagenta;
pub const UTILIZATION: Color = Color::Green;
pub const TEMPERATURE: Color = Color::Rgb(255, 140, 60);
pub const MUTED: Color = Color::Gray;
pub const DISCONNECTED: Color = Color::Red;
pub const CONNECTING: Color = Color::Yellow;

/// Gauge color for a temperature reading.
pub fn temp_color(c: f64) -> Color {
    if c < 60.0 {
        Color::Green
    } else if c < 80.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}
