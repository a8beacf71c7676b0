//! Instantaneous readouts for the latest sample: utilization, VRAM and
//! temperature bars plus process count and power.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::Span,
    widgets::{Block, Borders, Gauge, Paragraph},
};

use crate::types::Sample;
use crate::ui::theme::{temp_color, MEMORY, MUTED, UTILIZATION};
use crate::ui::util::truncate_middle;

// Temperature bar is drawn against this ceiling.
const TEMP_SCALE_C: f64 = 100.0;

pub fn draw_gpu(f: &mut ratatui::Frame<'_>, area: Rect, s: &Sample) {
    let title = match s.index {
        Some(i) => format!("GPU {i}"),
        None => "GPU".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height < 4 || inner.width < 10 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1); 4])
        .split(inner);

    // Row 1: name, processes, power
    let power = s
        .power_w
        .map(|w| format!(" | {w:.1} W"))
        .unwrap_or_default();
    let name = truncate_middle(&s.name, inner.width.saturating_sub(24) as usize);
    f.render_widget(
        Paragraph::new(Span::raw(format!(
            "{name} | procs: {}{power}",
            s.process_count
        )))
        .style(Style::default().fg(MUTED)),
        rows[0],
    );

    let util = if s.utilization_pct.is_finite() {
        s.utilization_pct
    } else {
        0.0
    };
    draw_bar(
        f,
        rows[1],
        util / 100.0,
        UTILIZATION,
        format!("util: {util:.0}%"),
    );
    draw_bar(
        f,
        rows[2],
        s.memory_ratio(),
        MEMORY,
        format!("vram: {}", s.memory_label()),
    );
    let temp = if s.temperature_c.is_finite() {
        s.temperature_c
    } else {
        0.0
    };
    draw_bar(
        f,
        rows[3],
        temp / TEMP_SCALE_C,
        temp_color(temp),
        format!("temp: {temp:.0}°C"),
    );
}

fn draw_bar(f: &mut ratatui::Frame<'_>, row: Rect, ratio: f64, color: Color, label: String) {
    // [gauge] [value]
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(8), Constraint::Length(26)])
        .split(row);
    let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
    f.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(color))
            .label(Span::raw(""))
            .ratio(ratio),
        cols[0],
    );
    f.render_widget(Paragraph::new(Span::raw(label)).fg(MUTED), cols[1]);
}
