//! Time-series line charts over the sliding window.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
};

use crate::history::WindowSeries;
use crate::ui::theme::{MEMORY, MUTED, TEMPERATURE, UTILIZATION};
use crate::ui::util::{x_bounds, y_bounds};

/// Memory, utilization and temperature stacked top to bottom.
pub fn draw_charts(f: &mut ratatui::Frame<'_>, area: Rect, series: &WindowSeries, total_gb: f64) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    draw_line_chart(
        f,
        rows[0],
        "Memory used (GB)",
        series,
        &series.memory_gb,
        y_bounds(&series.memory_gb, total_gb.max(1.0)),
        MEMORY,
    );
    draw_line_chart(
        f,
        rows[1],
        "Utilization (%)",
        series,
        &series.utilization_pct,
        [0.0, 100.0],
        UTILIZATION,
    );
    draw_line_chart(
        f,
        rows[2],
        "Temperature (°C)",
        series,
        &series.temperature_c,
        y_bounds(&series.temperature_c, 100.0),
        TEMPERATURE,
    );
}

fn draw_line_chart(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    title: &str,
    series: &WindowSeries,
    values: &[f64],
    y: [f64; 2],
    color: Color,
) {
    let now = values.last().copied();
    let title = match now {
        Some(v) => format!("{title} (now: {v:.1})"),
        None => title.to_string(),
    };
    let data = series.pairs(values);
    let x = x_bounds(&series.keys);

    // First/last labels only; the window is short enough that more would crowd.
    let first = series.labels.first().cloned().unwrap_or_default();
    let last = series.labels.last().cloned().unwrap_or_default();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&data);
    let chart = Chart::new(vec![dataset])
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(MUTED))
                .bounds(x)
                .labels(vec![Span::raw(first), Span::raw(last)]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(MUTED))
                .bounds(y)
                .labels(vec![
                    Span::raw(format!("{:.0}", y[0])),
                    Span::raw(format!("{:.0}", y[1])),
                ]),
        );
    f.render_widget(chart, area);
}
