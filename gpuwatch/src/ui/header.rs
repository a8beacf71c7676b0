//! Top header with device name and connection status.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders},
};

use crate::events::ConnState;
use crate::types::{Sample, UNKNOWN_NAME};
use crate::ui::theme::{CONNECTING, DISCONNECTED, MUTED, UTILIZATION};

pub struct HeaderInfo<'a> {
    pub endpoint: &'a str,
    pub state: ConnState,
    pub sample: &'a Sample,
    pub rejected: u64,
    /// Extra status text (last close reason, retry countdown).
    pub detail: Option<&'a str>,
}

pub fn draw_header(f: &mut ratatui::Frame<'_>, area: Rect, h: &HeaderInfo<'_>) {
    let (status, color) = match h.state {
        ConnState::Connected => ("● connected", UTILIZATION),
        ConnState::Connecting => ("◌ connecting", CONNECTING),
        ConnState::Disconnected => ("✖ disconnected", DISCONNECTED),
        ConnState::Closed => ("✖ closed", DISCONNECTED),
    };
    let device = if h.sample.name == UNKNOWN_NAME {
        "waiting for data".to_string()
    } else {
        h.sample.name.clone()
    };
    let mut spans = vec![
        Span::styled("gpuwatch", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" | {} | {device} | ", h.endpoint)),
        Span::styled(status, Style::default().fg(color).add_modifier(Modifier::BOLD)),
    ];
    if let Some(detail) = h.detail {
        spans.push(Span::styled(format!(" ({detail})"), Style::default().fg(MUTED)));
    }
    if h.rejected > 0 {
        spans.push(Span::styled(
            format!(" | dropped frames: {}", h.rejected),
            Style::default().fg(CONNECTING),
        ));
    }
    spans.push(Span::styled("  (press 'q' to quit)", Style::default().fg(MUTED)));
    f.render_widget(
        Block::default()
            .title(Line::from(spans))
            .borders(Borders::BOTTOM),
        area,
    );
}
