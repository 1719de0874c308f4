//! Progress bar and status line.

use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Gauge;
use ratatui::Frame;
use vfm_protocol::ProgressState;
use vfm_protocol::Stage;

fn stage_color(stage: Stage) -> Color {
    match stage {
        Stage::Init | Stage::Fetching => Color::Blue,
        Stage::Processing => Color::Cyan,
        Stage::Merging => Color::Magenta,
        Stage::Complete => Color::Green,
    }
}

/// Renders `progress` as a gauge labelled with its status text.
pub fn render(frame: &mut Frame, area: Rect, progress: &ProgressState) {
    let ratio = (progress.percent / 100.0).clamp(0.0, 1.0);
    let label = if progress.status_text.is_empty() {
        format!("{:.0}%", progress.percent)
    } else {
        format!("{:.0}% {}", progress.percent, progress.status_text)
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(stage_color(progress.stage)))
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, area);
}
