//! Log panel with scrolling support.
//!
//! Worker output, diagnostics and controller messages are appended as lines.
//! The view follows the tail until the operator scrolls up, and shows a
//! scrollbar once the content outgrows the panel.

use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Scrollbar;
use ratatui::widgets::ScrollbarOrientation;
use ratatui::widgets::ScrollbarState;
use ratatui::Frame;

/// Oldest lines are dropped past this many.
pub const MAX_LINES: usize = 2000;

/// Origin of a log line, used for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Output,
    Error,
    Info,
    Success,
}

impl LogKind {
    fn style(self) -> Style {
        match self {
            LogKind::Output => Style::default(),
            LogKind::Error => Style::default().fg(Color::Red),
            LogKind::Info => Style::default().fg(Color::Cyan),
            LogKind::Success => Style::default().fg(Color::Green),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub kind: LogKind,
    pub text: String,
}

pub struct LogView {
    lines: Vec<LogLine>,
    /// Current scroll offset (number of lines scrolled from the top).
    pub scroll_offset: usize,
    /// Keep the newest line in view as lines arrive.
    pub follow: bool,
    viewport: usize,
}

impl LogView {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            scroll_offset: 0,
            follow: true,
            viewport: 0,
        }
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    /// Appends `text`, one entry per line. Blank lines are dropped.
    pub fn push(&mut self, kind: LogKind, text: &str) {
        for line in text.lines() {
            let line = line.trim_end();
            if line.trim().is_empty() {
                continue;
            }
            self.lines.push(LogLine {
                kind,
                text: line.to_string(),
            });
        }
        if self.lines.len() > MAX_LINES {
            let excess = self.lines.len() - MAX_LINES;
            self.lines.drain(..excess);
            self.scroll_offset = self.scroll_offset.saturating_sub(excess);
        }
        if self.follow {
            self.scroll_offset = self.max_offset();
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.scroll_offset = 0;
        self.follow = true;
    }

    fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.viewport.max(1))
    }

    /// Render the log panel. Records the viewport height for paging.
    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.viewport = area.height.saturating_sub(2) as usize;
        if self.follow {
            self.scroll_offset = self.max_offset();
        }

        let block = Block::default().borders(Borders::ALL).title("Log");
        let text: Vec<Line> = if self.lines.is_empty() {
            vec![Line::from("No output yet.")]
        } else {
            self.lines
                .iter()
                .map(|line| Line::styled(line.text.clone(), line.kind.style()))
                .collect()
        };

        let paragraph = Paragraph::new(text)
            .block(block)
            .scroll((self.scroll_offset as u16, 0));
        frame.render_widget(paragraph, area);

        let total_lines = self.lines.len();
        if total_lines > self.viewport {
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(total_lines)
                .viewport_content_length(self.viewport)
                .position(self.scroll_offset);

            let scrollbar = Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));

            frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
        }
    }

    pub fn scroll_up(&mut self) {
        self.follow = false;
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = (self.scroll_offset + 1).min(self.max_offset());
        self.follow = self.scroll_offset == self.max_offset();
    }

    pub fn page_up(&mut self) {
        self.follow = false;
        self.scroll_offset = self.scroll_offset.saturating_sub(self.viewport.max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_offset = (self.scroll_offset + self.viewport.max(1)).min(self.max_offset());
        self.follow = self.scroll_offset == self.max_offset();
    }

    /// Jump to the newest line and resume following.
    pub fn scroll_to_bottom(&mut self) {
        self.follow = true;
        self.scroll_offset = self.max_offset();
    }
}

impl Default for LogView {
    fn default() -> Self {
        Self::new()
    }
}
