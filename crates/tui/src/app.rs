//! TUI application state and event loop.
//!
//! This module defines the main `App` struct that manages the TUI state
//! and the event loop using `tokio::select!`.

use anyhow::Result;
use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Wrap;
use ratatui::Frame;
use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio_stream::StreamExt;
use uuid::Uuid;
use vfm_protocol::Event;
use vfm_protocol::Op;
use vfm_protocol::ProgressState;

use crate::event_handler;
use crate::tui::Tui;
use crate::tui::TuiEvent;
use crate::widgets::progress_gauge;
use crate::widgets::LaunchForm;
use crate::widgets::LogKind;
use crate::widgets::LogView;
use crate::widgets::PromptModal;

const HELP: &str =
    "Tab/↑↓ field · Enter start · Ctrl+X stop · Ctrl+K clear cache · Ctrl+L log · PgUp/PgDn scroll · Ctrl+Q quit";

/// Main TUI application state.
pub struct App {
    pub form: LaunchForm,
    pub log: LogView,
    pub progress: ProgressState,
    /// Prompt waiting for the operator, if any.
    pub modal: Option<PromptModal>,
    pub run_id: Option<Uuid>,
    /// A run is active or being launched; the form is locked.
    pub running: bool,
    pub show_log: bool,
    /// Latest one-line status and its colour.
    pub status: (LogKind, String),
    /// Channel to send operations to the core.
    pub op_tx: UnboundedSender<Op>,
    /// Channel to receive events from the core.
    pub event_rx: Receiver<Event>,
    /// Flag to indicate if the application should exit.
    pub should_exit: bool,
}

impl App {
    /// Create a new App with communication channels.
    pub fn new(op_tx: UnboundedSender<Op>, event_rx: Receiver<Event>, default_codec: &str) -> Self {
        Self {
            form: LaunchForm::new(default_codec),
            log: LogView::new(),
            progress: ProgressState::default(),
            modal: None,
            run_id: None,
            running: false,
            show_log: true,
            status: (LogKind::Info, "Idle".to_string()),
            op_tx,
            event_rx,
            should_exit: false,
        }
    }

    /// Main event loop.
    ///
    /// Uses `tokio::select!` to handle keyboard input and core events concurrently.
    pub async fn run(&mut self, tui: &mut Tui) -> Result<()> {
        let mut tui_events = tui.event_stream();

        tui.frame_requester().schedule_frame();

        while !self.should_exit {
            select! {
                Some(event) = self.event_rx.recv() => {
                    event_handler::handle_core_event(self, event);
                    tui.frame_requester().schedule_frame();
                }
                Some(tui_event) = tui_events.next() => {
                    self.handle_tui_event(tui, tui_event)?;
                }
                else => break,
            }
        }

        Ok(())
    }

    /// Handle TUI events (keyboard input, paste, draw).
    fn handle_tui_event(&mut self, tui: &mut Tui, event: TuiEvent) -> Result<()> {
        match event {
            TuiEvent::Key(key_event) => {
                self.should_exit = event_handler::handle_keyboard_event(self, key_event);
                tui.frame_requester().schedule_frame();
            }
            TuiEvent::Paste(text) => {
                event_handler::handle_paste(self, &text);
                tui.frame_requester().schedule_frame();
            }
            TuiEvent::Draw => {
                tui.draw(|frame| {
                    self.render(frame);
                })?;
            }
        }
        Ok(())
    }

    /// Render the TUI.
    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let constraints = if self.show_log {
            vec![
                Constraint::Length(10),
                Constraint::Min(3),
                Constraint::Length(1),
            ]
        } else {
            vec![
                Constraint::Length(10),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[0]);

        self.form.render(frame, top[0], self.running);
        self.render_run_panel(frame, top[1]);
        if self.show_log {
            self.log.render(frame, chunks[1]);
        }
        frame.render_widget(
            Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
            chunks[2],
        );

        if let Some(modal) = &self.modal {
            modal.render(frame, area);
        }
    }

    /// Progress gauge above the status line.
    fn render_run_panel(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        progress_gauge::render(frame, chunks[0], &self.progress);

        let (kind, text) = &self.status;
        let color = match kind {
            LogKind::Error => Color::Red,
            LogKind::Success => Color::Green,
            LogKind::Output | LogKind::Info => Color::Yellow,
        };
        let status = Paragraph::new(text.as_str())
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: true });
        frame.render_widget(status, chunks[1]);
    }
}
