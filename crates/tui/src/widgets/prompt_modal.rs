//! Modal dialog for prompts that need the operator.
//!
//! One modal per [`PromptRequest`]. Key handling turns the operator's input
//! into the [`Op`] that answers the worker; the caller closes the modal when
//! an action other than [`ModalAction::None`] comes back.

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Clear;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Wrap;
use ratatui::Frame;
use vfm_protocol::Op;
use vfm_protocol::PromptAnswer;
use vfm_protocol::PromptRequest;

/// Result of a key press inside the modal.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalAction {
    /// Keep the modal open.
    None,
    /// Close without answering the worker.
    Dismiss,
    /// Send `Op` and close.
    Submit(Op),
}

/// Upper bound on listed songs when the worker announced only a range.
const MAX_SONG_CHOICES: u32 = 100;

#[derive(Debug, Clone)]
pub struct PromptModal {
    request: PromptRequest,
    input: String,
    selected: usize,
    /// Song number and label for a replacement prompt.
    choices: Vec<(u32, String)>,
}

fn answer(answer: PromptAnswer) -> ModalAction {
    ModalAction::Submit(Op::Answer { answer })
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Entries keep the number the worker printed (`"7. Artist - Title"`), so
/// gaps in its numbering are answered correctly.
fn song_choices(songs: &[String], max: u32) -> Vec<(u32, String)> {
    if songs.is_empty() {
        return (1..=max.min(MAX_SONG_CHOICES))
            .map(|n| (n, format!("{n}.")))
            .collect();
    }
    songs
        .iter()
        .enumerate()
        .map(|(i, song)| {
            let number = song
                .split('.')
                .next()
                .and_then(|n| n.trim().parse::<u32>().ok())
                .unwrap_or(i as u32 + 1);
            (number, song.clone())
        })
        .collect()
}

impl PromptModal {
    pub fn new(request: PromptRequest) -> Self {
        let choices = match &request {
            PromptRequest::SongReplacement { songs, max } => song_choices(songs, *max),
            _ => Vec::new(),
        };
        Self {
            request,
            input: String::new(),
            selected: 0,
            choices,
        }
    }

    pub fn request(&self) -> &PromptRequest {
        &self.request
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    fn takes_text(&self) -> bool {
        matches!(
            self.request,
            PromptRequest::ManualUrl { .. }
                | PromptRequest::ReplacementUrl { .. }
                | PromptRequest::NewApiKey
        )
    }

    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> ModalAction {
        if self.takes_text() {
            match key_event.code {
                KeyCode::Char(c) => {
                    self.input.push(c);
                    return ModalAction::None;
                }
                KeyCode::Backspace => {
                    self.input.pop();
                    return ModalAction::None;
                }
                _ => {}
            }
        }

        match &self.request {
            PromptRequest::ManualUrl { .. } => match key_event.code {
                // Enter needs a URL; Esc skips the song.
                KeyCode::Enter => match non_empty(&self.input) {
                    Some(url) => answer(PromptAnswer::ManualUrl(Some(url))),
                    None => ModalAction::None,
                },
                KeyCode::Esc => answer(PromptAnswer::ManualUrl(None)),
                _ => ModalAction::None,
            },
            PromptRequest::ReplaceVideos => match key_event.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => answer(PromptAnswer::ReplaceVideos(true)),
                KeyCode::Char('n') | KeyCode::Char('N') => {
                    answer(PromptAnswer::ReplaceVideos(false))
                }
                _ => ModalAction::None,
            },
            PromptRequest::Overwrite { .. } => match key_event.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => answer(PromptAnswer::Overwrite(true)),
                KeyCode::Char('n') | KeyCode::Char('N') => answer(PromptAnswer::Overwrite(false)),
                _ => ModalAction::None,
            },
            PromptRequest::SongReplacement { .. } => match key_event.code {
                KeyCode::Up => {
                    self.selected = self.selected.saturating_sub(1);
                    ModalAction::None
                }
                KeyCode::Down => {
                    if self.selected + 1 < self.choices.len() {
                        self.selected += 1;
                    }
                    ModalAction::None
                }
                KeyCode::Enter => match self.choices.get(self.selected) {
                    Some((number, _)) => answer(PromptAnswer::SongNumber(Some(*number))),
                    None => ModalAction::None,
                },
                // The worker treats 0 as "cancel".
                KeyCode::Esc => answer(PromptAnswer::SongNumber(None)),
                _ => ModalAction::None,
            },
            PromptRequest::ReplacementUrl { .. } => match key_event.code {
                KeyCode::Enter => match non_empty(&self.input) {
                    Some(url) => answer(PromptAnswer::ReplacementUrl(Some(url))),
                    None => ModalAction::None,
                },
                KeyCode::Esc => answer(PromptAnswer::ReplacementUrl(None)),
                _ => ModalAction::None,
            },
            PromptRequest::NewApiKey => match key_event.code {
                KeyCode::Enter => match non_empty(&self.input) {
                    Some(key) => ModalAction::Submit(Op::ProvideApiKey { key }),
                    None => ModalAction::None,
                },
                // The worker keeps waiting; stopping the run is up to the operator.
                KeyCode::Esc => ModalAction::Dismiss,
                _ => ModalAction::None,
            },
        }
    }

    fn title(&self) -> &'static str {
        match self.request {
            PromptRequest::ManualUrl { .. } => "YouTube URL needed",
            PromptRequest::ReplaceVideos => "Replace videos?",
            PromptRequest::Overwrite { .. } => "File exists",
            PromptRequest::SongReplacement { .. } => "Replace which song?",
            PromptRequest::ReplacementUrl { .. } => "Replacement URL",
            PromptRequest::NewApiKey => "YouTube API quota exceeded",
        }
    }

    fn body(&self) -> Vec<Line<'static>> {
        let hint = Style::default().fg(Color::DarkGray);
        let mut lines: Vec<Line<'static>> = Vec::new();
        match &self.request {
            PromptRequest::ManualUrl { prompt } => {
                lines.push(Line::from(prompt.clone()));
                lines.push(Line::from(format!("> {}", self.input)));
                lines.push(Line::styled("Enter submit · Esc skip", hint));
            }
            PromptRequest::ReplaceVideos => {
                lines.push(Line::from("Do you need to replace any videos?"));
                lines.push(Line::styled("y yes · n no", hint));
            }
            PromptRequest::Overwrite { filename } => {
                let name = filename.as_deref().unwrap_or("The output file");
                lines.push(Line::from(format!("{name} already exists. Overwrite it?")));
                lines.push(Line::styled("y overwrite · n keep", hint));
            }
            PromptRequest::SongReplacement { .. } => {
                for (i, (_, label)) in self.choices.iter().enumerate() {
                    lines.push(self.song_line(i, label.clone()));
                }
                lines.push(Line::styled("↑/↓ select · Enter replace · Esc cancel", hint));
            }
            PromptRequest::ReplacementUrl { song } => {
                if let Some(song) = song {
                    lines.push(Line::from(format!("Replacing: {song}")));
                }
                lines.push(Line::from("Enter the correct YouTube URL:"));
                lines.push(Line::from(format!("> {}", self.input)));
                lines.push(Line::styled("Enter submit · Esc cancel", hint));
            }
            PromptRequest::NewApiKey => {
                lines.push(Line::from("Enter a new YouTube API key:"));
                lines.push(Line::from(format!(
                    "> {}",
                    "•".repeat(self.input.chars().count())
                )));
                lines.push(Line::styled("Enter submit · Esc close", hint));
            }
        }
        lines
    }

    fn song_line(&self, index: usize, text: String) -> Line<'static> {
        if index == self.selected {
            Line::styled(
                format!("> {text}"),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Line::from(format!("  {text}"))
        }
    }

    /// Renders the modal centred over `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let body = self.body();
        let height = (body.len() as u16 + 2).min(area.height);
        let popup = centered(area, 70, height);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title())
            .border_style(Style::default().fg(Color::Yellow));
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(body).block(block).wrap(Wrap { trim: false }),
            popup,
        );
    }
}

fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
