//! Launch form widget.
//!
//! Holds the text the operator typed for every [`LaunchConfiguration`] field,
//! tracks which field has focus, and renders as a bordered list of
//! `label: value` rows. API keys are masked.

use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use vfm_protocol::FormError;
use vfm_protocol::LaunchConfiguration;

/// Form fields in display and tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    LastfmKey,
    YoutubeKey,
    Username,
    Year,
    Month,
    NumSongs,
    ManualYoutube,
    Codec,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::LastfmKey,
        Field::YoutubeKey,
        Field::Username,
        Field::Year,
        Field::Month,
        Field::NumSongs,
        Field::ManualYoutube,
        Field::Codec,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::LastfmKey => "Last.fm API key",
            Field::YoutubeKey => "YouTube API key",
            Field::Username => "Username",
            Field::Year => "Year",
            Field::Month => "Month",
            Field::NumSongs => "Number of songs",
            Field::ManualYoutube => "Manual YouTube URLs",
            Field::Codec => "Codec",
        }
    }

    fn is_secret(self) -> bool {
        matches!(self, Field::LastfmKey | Field::YoutubeKey)
    }
}

/// Launch form state.
#[derive(Debug, Clone)]
pub struct LaunchForm {
    lastfm_api_key: String,
    youtube_api_key: String,
    username: String,
    year: String,
    month: String,
    num_songs: String,
    allow_manual_youtube: bool,
    codec: String,
    focus: usize,
}

impl LaunchForm {
    /// Empty form with the codec prefilled.
    pub fn new(default_codec: &str) -> Self {
        Self {
            lastfm_api_key: String::new(),
            youtube_api_key: String::new(),
            username: String::new(),
            year: String::new(),
            month: String::new(),
            num_songs: "10".to_string(),
            allow_manual_youtube: false,
            codec: default_codec.to_string(),
            focus: 0,
        }
    }

    pub fn focused(&self) -> Field {
        Field::ALL[self.focus]
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % Field::ALL.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + Field::ALL.len() - 1) % Field::ALL.len();
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::LastfmKey => Some(&mut self.lastfm_api_key),
            Field::YoutubeKey => Some(&mut self.youtube_api_key),
            Field::Username => Some(&mut self.username),
            Field::Year => Some(&mut self.year),
            Field::Month => Some(&mut self.month),
            Field::NumSongs => Some(&mut self.num_songs),
            Field::ManualYoutube => None,
            Field::Codec => Some(&mut self.codec),
        }
    }

    /// Types into the focused field. Space toggles the checkbox field; the
    /// song count only takes digits.
    pub fn insert_char(&mut self, c: char) {
        let field = self.focused();
        if field == Field::ManualYoutube {
            if c == ' ' {
                self.allow_manual_youtube = !self.allow_manual_youtube;
            }
            return;
        }
        if field == Field::NumSongs && !c.is_ascii_digit() {
            return;
        }
        if let Some(text) = self.text_mut(field) {
            text.push(c);
        }
    }

    pub fn delete_char(&mut self) {
        let field = self.focused();
        if let Some(text) = self.text_mut(field) {
            text.pop();
        }
    }

    /// Replaces the YouTube key after the operator supplied a fresh one.
    pub fn set_youtube_api_key(&mut self, key: &str) {
        self.youtube_api_key = key.to_string();
    }

    /// Builds and validates the launch configuration.
    pub fn to_config(&self) -> Result<LaunchConfiguration, FormError> {
        let codec = self.codec.trim();
        let config = LaunchConfiguration {
            lastfm_api_key: self.lastfm_api_key.trim().to_string(),
            youtube_api_key: self.youtube_api_key.trim().to_string(),
            username: self.username.trim().to_string(),
            year: self.year.trim().to_string(),
            month: self.month.trim().to_string(),
            num_songs: self.num_songs.trim().parse().unwrap_or(0),
            allow_manual_youtube: self.allow_manual_youtube,
            codec: (!codec.is_empty()).then(|| codec.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    fn display_value(&self, field: Field) -> String {
        let value = match field {
            Field::LastfmKey => &self.lastfm_api_key,
            Field::YoutubeKey => &self.youtube_api_key,
            Field::Username => &self.username,
            Field::Year => &self.year,
            Field::Month => &self.month,
            Field::NumSongs => &self.num_songs,
            Field::ManualYoutube => {
                return if self.allow_manual_youtube { "[x]" } else { "[ ]" }.to_string();
            }
            Field::Codec => &self.codec,
        };
        if field.is_secret() {
            "•".repeat(value.chars().count())
        } else {
            value.clone()
        }
    }

    /// Renders the form. While a run is active the form is dimmed and no
    /// field is highlighted.
    pub fn render(&self, frame: &mut Frame, area: Rect, locked: bool) {
        let title = if locked {
            "Launch (running)"
        } else {
            "Launch (Enter to start)"
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        let lines: Vec<Line> = Field::ALL
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let focused = !locked && i == self.focus;
                let marker = if focused { "> " } else { "  " };
                let label_style = if locked {
                    Style::default().fg(Color::DarkGray)
                } else if focused {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(format!("{marker}{:<20}", field.label()), label_style),
                    Span::raw(self.display_value(*field)),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}
