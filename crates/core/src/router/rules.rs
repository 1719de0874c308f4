//! Ordered prompt rule table. The first rule whose matcher accepts a chunk
//! decides what happens to it.

use super::patterns;
use crate::demux::StreamKind;
use vfm_protocol::LaunchConfiguration;
use vfm_protocol::PromptKind;
use vfm_protocol::PromptRequest;

/// What a matched rule does.
pub(crate) enum Response {
    /// Reply on stdin from the launch configuration. The returned line has
    /// no trailing newline.
    Auto(fn(&LaunchConfiguration) -> String),
    /// Ask the operator. Receives the chunk text and the primary transcript
    /// (chunk included).
    Operator(fn(&str, &str) -> PromptRequest),
}

pub(crate) struct PromptRule {
    pub kind: PromptKind,
    pub matches: fn(&str) -> bool,
    /// Also evaluated against stderr chunks.
    pub diagnostic: bool,
    pub response: Response,
}

impl PromptRule {
    pub fn applies_to(&self, stream: StreamKind) -> bool {
        match stream {
            StreamKind::Primary => true,
            StreamKind::Diagnostic => self.diagnostic,
        }
    }
}

fn has_username(text: &str) -> bool {
    text.contains(patterns::USERNAME)
}

fn has_year(text: &str) -> bool {
    text.contains(patterns::YEAR)
}

fn has_month(text: &str) -> bool {
    text.contains(patterns::MONTH)
}

fn has_song_count(text: &str) -> bool {
    text.contains(patterns::SONG_COUNT)
}

fn has_manual_preference(text: &str) -> bool {
    text.contains(patterns::MANUAL_URL_PREFERENCE)
}

fn has_manual_url(text: &str) -> bool {
    text.contains(patterns::MANUAL_URL)
}

fn has_replace_videos(text: &str) -> bool {
    text.contains(patterns::REPLACE_VIDEOS)
}

fn has_replacement_url(text: &str) -> bool {
    text.contains(patterns::REPLACEMENT_URL)
}

fn answer_username(config: &LaunchConfiguration) -> String {
    config.username.clone()
}

fn answer_year(config: &LaunchConfiguration) -> String {
    config.year.clone()
}

fn answer_month(config: &LaunchConfiguration) -> String {
    config.month.clone()
}

fn answer_song_count(config: &LaunchConfiguration) -> String {
    config.num_songs.to_string()
}

fn answer_manual_preference(config: &LaunchConfiguration) -> String {
    if config.allow_manual_youtube { "yes" } else { "no" }.to_string()
}

fn ask_manual_url(text: &str, _transcript: &str) -> PromptRequest {
    PromptRequest::ManualUrl {
        prompt: text.trim().to_string(),
    }
}

fn ask_replace_videos(_text: &str, _transcript: &str) -> PromptRequest {
    PromptRequest::ReplaceVideos
}

fn ask_overwrite(text: &str, _transcript: &str) -> PromptRequest {
    PromptRequest::Overwrite {
        filename: patterns::overwrite_filename(text),
    }
}

fn ask_song_replacement(text: &str, _transcript: &str) -> PromptRequest {
    let (songs, max) = patterns::song_list(text).unwrap_or_default();
    PromptRequest::SongReplacement { songs, max }
}

fn ask_replacement_url(_text: &str, transcript: &str) -> PromptRequest {
    PromptRequest::ReplacementUrl {
        song: patterns::last_replacing(transcript),
    }
}

fn ask_new_api_key(_text: &str, _transcript: &str) -> PromptRequest {
    PromptRequest::NewApiKey
}

pub(crate) static RULES: [PromptRule; 11] = [
    PromptRule {
        kind: PromptKind::Username,
        matches: has_username,
        diagnostic: false,
        response: Response::Auto(answer_username),
    },
    PromptRule {
        kind: PromptKind::Year,
        matches: has_year,
        diagnostic: false,
        response: Response::Auto(answer_year),
    },
    PromptRule {
        kind: PromptKind::Month,
        matches: has_month,
        diagnostic: false,
        response: Response::Auto(answer_month),
    },
    PromptRule {
        kind: PromptKind::SongCount,
        matches: has_song_count,
        diagnostic: false,
        response: Response::Auto(answer_song_count),
    },
    PromptRule {
        kind: PromptKind::ManualUrlPreference,
        matches: has_manual_preference,
        diagnostic: false,
        response: Response::Auto(answer_manual_preference),
    },
    PromptRule {
        kind: PromptKind::ManualUrl,
        matches: has_manual_url,
        diagnostic: false,
        response: Response::Operator(ask_manual_url),
    },
    PromptRule {
        kind: PromptKind::ReplaceVideos,
        matches: has_replace_videos,
        diagnostic: false,
        response: Response::Operator(ask_replace_videos),
    },
    PromptRule {
        kind: PromptKind::Overwrite,
        matches: patterns::is_overwrite_prompt,
        diagnostic: true,
        response: Response::Operator(ask_overwrite),
    },
    PromptRule {
        kind: PromptKind::SongReplacement,
        matches: patterns::is_song_list,
        diagnostic: false,
        response: Response::Operator(ask_song_replacement),
    },
    PromptRule {
        kind: PromptKind::ReplacementUrl,
        matches: has_replacement_url,
        diagnostic: false,
        response: Response::Operator(ask_replacement_url),
    },
    PromptRule {
        kind: PromptKind::NewApiKey,
        matches: patterns::is_new_api_key_prompt,
        diagnostic: false,
        response: Response::Operator(ask_new_api_key),
    },
];

pub(crate) fn first_match(stream: StreamKind, text: &str) -> Option<&'static PromptRule> {
    RULES
        .iter()
        .find(|rule| rule.applies_to(stream) && (rule.matches)(text))
}
