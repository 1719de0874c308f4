//! Prompts the worker asks and the answers the operator gives.
//!
//! Prompts fall into two groups: those answered automatically from the
//! [`LaunchConfiguration`](crate::LaunchConfiguration) and those surfaced to
//! the operator as a modal. Only the latter have a [`PromptRequest`].

use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;

/// Every prompt the worker is known to ask, in matching priority order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromptKind {
    Username,
    Year,
    Month,
    SongCount,
    ManualUrlPreference,
    ManualUrl,
    ReplaceVideos,
    Overwrite,
    SongReplacement,
    ReplacementUrl,
    NewApiKey,
}

impl PromptKind {
    /// Whether this prompt is answered from the launch configuration
    /// without involving the operator.
    pub fn is_automatic(self) -> bool {
        matches!(
            self,
            PromptKind::Username
                | PromptKind::Year
                | PromptKind::Month
                | PromptKind::SongCount
                | PromptKind::ManualUrlPreference
        )
    }
}

/// A prompt that needs the operator, with whatever context was extracted
/// from the worker output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PromptRequest {
    /// A search failed and the worker wants a URL (or an empty line to skip).
    ManualUrl { prompt: String },

    /// The worker asks whether any clip should be replaced.
    ReplaceVideos,

    /// An output file exists already.
    Overwrite { filename: Option<String> },

    /// The worker lists the compilation and asks which entry to replace.
    SongReplacement { songs: Vec<String>, max: u32 },

    /// The worker wants a corrected URL for the entry being replaced.
    ReplacementUrl { song: Option<String> },

    /// The YouTube quota is exhausted and a new key is needed.
    NewApiKey,
}

impl PromptRequest {
    pub fn kind(&self) -> PromptKind {
        match self {
            PromptRequest::ManualUrl { .. } => PromptKind::ManualUrl,
            PromptRequest::ReplaceVideos => PromptKind::ReplaceVideos,
            PromptRequest::Overwrite { .. } => PromptKind::Overwrite,
            PromptRequest::SongReplacement { .. } => PromptKind::SongReplacement,
            PromptRequest::ReplacementUrl { .. } => PromptKind::ReplacementUrl,
            PromptRequest::NewApiKey => PromptKind::NewApiKey,
        }
    }
}

/// The operator's answer to a [`PromptRequest`].
///
/// `None` in the optional variants means the operator skipped or cancelled.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PromptAnswer {
    ManualUrl(Option<String>),
    ReplaceVideos(bool),
    Overwrite(bool),
    SongNumber(Option<u32>),
    ReplacementUrl(Option<String>),
    NewApiKey(String),
}

impl PromptAnswer {
    pub fn kind(&self) -> PromptKind {
        match self {
            PromptAnswer::ManualUrl(_) => PromptKind::ManualUrl,
            PromptAnswer::ReplaceVideos(_) => PromptKind::ReplaceVideos,
            PromptAnswer::Overwrite(_) => PromptKind::Overwrite,
            PromptAnswer::SongNumber(_) => PromptKind::SongReplacement,
            PromptAnswer::ReplacementUrl(_) => PromptKind::ReplacementUrl,
            PromptAnswer::NewApiKey(_) => PromptKind::NewApiKey,
        }
    }

    /// The literal line written to the worker, without the newline.
    pub fn wire_text(&self) -> String {
        match self {
            PromptAnswer::ManualUrl(url) | PromptAnswer::ReplacementUrl(url) => {
                url.clone().unwrap_or_default()
            }
            PromptAnswer::ReplaceVideos(yes) => if *yes { "yes" } else { "no" }.to_string(),
            PromptAnswer::Overwrite(yes) => if *yes { "y" } else { "n" }.to_string(),
            PromptAnswer::SongNumber(number) => number.unwrap_or(0).to_string(),
            PromptAnswer::NewApiKey(key) => key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_wire_text() {
        assert_eq!(PromptAnswer::ManualUrl(None).wire_text(), "");
        assert_eq!(
            PromptAnswer::ManualUrl(Some("https://youtu.be/x".to_string())).wire_text(),
            "https://youtu.be/x"
        );
        assert_eq!(PromptAnswer::ReplaceVideos(true).wire_text(), "yes");
        assert_eq!(PromptAnswer::ReplaceVideos(false).wire_text(), "no");
        assert_eq!(PromptAnswer::Overwrite(true).wire_text(), "y");
        assert_eq!(PromptAnswer::Overwrite(false).wire_text(), "n");
        assert_eq!(PromptAnswer::SongNumber(Some(3)).wire_text(), "3");
        assert_eq!(PromptAnswer::SongNumber(None).wire_text(), "0");
        assert_eq!(PromptAnswer::ReplacementUrl(None).wire_text(), "");
        assert_eq!(PromptAnswer::NewApiKey("k2".to_string()).wire_text(), "k2");
    }

    #[test]
    fn test_request_and_answer_kinds_line_up() {
        let pairs = [
            (
                PromptRequest::SongReplacement {
                    songs: vec![],
                    max: 3,
                },
                PromptAnswer::SongNumber(Some(1)),
            ),
            (PromptRequest::NewApiKey, PromptAnswer::NewApiKey("k".to_string())),
            (
                PromptRequest::Overwrite { filename: None },
                PromptAnswer::Overwrite(false),
            ),
        ];
        for (request, answer) in pairs {
            assert_eq!(request.kind(), answer.kind());
            assert!(!request.kind().is_automatic());
        }
        assert!(PromptKind::Username.is_automatic());
    }
}
