//! Launch configuration for a single worker run.
//!
//! A `LaunchConfiguration` is built once from the operator's form input and
//! passed to the launcher unchanged for the lifetime of the run.

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

/// Codec handed to the worker when the operator did not pick one.
pub const DEFAULT_CODEC: &str = "libx264";

/// Everything the worker needs to start and to answer its own questions.
///
/// The year and month are kept as the operator typed them; the worker
/// validates them itself.
///
/// # Example
///
/// ```json
/// {
///   "lastfm_api_key": "abc",
///   "youtube_api_key": "def",
///   "username": "rj",
///   "year": "2024",
///   "month": "03",
///   "num_songs": 10,
///   "allow_manual_youtube": false,
///   "codec": null
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct LaunchConfiguration {
    /// Last.fm API credential.
    pub lastfm_api_key: String,

    /// YouTube Data API credential.
    pub youtube_api_key: String,

    /// Last.fm user whose listening history is compiled.
    pub username: String,

    /// Target year as supplied (expected `YYYY`).
    pub year: String,

    /// Target month as supplied (expected `MM`).
    pub month: String,

    /// Number of top songs to include.
    pub num_songs: u32,

    /// Whether the worker may ask for a manual URL when a search fails.
    #[serde(default)]
    pub allow_manual_youtube: bool,

    /// Output encoder; `None` means [`DEFAULT_CODEC`].
    #[serde(default)]
    pub codec: Option<String>,
}

/// A required form field was left empty.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Number of songs must be at least 1")]
    NoSongs,
}

impl LaunchConfiguration {
    /// The codec to pass to the worker, falling back to [`DEFAULT_CODEC`].
    pub fn codec_or_default(&self) -> &str {
        match self.codec.as_deref() {
            Some(codec) if !codec.trim().is_empty() => codec,
            _ => DEFAULT_CODEC,
        }
    }

    /// Required-field check performed by the form before submission.
    pub fn validate(&self) -> Result<(), FormError> {
        let required = [
            ("Last.fm API key", &self.lastfm_api_key),
            ("YouTube API key", &self.youtube_api_key),
            ("username", &self.username),
            ("year", &self.year),
            ("month", &self.month),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(FormError::MissingField(name));
            }
        }
        if self.num_songs == 0 {
            return Err(FormError::NoSongs);
        }
        Ok(())
    }
}
