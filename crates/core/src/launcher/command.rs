//! Argument vector and environment for a worker invocation.

use std::ffi::OsString;
use std::path::Path;
use vfm_protocol::LaunchConfiguration;

pub const LASTFM_KEY_ENV: &str = "LASTFM_API_KEY";
pub const YOUTUBE_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// Builds the worker flags:
/// `--lastfm-api-key <k> --youtube-api-key <k> --output-dir <dir> --codec <codec>`.
pub fn build_args(config: &LaunchConfiguration, output_dir: &Path) -> Vec<OsString> {
    vec![
        "--lastfm-api-key".into(),
        config.lastfm_api_key.clone().into(),
        "--youtube-api-key".into(),
        config.youtube_api_key.clone().into(),
        "--output-dir".into(),
        output_dir.as_os_str().to_os_string(),
        "--codec".into(),
        config.codec_or_default().into(),
    ]
}

/// Variables merged into the inherited environment.
pub fn build_env(config: &LaunchConfiguration) -> Vec<(&'static str, String)> {
    vec![
        (LASTFM_KEY_ENV, config.lastfm_api_key.clone()),
        (YOUTUBE_KEY_ENV, config.youtube_api_key.clone()),
    ]
}
