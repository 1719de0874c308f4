//! The `.env` credential file shared with the worker.

use crate::launcher::command::LASTFM_KEY_ENV;
use crate::launcher::command::YOUTUBE_KEY_ENV;
use regex::NoExpand;
use regex::Regex;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use vfm_protocol::LaunchConfiguration;

pub const ENV_FILE_NAME: &str = ".env";

pub fn render(config: &LaunchConfiguration) -> String {
    format!(
        "{}={}\n{}={}",
        LASTFM_KEY_ENV, config.lastfm_api_key, YOUTUBE_KEY_ENV, config.youtube_api_key
    )
}

/// Writes `<data_dir>/.env`, creating the directory and replacing any
/// previous contents.
pub fn write_credentials(data_dir: &Path, config: &LaunchConfiguration) -> io::Result<PathBuf> {
    std::fs::create_dir_all(data_dir)?;
    let path = data_dir.join(ENV_FILE_NAME);
    std::fs::write(&path, render(config))?;
    Ok(path)
}

/// Rewrites every `KEY=...` line in `path` with `value`.
///
/// Returns `Ok(false)` when the file does not exist or holds no such line.
pub fn replace_key(path: &Path, key: &str, value: &str) -> io::Result<bool> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    match replace_key_in(&content, key, value) {
        Some(updated) => {
            std::fs::write(path, updated)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Pure form of [`replace_key`]. Bytes outside the matched lines, line
/// endings included, are left untouched.
pub fn replace_key_in(content: &str, key: &str, value: &str) -> Option<String> {
    let pattern = format!(r"(?m)^{}=[^\r\n]*", regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    if !re.is_match(content) {
        return None;
    }
    let line = format!("{}={}", key, value);
    Some(re.replace_all(content, NoExpand(&line)).into_owned())
}
