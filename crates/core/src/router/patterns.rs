//! Literal markers and regexes for the worker's prompt vocabulary.

use regex::Regex;
use std::sync::OnceLock;

pub const USERNAME: &str = "Enter your Last.fm username:";
pub const YEAR: &str = "Enter the target year";
pub const MONTH: &str = "Enter the target month";
pub const SONG_COUNT: &str = "Enter the number of top songs";
pub const MANUAL_URL_PREFERENCE: &str = "Do you want to manually input YouTube URLs";
pub const MANUAL_URL: &str = "Enter a manual YouTube URL";
pub const REPLACE_VIDEOS: &str = "Do you need to replace any videos?";
pub const ALREADY_EXISTS: &str = "already exists";
pub const OVERWRITE: &str = "Overwrite?";
pub const REPLACEMENT_URL: &str = "Enter the correct YouTube URL:";
pub const QUOTA_EXCEEDED: &str = "API quota exceeded";
pub const NEW_API_KEY: &str = "Enter new API key:";
pub const REPLACING: &str = "Replacing:";

pub const COMPLETION_PHRASES: [&str; 2] = ["Video compilation complete", "Final video saved"];

fn overwrite_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"['"]?([^'"]+\.mp4)['"]? already exists\. Overwrite\? \[y/N\]"#)
            .expect("overwrite regex should compile")
    })
}

fn song_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"Current videos in compilation:([\s\S]*?)Enter the song number to replace \(1-(\d+)\):",
        )
        .expect("song list regex should compile")
    })
}

fn numbered_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d+\.").expect("numbered line regex should compile")
    })
}

fn completion_filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:Final video saved as:|Video compilation complete! Saved as:) ([\w.-]+\.mp4)")
            .expect("completion regex should compile")
    })
}

/// Whether `text` is an overwrite confirmation.
pub fn is_overwrite_prompt(text: &str) -> bool {
    overwrite_re().is_match(text) || (text.contains(ALREADY_EXISTS) && text.contains(OVERWRITE))
}

/// File name (last path segment) named by an overwrite confirmation.
pub fn overwrite_filename(text: &str) -> Option<String> {
    let path = overwrite_re().captures(text)?.get(1)?.as_str().trim();
    let name = path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path);
    Some(name.to_string())
}

pub fn is_song_list(text: &str) -> bool {
    song_list_re().is_match(text)
}

/// Numbered entries and the upper bound of a song-replacement prompt.
pub fn song_list(text: &str) -> Option<(Vec<String>, u32)> {
    let caps = song_list_re().captures(text)?;
    let max = caps.get(2)?.as_str().parse().ok()?;
    let songs = caps
        .get(1)?
        .as_str()
        .lines()
        .map(str::trim)
        .filter(|line| numbered_line_re().is_match(line))
        .map(str::to_string)
        .collect();
    Some((songs, max))
}

pub fn is_new_api_key_prompt(text: &str) -> bool {
    text.contains(QUOTA_EXCEEDED) && text.contains(NEW_API_KEY)
}

pub fn is_completion(text: &str) -> bool {
    COMPLETION_PHRASES.iter().any(|phrase| text.contains(phrase))
}

pub fn completion_filename(text: &str) -> Option<String> {
    completion_filename_re()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Song named on the most recent `Replacing:` line.
pub fn last_replacing(transcript: &str) -> Option<String> {
    transcript
        .lines()
        .rev()
        .find_map(|line| line.split_once(REPLACING))
        .map(|(_, song)| song.trim().to_string())
        .filter(|song| !song.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_filename_uses_last_segment() {
        let text = "File '/tmp/out/Videos/alice_2024_03.mp4' already exists. Overwrite? [y/N] ";
        assert!(is_overwrite_prompt(text));
        assert_eq!(overwrite_filename(text), Some("alice_2024_03.mp4".to_string()));
    }

    #[test]
    fn test_overwrite_fallback_without_filename() {
        let text = "Output already exists. Overwrite? (y/n)";
        assert!(is_overwrite_prompt(text));
        assert_eq!(overwrite_filename(text), None);
        assert!(!is_overwrite_prompt("Overwrite? [y/N]"));
    }

    #[test]
    fn test_song_list_extracts_numbered_lines() {
        let text = "\nCurrent videos in compilation:\n1. A - One\n  2. B - Two\nnoise\n\nEnter the song number to replace (1-2): ";
        let (songs, max) = song_list(text).expect("song list should parse");
        assert_eq!(songs, vec!["1. A - One".to_string(), "2. B - Two".to_string()]);
        assert_eq!(max, 2);
    }

    #[test]
    fn test_completion_filename() {
        assert_eq!(
            completion_filename("✨ Final video saved as: alice_2024_3.mp4\n"),
            Some("alice_2024_3.mp4".to_string())
        );
        assert!(is_completion("✨ Video compilation complete! Saved as: x.mp4"));
        assert!(!is_completion("Merging Complete!"));
    }

    #[test]
    fn test_last_replacing_picks_latest() {
        let transcript = "🔄 Replacing: A - One\nfoo\n🔄 Replacing: B - Two\nEnter the correct YouTube URL: ";
        assert_eq!(last_replacing(transcript), Some("B - Two".to_string()));
        assert_eq!(last_replacing("nothing here"), None);
    }
}
