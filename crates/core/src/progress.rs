//! Best-effort progress estimation from the worker's log lines.
//!
//! Cues are checked in a fixed order on every chunk, so a chunk carrying
//! several of them ends in the state of the last one. Nothing enforces
//! monotonic progress.

use regex::Regex;
use std::sync::OnceLock;
use vfm_protocol::ProgressState;
use vfm_protocol::Stage;

use crate::router::patterns;

const FETCHING_MARKERS: [&str; 2] = ["Fetching page", "Fetching from Last.fm"];
const DOWNLOAD_MARKER: &str = "[download]";
const MERGING_MARKER: &str = "Merging";

fn top_songs_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Processing your top (\d+) songs").expect("top songs regex should compile")
    })
}

fn item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Processing (\d+)/(\d+):").expect("item regex should compile"))
}

fn download_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"download\]\s+(\d+(?:\.\d+)?)% of")
            .expect("download regex should compile")
    })
}

/// Percent for item `current` of `total` during processing.
pub fn processing_percent(current: u32, total: u32) -> f64 {
    if total == 0 {
        return 10.0;
    }
    10.0 + (f64::from(current.saturating_sub(1)) / f64::from(total)) * 85.0
}

#[derive(Debug, Default, Clone)]
pub struct ProgressEstimator {
    state: ProgressState,
}

impl ProgressEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &ProgressState {
        &self.state
    }

    /// Applies every cue found in `text`. Returns whether the state changed.
    pub fn observe(&mut self, text: &str) -> bool {
        let before = self.state.clone();
        let state = &mut self.state;

        if let Some(total) = capture_u32(top_songs_re(), text, 1) {
            state.total_items = total;
            state.stage = Stage::Init;
            state.current_item = 0;
            state.percent = 5.0;
            state.status_text = format!("Preparing {} songs...", total);
        }

        if FETCHING_MARKERS.iter().any(|m| text.contains(m)) {
            state.stage = Stage::Fetching;
            state.percent = 10.0;
            state.status_text = "Fetching data from Last.fm...".to_string();
        }

        if let Some(caps) = item_re().captures(text) {
            let current = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
            let announced = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
            if let (Some(current), Some(announced)) = (current, announced) {
                if state.total_items == 0 {
                    state.total_items = announced;
                }
                state.stage = Stage::Processing;
                state.current_item = current;
                state.percent = processing_percent(current, state.total_items);
                state.status_text =
                    format!("Processing song {}/{}", current, state.total_items);
            }
        }

        if text.contains(DOWNLOAD_MARKER) {
            if let Some(caps) = download_re().captures(text) {
                if let Some(pct) = caps.get(1) {
                    state.status_text = format!(
                        "Song {}/{}: Downloading {}%",
                        state.current_item,
                        state.total_items,
                        pct.as_str()
                    );
                }
            }
        }

        if text.contains(MERGING_MARKER) {
            state.stage = Stage::Merging;
            state.percent = 95.0;
            state.status_text = "Creating final video...".to_string();
        }

        if patterns::is_completion(text) {
            state.stage = Stage::Complete;
            state.percent = 100.0;
            state.status_text = "Complete!".to_string();
        }

        self.state != before
    }
}

fn capture_u32(re: &Regex, text: &str, group: usize) -> Option<u32> {
    re.captures(text)?.get(group)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_percent_example() {
        assert!((processing_percent(4, 10) - 35.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_item_uses_known_total() {
        let mut est = ProgressEstimator::new();
        assert!(est.observe("\n🎵 Processing your top 10 songs for March 2024...\n"));
        assert_eq!(est.snapshot().stage, Stage::Init);
        assert_eq!(est.snapshot().percent, 5.0);

        assert!(est.observe("\n🎵 Processing 4/10: Artist - Title\n"));
        let state = est.snapshot();
        assert_eq!(state.stage, Stage::Processing);
        assert_eq!(state.current_item, 4);
        assert!((state.percent - 35.5).abs() < 1e-9);
        assert_eq!(state.status_text, "Processing song 4/10");
    }

    #[test]
    fn test_item_total_falls_back_to_announced() {
        let mut est = ProgressEstimator::new();
        est.observe("Processing 1/20: A - B");
        assert_eq!(est.snapshot().total_items, 20);
        assert_eq!(est.snapshot().percent, 10.0);
    }

    #[test]
    fn test_download_updates_status_only() {
        let mut est = ProgressEstimator::new();
        est.observe("Processing your top 5 songs");
        est.observe("Processing 2/5: A - B");
        let percent = est.snapshot().percent;

        assert!(est.observe("[download]  42.3% of 3.20MiB at 1.00MiB/s"));
        assert_eq!(est.snapshot().status_text, "Song 2/5: Downloading 42.3%");
        assert_eq!(est.snapshot().percent, percent);
        assert_eq!(est.snapshot().stage, Stage::Processing);
    }

    #[test]
    fn test_download_accepts_padded_and_whole_percent() {
        let mut est = ProgressEstimator::new();
        est.observe("Processing 3/4: A - B");

        assert!(est.observe("[download]   7.5% of ~12.00MiB at 2.00MiB/s ETA 00:05"));
        assert_eq!(est.snapshot().status_text, "Song 3/4: Downloading 7.5%");

        assert!(est.observe("[download] 100% of 12.00MiB in 00:00:06"));
        assert_eq!(est.snapshot().status_text, "Song 3/4: Downloading 100%");
    }

    #[test]
    fn test_unrelated_text_is_no_change() {
        let mut est = ProgressEstimator::new();
        assert!(!est.observe("nothing interesting"));
        assert_eq!(est.snapshot(), &ProgressState::default());
    }

    #[test]
    fn test_monotone_over_well_ordered_run() {
        let lines = [
            "🎵 Processing your top 3 songs for January 2024...",
            "📥 Fetching page 1 from Last.fm...",
            "🎵 Processing 1/3: A - One",
            "[download]  50.0% of 1.00MiB",
            "🎵 Processing 2/3: B - Two",
            "🎵 Processing 3/3: C - Three",
            "🔄 Merging the final version after replacements...",
            "✨ Final video saved as: out.mp4",
        ];

        let mut est = ProgressEstimator::new();
        let mut last = 0.0;
        for line in lines {
            est.observe(line);
            let percent = est.snapshot().percent;
            assert!(percent >= last, "{line}: {percent} < {last}");
            last = percent;
        }
        assert_eq!(est.snapshot().stage, Stage::Complete);
        assert_eq!(last, 100.0);
    }
}
