//! Coarse progress estimate shown in the UI.

use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;

/// Phase label inferred from worker output.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    Init,
    Fetching,
    Processing,
    Merging,
    Complete,
}

/// Snapshot of the estimator. Purely observational.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, TS)]
pub struct ProgressState {
    pub stage: Stage,

    /// Number of songs the worker announced it will process.
    pub total_items: u32,

    /// One-based index of the song being processed, 0 before the first.
    pub current_item: u32,

    /// Bar position in the 0..=100 range.
    pub percent: f64,

    /// Human-readable status line, including per-song download progress.
    pub status_text: String,
}
