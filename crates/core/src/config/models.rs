//! Settings models for `config.toml`.
//!
//! ```toml
//! [worker]
//! executable = "/opt/videofm/videofm"
//! script = "videofm.py"
//!
//! [run]
//! default-codec = "h264_videotoolbox"
//! stop-grace-ms = 500
//! ```

use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use vfm_protocol::DEFAULT_CODEC;

/// Unified application settings.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct AppSettings {
    pub worker: WorkerSettings,
    pub run: RunSettings,
}

/// Where to find the worker and how to invoke it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct WorkerSettings {
    /// Explicit worker path, probed before any packaged location.
    pub executable: Option<PathBuf>,

    /// Packaged resources directory. Defaults to `resources/` next to the
    /// running binary.
    pub resources_dir: Option<PathBuf>,

    /// Script run through the interpreter fallback.
    pub script: PathBuf,

    /// Interpreters tried in order when no executable is found.
    pub interpreters: Vec<String>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            executable: None,
            resources_dir: None,
            script: PathBuf::from("videofm.py"),
            interpreters: vec!["python3".to_string(), "python".to_string()],
        }
    }
}

/// Per-run defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct RunSettings {
    /// Codec preselected in the form.
    pub default_codec: String,

    /// Delay before a stop escalates to a forceful kill.
    pub stop_grace_ms: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            default_codec: DEFAULT_CODEC.to_string(),
            stop_grace_ms: 500,
        }
    }
}

impl RunSettings {
    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}
