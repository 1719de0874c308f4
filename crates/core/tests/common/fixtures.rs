//! Test fixtures: launch configurations, fake workers and a ready-made
//! `RunManager` wired to a temporary data directory.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Child;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::sync::Notify;
use vfm_core::config::AppPaths;
use vfm_core::launcher::LaunchError;
use vfm_core::launcher::WorkerLauncher;
use vfm_core::lifecycle::RunManager;
use vfm_protocol::Event;
use vfm_protocol::LaunchConfiguration;

/// A complete, valid form submission.
pub fn sample_config() -> LaunchConfiguration {
    LaunchConfiguration {
        lastfm_api_key: "lfm-key".to_string(),
        youtube_api_key: "yt-key".to_string(),
        username: "alice".to_string(),
        year: "2024".to_string(),
        month: "3".to_string(),
        num_songs: 5,
        allow_manual_youtube: false,
        codec: None,
    }
}

/// Launches `sh -c <script>` in place of the real worker.
pub struct ScriptLauncher {
    pub script: String,
    pub cwd: PathBuf,
}

#[async_trait]
impl WorkerLauncher for ScriptLauncher {
    async fn launch(&self, _config: &LaunchConfiguration) -> Result<Child, LaunchError> {
        Command::new("sh")
            .arg("-c")
            .arg(&self.script)
            .current_dir(&self.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: "sh".to_string(),
                source,
            })
    }
}

/// Holds every launch until `release` is notified, so a test can act while
/// the launch is still in flight.
pub struct GatedLauncher {
    pub inner: ScriptLauncher,
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[async_trait]
impl WorkerLauncher for GatedLauncher {
    async fn launch(&self, config: &LaunchConfiguration) -> Result<Child, LaunchError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.launch(config).await
    }
}

/// A manager running a scripted worker against a temporary data directory.
///
/// Keep the harness alive for the duration of the test; dropping it removes
/// the directory.
pub struct Harness {
    pub dir: TempDir,
    pub paths: AppPaths,
    pub manager: RunManager,
    pub events: mpsc::Receiver<Event>,
}

pub fn harness(script: &str) -> Harness {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let paths = AppPaths::new(dir.path());
    let launcher = ScriptLauncher {
        script: script.to_string(),
        cwd: dir.path().to_path_buf(),
    };
    harness_with(dir, paths, Arc::new(launcher))
}

pub fn harness_with(dir: TempDir, paths: AppPaths, launcher: Arc<dyn WorkerLauncher>) -> Harness {
    let (events_tx, events) = mpsc::channel(256);
    let manager = RunManager::new(
        launcher,
        paths.clone(),
        Duration::from_millis(100),
        events_tx,
    );
    Harness {
        dir,
        paths,
        manager,
        events,
    }
}

/// Seed the artifacts that cleanup is expected to remove.
pub fn seed_artifacts(paths: &AppPaths) {
    std::fs::create_dir_all(paths.clips_dir().join("song_1")).expect("create clips");
    std::fs::write(paths.clips_dir().join("song_1").join("clip.mp4"), b"x").expect("write clip");
    std::fs::create_dir_all(paths.cache_dir()).expect("create cache");
    std::fs::write(paths.progress_file(), "{}").expect("write progress");
    std::fs::write(paths.file_list(), "file 'clip.mp4'").expect("write file list");
}
