//! Locations inside the application's private data directory.

use std::path::Path;
use std::path::PathBuf;

/// Directory name under the platform's local data directory.
pub const APP_DIR_NAME: &str = "videofm-kit";

/// Every file and directory the controller reads, writes or cleans up.
///
/// The worker runs with the data directory as its working directory, so its
/// relative `clips/` and `cache/` folders land here as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Use `data_dir` if given, otherwise the platform data directory.
    pub fn resolve(data_dir: Option<PathBuf>) -> Self {
        match data_dir {
            Some(dir) => Self::new(dir),
            None => {
                let base = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir);
                Self::new(base.join(APP_DIR_NAME))
            }
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Credential file handed to the worker.
    pub fn env_file(&self) -> PathBuf {
        self.data_dir.join(".env")
    }

    /// Where finished videos are written.
    pub fn videos_dir(&self) -> PathBuf {
        self.data_dir.join("Videos")
    }

    /// Transient per-song clips.
    pub fn clips_dir(&self) -> PathBuf {
        self.data_dir.join("clips")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    /// Worker resume checkpoint.
    pub fn progress_file(&self) -> PathBuf {
        self.cache_dir().join("progress.json")
    }

    /// ffmpeg concat manifest.
    pub fn file_list(&self) -> PathBuf {
        self.cache_dir().join("file_list.txt")
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("videofm-kit.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_hang_off_data_dir() {
        let paths = AppPaths::new("/tmp/vfm");
        assert_eq!(paths.env_file(), PathBuf::from("/tmp/vfm/.env"));
        assert_eq!(paths.clips_dir(), PathBuf::from("/tmp/vfm/clips"));
        assert_eq!(
            paths.progress_file(),
            PathBuf::from("/tmp/vfm/cache/progress.json")
        );
        assert_eq!(paths.file_list(), PathBuf::from("/tmp/vfm/cache/file_list.txt"));
    }

    #[test]
    fn test_resolve_prefers_override() {
        let paths = AppPaths::resolve(Some(PathBuf::from("/srv/data")));
        assert_eq!(paths.data_dir(), Path::new("/srv/data"));

        let default = AppPaths::resolve(None);
        assert!(default.data_dir().ends_with(APP_DIR_NAME));
    }
}
