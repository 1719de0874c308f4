//! Removal of the worker's transient artifacts.
//!
//! Failures never propagate: each one is logged and counted so a stop or
//! shutdown always completes.

use crate::config::AppPaths;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    /// Files and directories removed.
    pub removed: usize,
    /// Entries that could not be removed.
    pub failures: usize,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }
}

/// Deletes `clips/` (contents first), `cache/progress.json` and
/// `cache/file_list.txt`.
pub fn cleanup_artifacts(paths: &AppPaths) -> CleanupReport {
    let mut report = CleanupReport::default();

    remove_tree(&paths.clips_dir(), &mut report);
    remove_file(&paths.progress_file(), &mut report);
    remove_file(&paths.file_list(), &mut report);

    tracing::info!(
        removed = report.removed,
        failures = report.failures,
        "Cleaned up worker artifacts"
    );
    report
}

/// Empties the cache directory by removing and recreating it.
pub fn clear_cache(paths: &AppPaths) -> std::io::Result<()> {
    let cache_dir = paths.cache_dir();
    match std::fs::remove_dir_all(&cache_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    std::fs::create_dir_all(&cache_dir)?;
    tracing::info!(path = %cache_dir.display(), "Cache cleared");
    Ok(())
}

fn remove_tree(root: &Path, report: &mut CleanupReport) {
    if !root.exists() {
        return;
    }
    for entry in WalkDir::new(root).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(path = %root.display(), error = %e, "Failed to walk directory");
                report.failures += 1;
                continue;
            }
        };
        let path = entry.path();
        let result = if entry.file_type().is_dir() {
            std::fs::remove_dir(path)
        } else {
            std::fs::remove_file(path)
        };
        match result {
            Ok(()) => report.removed += 1,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove");
                report.failures += 1;
            }
        }
    }
}

fn remove_file(path: &Path, report: &mut CleanupReport) {
    match std::fs::remove_file(path) {
        Ok(()) => report.removed += 1,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove");
            report.failures += 1;
        }
    }
}
