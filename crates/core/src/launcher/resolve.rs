//! Locating the worker on disk.

use std::path::Path;
use std::path::PathBuf;

/// Platform file name of the packaged worker.
pub fn executable_name() -> &'static str {
    if cfg!(windows) {
        "videofm.exe"
    } else {
        "videofm"
    }
}

/// Directories probed for the worker.
#[derive(Debug, Clone, Default)]
pub struct WorkerLocations {
    /// Explicit path from settings or `--worker`.
    pub override_path: Option<PathBuf>,
    /// Packaged resources directory.
    pub resources_dir: Option<PathBuf>,
    /// Directory holding the running binary.
    pub app_dir: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
}

impl WorkerLocations {
    /// Locations derived from the running process. `resources_dir` defaults
    /// to `resources/` next to the binary.
    pub fn discover(override_path: Option<PathBuf>, resources_dir: Option<PathBuf>) -> Self {
        let app_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let resources_dir = resources_dir.or_else(|| app_dir.as_ref().map(|d| d.join("resources")));
        Self {
            override_path,
            resources_dir,
            app_dir,
            cwd: std::env::current_dir().ok(),
        }
    }

    /// Every candidate in probe order.
    pub fn candidate_paths(&self) -> Vec<PathBuf> {
        let exe = executable_name();
        let mut candidates = Vec::new();

        if let Some(path) = &self.override_path {
            candidates.push(path.clone());
        }

        if let Some(res) = &self.resources_dir {
            candidates.push(res.join("extraResources").join("videofm").join("videofm"));
            candidates.push(res.join("extraResources").join(exe));
            candidates.push(
                res.join("app.asar.unpacked")
                    .join("dist")
                    .join("videofm")
                    .join(exe),
            );
            candidates.push(res.join("dist").join("videofm").join(exe));
            candidates.push(res.join(exe));
            candidates.push(
                res.join("videofm.app")
                    .join("Contents")
                    .join("MacOS")
                    .join("videofm"),
            );
        }

        for base in [&self.app_dir, &self.cwd].into_iter().flatten() {
            candidates.push(base.join("dist").join("videofm").join(exe));
            candidates.push(base.join(exe));
        }

        candidates
    }
}

/// First candidate that exists as a regular file.
pub fn resolve_executable(locations: &WorkerLocations) -> Option<PathBuf> {
    let found = locations
        .candidate_paths()
        .into_iter()
        .find(|path| path.is_file());
    match &found {
        Some(path) => tracing::debug!(path = %path.display(), "Resolved worker executable"),
        None => tracing::debug!("No packaged worker executable found"),
    }
    found
}

/// How the worker will be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerInvocation {
    /// A self-contained worker binary.
    Executable(PathBuf),
    /// An interpreter running the worker script.
    Script { interpreter: PathBuf, script: PathBuf },
}

impl WorkerInvocation {
    pub fn program(&self) -> &Path {
        match self {
            WorkerInvocation::Executable(path) => path,
            WorkerInvocation::Script { interpreter, .. } => interpreter,
        }
    }
}

/// Picks the packaged executable if present, otherwise the first interpreter
/// found on `PATH` running `script`.
pub fn resolve_invocation(
    locations: &WorkerLocations,
    script: &Path,
    interpreters: &[String],
) -> Option<WorkerInvocation> {
    if let Some(path) = resolve_executable(locations) {
        return Some(WorkerInvocation::Executable(path));
    }

    let interpreter = interpreters
        .iter()
        .filter(|name| !name.trim().is_empty())
        .find_map(|name| which::which(name).ok())?;

    Some(WorkerInvocation::Script {
        interpreter,
        script: locate_script(locations, script),
    })
}

/// The worker runs from the data directory, so a relative script is anchored
/// to the app or current directory.
fn locate_script(locations: &WorkerLocations, script: &Path) -> PathBuf {
    if script.is_absolute() {
        return script.to_path_buf();
    }
    let bases: Vec<&PathBuf> = [&locations.app_dir, &locations.cwd]
        .into_iter()
        .flatten()
        .collect();
    bases
        .iter()
        .map(|base| base.join(script))
        .find(|candidate| candidate.is_file())
        .or_else(|| bases.last().map(|base| base.join(script)))
        .unwrap_or_else(|| script.to_path_buf())
}

/// Adds execute permission when missing. Failure is logged, not fatal.
#[cfg(unix)]
pub fn ensure_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not stat worker executable");
            return;
        }
    };
    if metadata.permissions().mode() & 0o111 != 0 {
        return;
    }
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)) {
        tracing::warn!(path = %path.display(), error = %e, "Could not mark worker executable");
    }
}

#[cfg(not(unix))]
pub fn ensure_executable(_path: &Path) {}
