//! Worker process launcher.
//!
//! Turns a [`LaunchConfiguration`] into a running child with piped stdio:
//! persist credentials, prepare the output directory, resolve the worker,
//! then spawn it.

pub mod command;
pub mod credentials;
pub mod resolve;

use crate::config::AppPaths;
use crate::config::AppSettings;
use async_trait::async_trait;
use resolve::WorkerInvocation;
use resolve::WorkerLocations;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Child;
use tokio::process::Command;
use vfm_protocol::LaunchConfiguration;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("A worker is already running")]
    AlreadyRunning,

    #[error("Worker not found (searched {} locations and no Python interpreter is available)", searched.len())]
    WorkerNotFound { searched: Vec<PathBuf> },

    #[error("Failed to write credentials to {path}: {source}")]
    Credentials {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Failed to capture worker {0}")]
    MissingPipe(&'static str),

    #[error("Launch was cancelled by a stop request")]
    Cancelled,
}

/// Starts worker processes.
///
/// Implementations must return a child with stdin, stdout and stderr piped.
#[async_trait]
pub trait WorkerLauncher: Send + Sync {
    async fn launch(&self, config: &LaunchConfiguration) -> Result<Child, LaunchError>;
}

/// Launches the real `videofm` worker.
pub struct ProcessLauncher {
    paths: AppPaths,
    locations: WorkerLocations,
    script: PathBuf,
    interpreters: Vec<String>,
}

impl ProcessLauncher {
    pub fn new(paths: AppPaths, settings: &AppSettings) -> Self {
        let locations = WorkerLocations::discover(
            settings.worker.executable.clone(),
            settings.worker.resources_dir.clone(),
        );
        Self::with_locations(paths, settings, locations)
    }

    pub fn with_locations(
        paths: AppPaths,
        settings: &AppSettings,
        locations: WorkerLocations,
    ) -> Self {
        Self {
            paths,
            locations,
            script: settings.worker.script.clone(),
            interpreters: settings.worker.interpreters.clone(),
        }
    }

    /// The invocation a launch would use right now.
    pub fn invocation(&self) -> Result<WorkerInvocation, LaunchError> {
        resolve::resolve_invocation(&self.locations, &self.script, &self.interpreters).ok_or_else(
            || LaunchError::WorkerNotFound {
                searched: self.locations.candidate_paths(),
            },
        )
    }
}

#[async_trait]
impl WorkerLauncher for ProcessLauncher {
    async fn launch(&self, config: &LaunchConfiguration) -> Result<Child, LaunchError> {
        let data_dir = self.paths.data_dir();
        credentials::write_credentials(data_dir, config).map_err(|source| {
            LaunchError::Credentials {
                path: self.paths.env_file(),
                source,
            }
        })?;

        let output_dir = self.paths.videos_dir();
        std::fs::create_dir_all(&output_dir).map_err(|source| LaunchError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        let invocation = self.invocation()?;
        let mut cmd = match &invocation {
            WorkerInvocation::Executable(path) => {
                resolve::ensure_executable(path);
                Command::new(path)
            }
            WorkerInvocation::Script {
                interpreter,
                script,
            } => {
                let mut cmd = Command::new(interpreter);
                cmd.arg(script);
                cmd
            }
        };

        cmd.args(command::build_args(config, &output_dir));
        cmd.envs(command::build_env(config));
        cmd.current_dir(data_dir);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let program = invocation.program().display().to_string();
        tracing::info!(program = %program, codec = config.codec_or_default(), "Spawning worker");

        cmd.spawn()
            .map_err(|source| LaunchError::Spawn { program, source })
    }
}
