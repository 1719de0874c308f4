//! Runtime worker state and run results.
//!
//! This module defines the structures for tracking the external worker
//! process and the outcome reported back to the operator.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;
use ts_rs::TS;
use uuid::Uuid;

/// Lifecycle status of the worker process.
///
/// Normal progression: NotStarted -> Running -> Exited.
/// `Exiting` covers the window between a stop request and the OS reporting
/// the exit.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerStatus {
    NotStarted,
    Running,
    Exiting,
    Exited,
}

/// The at-most-one external worker of a run.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
pub struct WorkerProcess {
    /// Identifier of the run that owns this worker.
    #[ts(type = "string")]
    pub run_id: Uuid,

    /// OS process id, once spawned.
    pub pid: Option<u32>,

    pub status: WorkerStatus,

    /// Exit code once known. `None` after exit means a signal ended it.
    pub exit_code: Option<i32>,

    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,
}

impl WorkerProcess {
    /// Create a record for a freshly spawned worker.
    pub fn spawned(run_id: Uuid, pid: Option<u32>) -> Self {
        Self {
            run_id,
            pid,
            status: WorkerStatus::Running,
            exit_code: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Record the exit and stamp the finish time.
    pub fn mark_exited(&mut self, exit_code: Option<i32>) {
        self.status = WorkerStatus::Exited;
        self.exit_code = exit_code;
        self.finished_at = Some(Utc::now());
    }
}

/// Result of a run as presented to the operator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RunOutcome {
    /// The worker exited with code 0.
    Succeeded {
        message: String,
        /// Location of the generated video, if its name could be recovered
        /// from the worker output.
        file_path: Option<PathBuf>,
    },
    /// The worker exited with a non-zero code or was terminated by a signal.
    Failed {
        exit_code: Option<i32>,
        error: String,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded { .. })
    }
}
