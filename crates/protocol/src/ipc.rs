//! Inter-process communication protocol.
//!
//! This module defines the message types for asynchronous communication
//! between the TUI (operator shell) and the Core (worker controller).
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from TUI to Core
//! - `Event`: Status updates sent from Core to TUI
//!
//! Communication is channel-based so the UI stays responsive while the
//! worker runs and waits on the operator.

use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;
use uuid::Uuid;

use crate::launch_models::LaunchConfiguration;
use crate::progress_models::ProgressState;
use crate::prompt_models::PromptAnswer;
use crate::prompt_models::PromptKind;
use crate::prompt_models::PromptRequest;
use crate::worker_models::RunOutcome;
use crate::worker_models::WorkerStatus;

/// Operations sent from the UI (TUI) to the Core logic.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "answer",
///   "payload": { "answer": { "kind": "overwrite", "value": true } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Launch the worker with the submitted form.
    StartRun { config: LaunchConfiguration },

    /// Terminate the active worker and clean up.
    StopRun,

    /// Answer the prompt currently shown to the operator.
    Answer { answer: PromptAnswer },

    /// Hand a fresh YouTube key to the worker and persist it.
    ProvideApiKey { key: String },

    /// Remove cached search results.
    ClearCache,

    /// Stop everything and exit.
    Shutdown,
}

/// Events sent from the Core logic to the UI (TUI).
///
/// ```json
/// {
///   "type": "progressUpdate",
///   "payload": { "run_id": "uuid-here", "progress": { "stage": "PROCESSING", ... } }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// The worker was spawned.
    RunStarted {
        #[ts(type = "string")]
        run_id: Uuid,
    },

    /// The worker's lifecycle status changed.
    WorkerStatusUpdate {
        #[ts(type = "string")]
        run_id: Uuid,
        status: WorkerStatus,
    },

    /// Text the worker wrote to its primary output.
    WorkerOutput {
        #[ts(type = "string")]
        run_id: Uuid,
        content: String,
    },

    /// Diagnostic output or a runtime I/O error. Non-fatal.
    WorkerError {
        #[ts(type = "string")]
        run_id: Uuid,
        error: String,
    },

    /// A prompt was answered from the launch configuration.
    AutoAnswered {
        #[ts(type = "string")]
        run_id: Uuid,
        kind: PromptKind,
    },

    /// A prompt needs the operator.
    PromptRaised {
        #[ts(type = "string")]
        run_id: Uuid,
        prompt: PromptRequest,
    },

    ProgressUpdate {
        #[ts(type = "string")]
        run_id: Uuid,
        progress: ProgressState,
    },

    /// The worker announced the final video before exiting.
    VideoReady {
        #[ts(type = "string")]
        run_id: Uuid,
        filename: Option<String>,
    },

    /// The worker exited on its own.
    RunFinished {
        #[ts(type = "string")]
        run_id: Uuid,
        outcome: RunOutcome,
    },

    /// The worker was stopped by the operator.
    RunStopped {
        #[ts(type = "string")]
        run_id: Uuid,
    },

    /// The worker could not be launched.
    LaunchFailed { error: String },

    CacheCleared { ok: bool, message: String },

    /// An operator command could not be delivered, e.g. an answer with no
    /// worker running.
    ControlRejected { error: String },
}
