//! Worker status transitions.
//!
//! Each transition updates the [`WorkerProcess`] record and emits the matching
//! event. Send failures are ignored: a closed event channel means the UI is
//! gone and the worker is being torn down anyway.

use tokio::sync::mpsc::Sender;
use uuid::Uuid;
use vfm_protocol::Event;
use vfm_protocol::WorkerProcess;
use vfm_protocol::WorkerStatus;

async fn emit_status(worker: &WorkerProcess, events_tx: &Sender<Event>) {
    let _ = events_tx
        .send(Event::WorkerStatusUpdate {
            run_id: worker.run_id,
            status: worker.status,
        })
        .await;
}

/// Record a freshly spawned worker and announce the run.
pub async fn start_worker(
    run_id: Uuid,
    pid: Option<u32>,
    events_tx: &Sender<Event>,
) -> WorkerProcess {
    let worker = WorkerProcess::spawned(run_id, pid);
    let _ = events_tx.send(Event::RunStarted { run_id }).await;
    emit_status(&worker, events_tx).await;
    worker
}

/// A stop was requested; the OS has not reported the exit yet.
pub async fn mark_exiting(run_id: Uuid, events_tx: &Sender<Event>) {
    let _ = events_tx
        .send(Event::WorkerStatusUpdate {
            run_id,
            status: WorkerStatus::Exiting,
        })
        .await;
}

/// The worker exited with `exit_code` (`None` for a signal).
pub async fn mark_exited(
    worker: &mut WorkerProcess,
    exit_code: Option<i32>,
    events_tx: &Sender<Event>,
) {
    worker.mark_exited(exit_code);
    emit_status(worker, events_tx).await;
}

/// Forward primary output text.
pub async fn emit_output(run_id: Uuid, content: String, events_tx: &Sender<Event>) {
    let _ = events_tx.send(Event::WorkerOutput { run_id, content }).await;
}

/// Forward diagnostic output or a runtime I/O error.
pub async fn emit_error(run_id: Uuid, error: String, events_tx: &Sender<Event>) {
    let _ = events_tx.send(Event::WorkerError { run_id, error }).await;
}
