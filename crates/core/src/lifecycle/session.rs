//! The per-run session task.
//!
//! A session is the only reader of the worker's output and the only writer
//! to its stdin. It multiplexes three sources: output chunks, operator
//! control messages and the child's exit. Each chunk is handled to completion
//! before the next one is polled, so auto-answers are written in prompt order.

use super::outcome;
use super::RunManager;
use crate::demux::ChunkStream;
use crate::demux::OutputChunk;
use crate::demux::StreamKind;
use crate::progress::ProgressEstimator;
use crate::router::PromptRouter;
use crate::router::RouterAction;
use crate::state::worker;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Child;
use tokio::process::ChildStdin;
use tokio::sync::mpsc;
use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot;
use tokio_stream::StreamExt;
use uuid::Uuid;
use vfm_protocol::Event;
use vfm_protocol::PromptAnswer;
use vfm_protocol::RunOutcome;
use vfm_protocol::WorkerProcess;

/// How long to keep reading after exit when a grandchild still holds the
/// pipes open.
const DRAIN_AFTER_EXIT: Duration = Duration::from_secs(2);

pub(crate) const STOPPED_BY_USER: &str = "Process stopped by user";

/// Messages from the manager to a running session.
#[derive(Debug)]
pub(crate) enum SessionControl {
    Answer(PromptAnswer),
    ForceKill,
}

pub(crate) struct Session {
    run_id: Uuid,
    worker: WorkerProcess,
    router: PromptRouter,
    estimator: ProgressEstimator,
    stdin: Option<ChildStdin>,
    manager: RunManager,
    events_tx: Sender<Event>,
}

impl Session {
    pub(crate) fn new(
        worker: WorkerProcess,
        router: PromptRouter,
        stdin: ChildStdin,
        manager: RunManager,
        events_tx: Sender<Event>,
    ) -> Self {
        Self {
            run_id: worker.run_id,
            worker,
            router,
            estimator: ProgressEstimator::new(),
            stdin: Some(stdin),
            manager,
            events_tx,
        }
    }

    /// Drives the run until the worker exits and its output is drained.
    pub(crate) async fn run(
        mut self,
        mut child: Child,
        mut chunks: ChunkStream,
        mut control_rx: mpsc::UnboundedReceiver<SessionControl>,
        outcome_tx: oneshot::Sender<RunOutcome>,
    ) {
        let mut output_done = false;
        let mut control_open = true;
        let mut exit_code: Option<Option<i32>> = None;
        let mut stopped = false;
        let drain_deadline = tokio::time::sleep(Duration::MAX);
        tokio::pin!(drain_deadline);

        while !(output_done && exit_code.is_some()) {
            tokio::select! {
                chunk = chunks.next(), if !output_done => match chunk {
                    Some(chunk) => self.handle_chunk(chunk).await,
                    None => output_done = true,
                },
                control = control_rx.recv(), if control_open => match control {
                    Some(SessionControl::Answer(answer)) => {
                        let line = self.router.answer(&answer);
                        self.write_line(&line).await;
                    }
                    Some(SessionControl::ForceKill) => {
                        tracing::info!(run_id = %self.run_id, "Force-killing worker");
                        if let Err(e) = child.start_kill() {
                            tracing::debug!(error = %e, "Force kill failed; worker already gone");
                        }
                    }
                    None => control_open = false,
                },
                status = child.wait(), if exit_code.is_none() => {
                    let code = match status {
                        Ok(status) => status.code(),
                        Err(e) => {
                            tracing::warn!(run_id = %self.run_id, error = %e, "Failed to wait on worker");
                            None
                        }
                    };
                    tracing::info!(run_id = %self.run_id, exit_code = ?code, "Worker exited");
                    stopped = !self.manager.mark_reaped(self.run_id);
                    worker::mark_exited(&mut self.worker, code, &self.events_tx).await;
                    exit_code = Some(code);
                    drain_deadline
                        .as_mut()
                        .reset(tokio::time::Instant::now() + DRAIN_AFTER_EXIT);
                },
                _ = &mut drain_deadline, if exit_code.is_some() => {
                    tracing::debug!(run_id = %self.run_id, "Output still open after exit; giving up");
                    break;
                }
            }
        }

        self.finish(exit_code.flatten(), stopped, outcome_tx).await;
    }

    async fn handle_chunk(&mut self, chunk: OutputChunk) {
        let run_id = self.run_id;
        let actions = self.router.route(&chunk);
        let progressed = self.estimator.observe(&chunk.text);

        match chunk.stream {
            StreamKind::Primary => worker::emit_output(run_id, chunk.text, &self.events_tx).await,
            StreamKind::Diagnostic => worker::emit_error(run_id, chunk.text, &self.events_tx).await,
        }

        for action in actions {
            match action {
                RouterAction::Respond { kind, text } => {
                    if self.write_line(&text).await {
                        let _ = self
                            .events_tx
                            .send(Event::AutoAnswered { run_id, kind })
                            .await;
                    }
                }
                RouterAction::Raise(prompt) => {
                    let _ = self
                        .events_tx
                        .send(Event::PromptRaised { run_id, prompt })
                        .await;
                }
                RouterAction::CompletionObserved { filename } => {
                    let _ = self
                        .events_tx
                        .send(Event::VideoReady { run_id, filename })
                        .await;
                }
            }
        }

        if progressed {
            let progress = self.estimator.snapshot().clone();
            let _ = self
                .events_tx
                .send(Event::ProgressUpdate { run_id, progress })
                .await;
        }
    }

    /// Writes one line to the worker. A failed write closes stdin for the
    /// rest of the run and is reported as a worker error.
    async fn write_line(&mut self, line: &str) -> bool {
        let Some(stdin) = self.stdin.as_mut() else {
            worker::emit_error(
                self.run_id,
                "Worker input is closed; answer dropped".to_string(),
                &self.events_tx,
            )
            .await;
            return false;
        };

        let result = match stdin.write_all(line.as_bytes()).await {
            Ok(()) => stdin.flush().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(run_id = %self.run_id, error = %e, "Failed to write to worker stdin");
                self.stdin = None;
                worker::emit_error(
                    self.run_id,
                    format!("Failed to write to worker: {}", e),
                    &self.events_tx,
                )
                .await;
                false
            }
        }
    }

    /// Frees the slot and reports the outcome. `stopped` is decided when the
    /// worker is reaped, so a stop that arrives during the drain does not
    /// turn a clean exit into a failure.
    async fn finish(
        mut self,
        exit_code: Option<i32>,
        stopped: bool,
        outcome_tx: oneshot::Sender<RunOutcome>,
    ) {
        self.stdin = None;
        self.manager.release(self.run_id);

        let outcome = if !stopped {
            let outcome = outcome::resolve_outcome(
                exit_code,
                self.router.transcript(),
                &self.manager.paths().videos_dir(),
            );
            let _ = self
                .events_tx
                .send(Event::RunFinished {
                    run_id: self.run_id,
                    outcome: outcome.clone(),
                })
                .await;
            outcome
        } else {
            // The run was stopped; the manager already reported it.
            RunOutcome::Failed {
                exit_code,
                error: STOPPED_BY_USER.to_string(),
            }
        };

        let _ = outcome_tx.send(outcome);
    }
}
