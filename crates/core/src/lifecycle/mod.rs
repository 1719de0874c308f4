//! Run lifecycle: the single active worker, its session, and teardown.
//!
//! [`RunManager`] owns the at-most-one running worker. Starting reserves the
//! slot before launching, so two concurrent starts cannot both spawn. The
//! spawned session task owns the `Child`; the manager keeps only its pid and
//! a control channel, which is enough to answer prompts, stop, or kill.

pub mod cleanup;
pub mod guard;
pub mod outcome;
mod session;
pub mod signal;

use crate::config::AppPaths;
use crate::demux;
use crate::launcher::command::YOUTUBE_KEY_ENV;
use crate::launcher::credentials;
use crate::launcher::LaunchError;
use crate::launcher::WorkerLauncher;
use crate::router::PromptRouter;
use crate::state::worker;
use cleanup::CleanupReport;
use session::Session;
use session::SessionControl;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::TryLockError;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Child;
use tokio::process::ChildStderr;
use tokio::process::ChildStdin;
use tokio::process::ChildStdout;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use uuid::Uuid;
use vfm_protocol::Event;
use vfm_protocol::LaunchConfiguration;
use vfm_protocol::PromptAnswer;
use vfm_protocol::RunOutcome;

/// Default delay before a stop escalates to a forceful kill.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_millis(500);

/// Errors delivering an operator command to the worker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("No active process")]
    NoActiveProcess,

    #[error("The worker session has already ended")]
    SessionClosed,
}

struct ActiveRun {
    run_id: Uuid,
    /// Cleared once the worker has been reaped, so no signal can reach a
    /// recycled pid while the session drains leftover output.
    pid: Option<u32>,
    exited: bool,
    control_tx: mpsc::UnboundedSender<SessionControl>,
}

enum Slot {
    Idle,
    /// Reserved by a `start` whose launch is in flight.
    Launching { run_id: Uuid },
    Active(ActiveRun),
}

struct Inner {
    slot: Mutex<Slot>,
    launcher: Arc<dyn WorkerLauncher>,
    paths: AppPaths,
    stop_grace: Duration,
    events_tx: mpsc::Sender<Event>,
}

/// Handle to a started run.
#[derive(Debug)]
pub struct RunHandle {
    pub run_id: Uuid,
    outcome: oneshot::Receiver<RunOutcome>,
}

impl RunHandle {
    /// Waits for the worker to exit. `None` if the session task vanished
    /// without reporting, e.g. on runtime shutdown.
    pub async fn wait(self) -> Option<RunOutcome> {
        self.outcome.await.ok()
    }
}

/// Result of [`RunManager::stop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopReport {
    /// Whether a spawned worker was signalled.
    pub had_process: bool,
    pub run_id: Option<Uuid>,
    pub cleanup: CleanupReport,
}

/// Owner of the at-most-one running worker.
#[derive(Clone)]
pub struct RunManager {
    inner: Arc<Inner>,
}

impl RunManager {
    pub fn new(
        launcher: Arc<dyn WorkerLauncher>,
        paths: AppPaths,
        stop_grace: Duration,
        events_tx: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(Slot::Idle),
                launcher,
                paths,
                stop_grace,
                events_tx,
            }),
        }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.inner.paths
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.inner
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn emit(&self, event: Event) {
        let _ = self.inner.events_tx.send(event).await;
    }

    /// Launches a worker for `config` and starts its session.
    ///
    /// # Errors
    ///
    /// - [`LaunchError::AlreadyRunning`] if a run is active or launching
    /// - [`LaunchError::Cancelled`] if `stop` was called while launching
    /// - any error from the launcher; these are also emitted as
    ///   [`Event::LaunchFailed`]
    pub async fn start(&self, config: LaunchConfiguration) -> Result<RunHandle, LaunchError> {
        let run_id = Uuid::new_v4();
        {
            let mut slot = self.slot();
            if !matches!(*slot, Slot::Idle) {
                return Err(LaunchError::AlreadyRunning);
            }
            *slot = Slot::Launching { run_id };
        }

        let mut child = match self.inner.launcher.launch(&config).await {
            Ok(child) => child,
            Err(e) => return Err(self.fail_launch(run_id, e).await),
        };

        let (stdin, stdout, stderr) = match take_pipes(&mut child) {
            Ok(pipes) => pipes,
            Err(e) => {
                let _ = child.start_kill();
                return Err(self.fail_launch(run_id, e).await);
            }
        };

        let pid = child.id();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let still_reserved = {
            let mut slot = self.slot();
            let reserved =
                matches!(&*slot, Slot::Launching { run_id: reserved } if *reserved == run_id);
            if reserved {
                *slot = Slot::Active(ActiveRun {
                    run_id,
                    pid,
                    exited: false,
                    control_tx,
                });
            }
            reserved
        };
        if !still_reserved {
            tracing::info!(%run_id, "Launch cancelled by stop; killing fresh worker");
            let _ = child.start_kill();
            return Err(LaunchError::Cancelled);
        }

        tracing::info!(%run_id, pid = ?pid, "Worker started");
        let worker = worker::start_worker(run_id, pid, &self.inner.events_tx).await;

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let session = Session::new(
            worker,
            PromptRouter::new(config),
            stdin,
            self.clone(),
            self.inner.events_tx.clone(),
        );
        tokio::spawn(session.run(
            child,
            demux::chunks(stdout, stderr),
            control_rx,
            outcome_tx,
        ));

        Ok(RunHandle {
            run_id,
            outcome: outcome_rx,
        })
    }

    async fn fail_launch(&self, run_id: Uuid, error: LaunchError) -> LaunchError {
        {
            let mut slot = self.slot();
            if matches!(&*slot, Slot::Launching { run_id: reserved } if *reserved == run_id) {
                *slot = Slot::Idle;
            }
        }
        tracing::error!(%run_id, error = %error, "Worker launch failed");
        self.emit(Event::LaunchFailed {
            error: error.to_string(),
        })
        .await;
        error
    }

    /// Whether a worker is running or being launched.
    pub fn is_running(&self) -> bool {
        !matches!(*self.slot(), Slot::Idle)
    }

    pub fn current_run_id(&self) -> Option<Uuid> {
        match &*self.slot() {
            Slot::Idle => None,
            Slot::Launching { run_id } => Some(*run_id),
            Slot::Active(active) => Some(active.run_id),
        }
    }

    /// Stops the active worker without waiting for it to exit.
    ///
    /// The handle is cleared immediately and SIGTERM is sent. If the signal
    /// cannot be delivered a forceful kill follows after the stop grace.
    /// Cleanup runs whether or not a worker was running.
    ///
    /// A worker that has already exited is not signalled; its session keeps
    /// the slot until it reports the real outcome.
    pub async fn stop(&self) -> StopReport {
        let (exited_run, taken) = {
            let mut slot = self.slot();
            let exited_run = match &*slot {
                Slot::Active(active) if active.exited => Some(active.run_id),
                _ => None,
            };
            let taken = match exited_run {
                Some(_) => Slot::Idle,
                None => std::mem::replace(&mut *slot, Slot::Idle),
            };
            (exited_run, taken)
        };

        if let Some(run_id) = exited_run {
            tracing::debug!(%run_id, "Stop requested after worker exited; nothing to signal");
            return StopReport {
                had_process: false,
                run_id: Some(run_id),
                cleanup: cleanup::cleanup_artifacts(&self.inner.paths),
            };
        }

        let (had_process, run_id) = match taken {
            Slot::Idle => {
                tracing::debug!("Stop requested with no active process");
                (false, None)
            }
            Slot::Launching { run_id } => (false, Some(run_id)),
            Slot::Active(active) => {
                worker::mark_exiting(active.run_id, &self.inner.events_tx).await;
                let delivered = active.pid.is_some_and(signal::terminate);
                tracing::info!(run_id = %active.run_id, delivered, "Sent SIGTERM to worker");
                if !delivered {
                    let control_tx = active.control_tx.clone();
                    let grace = self.inner.stop_grace;
                    tokio::spawn(async move {
                        tokio::time::sleep(grace).await;
                        let _ = control_tx.send(SessionControl::ForceKill);
                    });
                }
                (true, Some(active.run_id))
            }
        };

        let cleanup = cleanup::cleanup_artifacts(&self.inner.paths);
        if let Some(run_id) = run_id {
            self.emit(Event::RunStopped { run_id }).await;
        }

        StopReport {
            had_process,
            run_id,
            cleanup,
        }
    }

    /// Forwards an operator answer to the running session.
    pub fn answer(&self, answer: PromptAnswer) -> Result<(), ControlError> {
        let slot = self.slot();
        let Slot::Active(active) = &*slot else {
            return Err(ControlError::NoActiveProcess);
        };
        active
            .control_tx
            .send(SessionControl::Answer(answer))
            .map_err(|_| ControlError::SessionClosed)
    }

    /// Hands a replacement YouTube key to the worker and persists it in the
    /// credential file. Persistence failures are logged only.
    pub fn provide_api_key(&self, key: String) -> Result<(), ControlError> {
        self.answer(PromptAnswer::NewApiKey(key.clone()))?;

        let env_file = self.inner.paths.env_file();
        match credentials::replace_key(&env_file, YOUTUBE_KEY_ENV, &key) {
            Ok(true) => tracing::info!(path = %env_file.display(), "Updated YouTube API key"),
            Ok(false) => tracing::debug!(path = %env_file.display(), "No YouTube API key line to update"),
            Err(e) => {
                tracing::warn!(path = %env_file.display(), error = %e, "Failed to update YouTube API key")
            }
        }
        Ok(())
    }

    /// Kills any worker and cleans up. Safe to call repeatedly.
    pub async fn shutdown(&self) -> CleanupReport {
        let taken = std::mem::replace(&mut *self.slot(), Slot::Idle);
        let killed = kill_taken(taken);
        let report = cleanup::cleanup_artifacts(&self.inner.paths);
        if let Some(run_id) = killed {
            self.emit(Event::RunStopped { run_id }).await;
        }
        report
    }

    /// Synchronous shutdown for panic hooks. Emits no events and
    /// never blocks on the slot lock.
    pub fn emergency_shutdown_blocking(&self) -> CleanupReport {
        match self.inner.slot.try_lock() {
            Ok(mut slot) => {
                kill_taken(std::mem::replace(&mut *slot, Slot::Idle));
            }
            Err(TryLockError::Poisoned(poisoned)) => {
                kill_taken(std::mem::replace(&mut *poisoned.into_inner(), Slot::Idle));
            }
            Err(TryLockError::WouldBlock) => {
                tracing::warn!("Run state locked during emergency shutdown; skipping kill");
            }
        }
        cleanup::cleanup_artifacts(&self.inner.paths)
    }

    /// Records that the worker for `run_id` has been reaped. Returns false if
    /// the run was stopped or shut down before it exited.
    pub(crate) fn mark_reaped(&self, run_id: Uuid) -> bool {
        let mut slot = self.slot();
        match &mut *slot {
            Slot::Active(active) if active.run_id == run_id => {
                active.pid = None;
                active.exited = true;
                true
            }
            _ => false,
        }
    }

    /// Clears the slot if it still belongs to `run_id`. Returns whether it did.
    pub(crate) fn release(&self, run_id: Uuid) -> bool {
        let mut slot = self.slot();
        match &*slot {
            Slot::Active(active) if active.run_id == run_id => {
                *slot = Slot::Idle;
                true
            }
            _ => false,
        }
    }
}

fn take_pipes(child: &mut Child) -> Result<(ChildStdin, ChildStdout, ChildStderr), LaunchError> {
    let stdin = child.stdin.take().ok_or(LaunchError::MissingPipe("stdin"))?;
    let stdout = child.stdout.take().ok_or(LaunchError::MissingPipe("stdout"))?;
    let stderr = child.stderr.take().ok_or(LaunchError::MissingPipe("stderr"))?;
    Ok((stdin, stdout, stderr))
}

/// Force-kills whatever `taken` referenced. Returns the killed run's id.
fn kill_taken(taken: Slot) -> Option<Uuid> {
    match taken {
        Slot::Active(active) if active.exited => None,
        Slot::Active(active) => {
            let _ = active.control_tx.send(SessionControl::ForceKill);
            if let Some(pid) = active.pid {
                signal::kill(pid);
            }
            tracing::info!(run_id = %active.run_id, "Killed worker on shutdown");
            Some(active.run_id)
        }
        Slot::Launching { run_id } => Some(run_id),
        Slot::Idle => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NoWorker;

    #[async_trait]
    impl WorkerLauncher for NoWorker {
        async fn launch(&self, _config: &LaunchConfiguration) -> Result<Child, LaunchError> {
            Err(LaunchError::WorkerNotFound {
                searched: Vec::new(),
            })
        }
    }

    fn manager(paths: AppPaths) -> (RunManager, mpsc::Receiver<Event>) {
        let (events_tx, events_rx) = mpsc::channel(16);
        let manager = RunManager::new(
            Arc::new(NoWorker),
            paths,
            Duration::from_millis(50),
            events_tx,
        );
        (manager, events_rx)
    }

    /// Puts a run straight into the slot, as `start` would after spawning.
    fn activate(
        manager: &RunManager,
        pid: Option<u32>,
    ) -> (Uuid, mpsc::UnboundedReceiver<SessionControl>) {
        let run_id = Uuid::new_v4();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        *manager.slot() = Slot::Active(ActiveRun {
            run_id,
            pid,
            exited: false,
            control_tx,
        });
        (run_id, control_rx)
    }

    #[tokio::test]
    async fn test_stop_escalates_to_force_kill_when_signal_not_delivered() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _events) = manager(AppPaths::new(dir.path()));
        let (run_id, mut control_rx) = activate(&manager, None);

        let report = manager.stop().await;
        assert!(report.had_process);
        assert_eq!(report.run_id, Some(run_id));
        assert!(!manager.is_running());

        let control = tokio::time::timeout(Duration::from_secs(2), control_rx.recv())
            .await
            .expect("force kill should follow the stop grace");
        assert!(matches!(control, Some(SessionControl::ForceKill)));
    }

    #[tokio::test]
    async fn test_stop_after_reap_signals_nothing_and_keeps_slot() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, mut events) = manager(AppPaths::new(dir.path()));
        let (run_id, mut control_rx) = activate(&manager, Some(4242));

        assert!(manager.mark_reaped(run_id));
        let report = manager.stop().await;

        assert!(!report.had_process);
        assert_eq!(report.run_id, Some(run_id));
        assert!(manager.is_running(), "the session still owns the slot");
        assert!(events.try_recv().is_err(), "no RunStopped for an exited worker");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(control_rx.try_recv().is_err());

        assert!(manager.release(run_id));
        assert!(!manager.is_running());
    }

    #[test]
    fn test_mark_reaped_after_stop_reports_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _events) = manager(AppPaths::new(dir.path()));
        let (run_id, _control_rx) = activate(&manager, None);

        *manager.slot() = Slot::Idle;
        assert!(!manager.mark_reaped(run_id));
        assert!(!manager.release(run_id));
    }

    #[test]
    fn test_emergency_shutdown_kills_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::new(dir.path());
        std::fs::create_dir_all(paths.clips_dir().join("song_1")).unwrap();
        std::fs::create_dir_all(paths.cache_dir()).unwrap();
        std::fs::write(paths.progress_file(), "{}").unwrap();

        let (manager, _events) = manager(paths.clone());
        let (_run_id, mut control_rx) = activate(&manager, None);

        let report = manager.emergency_shutdown_blocking();

        assert!(report.is_clean());
        assert!(!manager.is_running());
        assert!(!paths.clips_dir().exists());
        assert!(!paths.progress_file().exists());
        assert!(matches!(control_rx.try_recv(), Ok(SessionControl::ForceKill)));
    }

    #[test]
    fn test_emergency_shutdown_skips_kill_while_locked() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _events) = manager(AppPaths::new(dir.path()));
        let (_run_id, mut control_rx) = activate(&manager, None);

        let held = manager.inner.slot.lock().unwrap();
        manager.emergency_shutdown_blocking();
        drop(held);

        assert!(manager.is_running());
        assert!(control_rx.try_recv().is_err());
    }
}
