//! Op dispatcher.
//!
//! The [`Controller`] is the core side of the Op/Event protocol: it receives
//! operator commands from the UI, drives the [`RunManager`], and reports
//! anything that has no natural event of its own (rejected commands, cache
//! clearing) back on the event channel.

use crate::lifecycle::cleanup;
use crate::lifecycle::guard::supervise;
use crate::lifecycle::RunManager;
use crate::launcher::LaunchError;
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::UnboundedReceiver;
use vfm_protocol::Event;
use vfm_protocol::Op;

pub const CACHE_CLEARED: &str = "Cache cleared successfully";
pub const CACHE_BUSY: &str = "Stop the running video before clearing the cache";

#[derive(Clone)]
pub struct Controller {
    manager: RunManager,
    events_tx: Sender<Event>,
}

impl Controller {
    pub fn new(manager: RunManager, events_tx: Sender<Event>) -> Self {
        Self { manager, events_tx }
    }

    pub fn manager(&self) -> &RunManager {
        &self.manager
    }

    async fn emit(&self, event: Event) {
        let _ = self.events_tx.send(event).await;
    }

    /// Handles one operation. Returns `false` once the controller should stop.
    pub async fn handle_op(&self, op: Op) -> bool {
        match op {
            Op::StartRun { config } => {
                if let Err(e) = config.validate() {
                    self.emit(Event::LaunchFailed {
                        error: e.to_string(),
                    })
                    .await;
                    return true;
                }
                match self.manager.start(config).await {
                    Ok(handle) => tracing::debug!(run_id = %handle.run_id, "Run started"),
                    Err(LaunchError::AlreadyRunning) => {
                        self.emit(Event::LaunchFailed {
                            error: LaunchError::AlreadyRunning.to_string(),
                        })
                        .await;
                    }
                    Err(LaunchError::Cancelled) => tracing::debug!("Launch cancelled"),
                    // The manager already emitted LaunchFailed.
                    Err(_) => {}
                }
            }
            Op::StopRun => {
                let report = self.manager.stop().await;
                if report.run_id.is_none() {
                    self.emit(Event::ControlRejected {
                        error: "No active process".to_string(),
                    })
                    .await;
                }
            }
            Op::Answer { answer } => {
                if let Err(e) = self.manager.answer(answer) {
                    tracing::warn!(error = %e, "Answer not delivered");
                    self.emit(Event::ControlRejected {
                        error: e.to_string(),
                    })
                    .await;
                }
            }
            Op::ProvideApiKey { key } => {
                if let Err(e) = self.manager.provide_api_key(key) {
                    tracing::warn!(error = %e, "API key not delivered");
                    self.emit(Event::ControlRejected {
                        error: e.to_string(),
                    })
                    .await;
                }
            }
            Op::ClearCache => {
                let event = if self.manager.is_running() {
                    Event::CacheCleared {
                        ok: false,
                        message: CACHE_BUSY.to_string(),
                    }
                } else {
                    match cleanup::clear_cache(self.manager.paths()) {
                        Ok(()) => Event::CacheCleared {
                            ok: true,
                            message: CACHE_CLEARED.to_string(),
                        },
                        Err(e) => Event::CacheCleared {
                            ok: false,
                            message: format!("Failed to clear cache: {}", e),
                        },
                    }
                };
                self.emit(event).await;
            }
            Op::Shutdown => {
                self.manager.shutdown().await;
                return false;
            }
        }
        true
    }

    /// Processes operations until `Shutdown` or until the UI drops its
    /// sender. Each operation runs under [`supervise`], so a panic while
    /// handling one kills the worker instead of the controller.
    pub async fn run(self, mut op_rx: UnboundedReceiver<Op>) {
        while let Some(op) = op_rx.recv().await {
            let controller = self.clone();
            let keep_going = supervise(self.manager.clone(), async move {
                controller.handle_op(op).await
            })
            .await;
            if keep_going == Some(false) {
                break;
            }
        }
        self.manager.shutdown().await;
        tracing::info!("Controller stopped");
    }
}
