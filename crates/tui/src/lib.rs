//! # vfm-tui
//!
//! Terminal operator shell for videofm-kit.
//!
//! The TUI holds the launch form, log panel, progress gauge and prompt
//! modals. It talks to `vfm-core` only through the `Op`/`Event` channel
//! protocol defined in `vfm-protocol`; [`run_app`] wires the two together.

pub mod app;
pub mod event_handler;
pub mod signals;
pub mod tui;
pub mod widgets;

pub use app::App;
pub use tui::Tui;

use anyhow::Result;
use signals::Termination;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use vfm_core::config::AppPaths;
use vfm_core::config::AppSettings;
use vfm_core::engine::Controller;
use vfm_core::launcher::ProcessLauncher;
use vfm_core::lifecycle::guard;
use vfm_core::lifecycle::RunManager;
use vfm_protocol::Op;

/// Capacity of the core-to-UI event channel.
const EVENT_BUFFER: usize = 1024;

/// Runs the operator shell until the operator quits.
///
/// The worker is killed and run artifacts are cleaned up on every exit
/// path: a normal quit, a UI or terminal error, SIGTERM, SIGHUP (the
/// terminal was closed) and a panic in the UI.
pub async fn run_app(paths: AppPaths, settings: AppSettings) -> Result<()> {
    let (op_tx, op_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);

    let launcher = Arc::new(ProcessLauncher::new(paths.clone(), &settings));
    let manager = RunManager::new(launcher, paths, settings.run.stop_grace(), event_tx.clone());
    guard::install_panic_hook(manager.clone());
    let mut termination = Termination::install();

    let controller = Controller::new(manager.clone(), event_tx);
    let core = tokio::spawn(controller.run(op_rx));
    tracing::info!("Core controller started");

    let mut app = App::new(op_tx.clone(), event_rx, &settings.run.default_codec);
    let (result, restored) = match Tui::init() {
        Ok(mut tui) => {
            let result = tokio::select! {
                result = app.run(&mut tui) => result,
                signal = termination.recv() => {
                    tracing::info!(signal, "Termination signal received; shutting down");
                    Ok(())
                }
            };
            (result, tui.restore())
        }
        Err(e) => (Err(e), Ok(())),
    };

    // Dropping the app closes the event receiver so the controller never
    // blocks on a full channel while shutting down.
    drop(app);
    finish(result, restored, op_tx, core, &manager).await
}

/// Stops the controller and the worker, then reports the first error from
/// the UI or from restoring the terminal.
async fn finish(
    result: Result<()>,
    restored: Result<()>,
    op_tx: UnboundedSender<Op>,
    core: JoinHandle<()>,
    manager: &RunManager,
) -> Result<()> {
    let _ = op_tx.send(Op::Shutdown);
    if let Err(e) = core.await {
        tracing::error!(error = %e, "Core controller task failed");
    }
    manager.shutdown().await;
    tracing::info!("Operator shell exited");

    result.and(restored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_restore_failure_still_shuts_down_core() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::new(dir.path());
        std::fs::create_dir_all(paths.clips_dir().join("song_1")).unwrap();

        let (op_tx, op_rx) = mpsc::unbounded_channel();
        let (event_tx, _event_rx) = mpsc::channel(16);
        let launcher = Arc::new(ProcessLauncher::new(paths.clone(), &AppSettings::default()));
        let manager = RunManager::new(
            launcher,
            paths.clone(),
            std::time::Duration::from_millis(50),
            event_tx.clone(),
        );
        let core = tokio::spawn(Controller::new(manager.clone(), event_tx).run(op_rx));

        let result = finish(
            Ok(()),
            Err(anyhow::anyhow!("terminal is gone")),
            op_tx.clone(),
            core,
            &manager,
        )
        .await;

        assert_eq!(result.unwrap_err().to_string(), "terminal is gone");
        assert!(op_tx.is_closed(), "controller should have exited");
        assert!(!paths.clips_dir().exists());
    }

    #[tokio::test]
    async fn test_ui_error_wins_over_restore_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::new(dir.path());
        let (op_tx, op_rx) = mpsc::unbounded_channel();
        let (event_tx, _event_rx) = mpsc::channel(16);
        let launcher = Arc::new(ProcessLauncher::new(paths.clone(), &AppSettings::default()));
        let manager = RunManager::new(
            launcher,
            paths,
            std::time::Duration::from_millis(50),
            event_tx.clone(),
        );
        let core = tokio::spawn(Controller::new(manager.clone(), event_tx).run(op_rx));

        let result = finish(
            Err(anyhow::anyhow!("draw failed")),
            Err(anyhow::anyhow!("terminal is gone")),
            op_tx,
            core,
            &manager,
        )
        .await;

        assert_eq!(result.unwrap_err().to_string(), "draw failed");
    }
}
