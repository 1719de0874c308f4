//! Crash containment: make sure the worker dies and artifacts are removed
//! even when the controller itself panics.

use super::RunManager;
use std::future::Future;

/// Runs `fut` in its own task. If it panics the worker is shut down and
/// `None` is returned instead of propagating the panic.
pub async fn supervise<F, T>(manager: RunManager, fut: F) -> Option<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(fut).await {
        Ok(value) => Some(value),
        Err(e) if e.is_panic() => {
            let message = panic_message(e.into_panic());
            tracing::error!(panic = %message, "Supervised task panicked; shutting down worker");
            manager.shutdown().await;
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Supervised task was cancelled");
            None
        }
    }
}

/// Chains a panic hook that kills the worker and cleans up before the
/// previous hook runs.
pub fn install_panic_hook(manager: RunManager) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        manager.emergency_shutdown_blocking();
        previous(info);
    }));
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
