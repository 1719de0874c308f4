//! Termination signals for the operator shell.
//!
//! Closing the terminal sends SIGHUP and a system quit sends SIGTERM. Both
//! end the UI through the normal exit path, so the worker is killed and its
//! artifacts are removed.

#[cfg(unix)]
use tokio::signal::unix::signal;
#[cfg(unix)]
use tokio::signal::unix::Signal;
#[cfg(unix)]
use tokio::signal::unix::SignalKind;

pub struct Termination {
    #[cfg(unix)]
    signals: Option<(Signal, Signal)>,
}

impl Termination {
    /// Registers the handlers. Must be called inside a Tokio runtime.
    #[cfg(unix)]
    pub fn install() -> Self {
        let signals = match (signal(SignalKind::terminate()), signal(SignalKind::hangup())) {
            (Ok(term), Ok(hup)) => Some((term, hup)),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "Failed to install termination signal handlers");
                None
            }
        };
        Self { signals }
    }

    #[cfg(not(unix))]
    pub fn install() -> Self {
        Self {}
    }

    /// Resolves with the signal's name. Pends forever without handlers.
    pub async fn recv(&mut self) -> &'static str {
        #[cfg(unix)]
        if let Some((term, hup)) = self.signals.as_mut() {
            return tokio::select! {
                _ = term.recv() => "SIGTERM",
                _ = hup.recv() => "SIGHUP",
            };
        }
        std::future::pending().await
    }
}
