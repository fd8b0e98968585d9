//! Cooperative shutdown for a sync run.
//!
//! SIGTERM and SIGINT (Ctrl+C elsewhere) flip a `watch` flag that the sync
//! engine checks between entries. An entry already sent is allowed to
//! finish so the ledger stays consistent with the remote calendar.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

/// A handle for triggering or checking shutdown status.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    /// Creates a handle in the not-shut-down state.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Triggers a shutdown.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    /// Returns true if shutdown has been triggered.
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Returns a receiver for the sync engine.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }

    /// Spawns a task that triggers shutdown on SIGTERM or SIGINT.
    #[cfg(unix)]
    pub fn spawn_signal_listener(&self) {
        let tx = self.tx.clone();

        tokio::spawn(async move {
            use tokio::signal::unix::{SignalKind, signal};

            let (mut sigterm, mut sigint) =
                match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                    (Ok(term), Ok(int)) => (term, int),
                    (Err(e), _) | (_, Err(e)) => {
                        warn!(error = %e, "failed to install signal handlers");
                        return;
                    }
                };

            tokio::select! {
                _ = sigterm.recv() => info!("received SIGTERM, stopping after the current entry"),
                _ = sigint.recv() => info!("received SIGINT, stopping after the current entry"),
            }
            let _ = tx.send(true);
            debug!("signal listener stopped");
        });
    }

    /// Spawns a task that triggers shutdown on Ctrl+C.
    #[cfg(not(unix))]
    pub fn spawn_signal_listener(&self) {
        let tx = self.tx.clone();

        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("received Ctrl+C, stopping after the current entry");
                let _ = tx.send(true);
            }
        });
    }
}
