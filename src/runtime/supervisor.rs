use std::future::Future;

use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};

use crate::error::Result;

/// Owns a node's processing units.
///
/// A unit that returns `Err` is logged and not restarted; every other unit
/// keeps running.
#[derive(Default)]
pub struct Supervisor {
    units: JoinSet<(String, Result<()>)>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&mut self, name: impl Into<String>, unit: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let name = name.into();
        self.units.spawn(async move { (name, unit.await) });
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Start watching the units in the background.
    pub fn start(self) -> SupervisorHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let monitor = tokio::spawn(watch_units(self.units, shutdown_rx));
        SupervisorHandle {
            shutdown_tx,
            monitor,
        }
    }
}

async fn watch_units(
    mut units: JoinSet<(String, Result<()>)>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!(units = units.len(), "Stopping processing units");
                units.shutdown().await;
                return;
            }
            joined = units.join_next() => match joined {
                Some(Ok((name, Ok(())))) => info!(unit = %name, "Processing unit finished"),
                Some(Ok((name, Err(e)))) => {
                    error!(
                        unit = %name,
                        error = %e,
                        fatal = e.is_fatal(),
                        "Processing unit stopped"
                    );
                }
                Some(Err(e)) => warn!(error = %e, "Processing unit panicked or was cancelled"),
                None => {
                    // Nothing left to watch; still honor shutdown.
                    let _ = (&mut shutdown).await;
                    return;
                }
            },
        }
    }
}

/// Handle to a running [`Supervisor`].
pub struct SupervisorHandle {
    shutdown_tx: oneshot::Sender<()>,
    monitor: JoinHandle<()>,
}

impl SupervisorHandle {
    /// Abort every unit and wait for them to stop.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.monitor.await {
            warn!(error = %e, "Supervisor monitor task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.monitor.is_finished()
    }
}
