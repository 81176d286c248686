//! Service registration and coordinated shutdown.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// A long-running component of the process (web server, worker pool).
///
/// Services run until their shutdown receiver fires, then drain and return.
#[async_trait]
pub trait Service: Send {
    async fn run(self: Box<Self>, shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()>;
}

/// Owns registered services and their spawned tasks.
pub struct ServiceManager {
    pending: Vec<(&'static str, Box<dyn Service>)>,
    running: Vec<(&'static str, JoinHandle<anyhow::Result<()>>)>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Default for ServiceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            pending: Vec::new(),
            running: Vec::new(),
            shutdown_tx,
        }
    }

    pub fn register_service(&mut self, name: &'static str, service: Box<dyn Service>) {
        self.pending.push((name, service));
    }

    pub fn has_services(&self) -> bool {
        !self.pending.is_empty() || !self.running.is_empty()
    }

    /// Spawns every registered service on the runtime.
    pub fn spawn_all(&mut self) {
        for (name, service) in self.pending.drain(..) {
            let shutdown_rx = self.shutdown_tx.subscribe();
            let handle = tokio::spawn(async move { service.run(shutdown_rx).await });
            info!(service = name, "service spawned");
            self.running.push((name, handle));
        }
    }

    /// Broadcasts shutdown and waits up to `timeout` for each service to
    /// drain. Returns whether every service exited cleanly.
    pub async fn shutdown(mut self, timeout: Duration) -> bool {
        let _ = self.shutdown_tx.send(());

        let mut clean = true;
        for (name, handle) in self.running.drain(..) {
            let abort = handle.abort_handle();
            match tokio::time::timeout(timeout, handle).await {
                Ok(Ok(Ok(()))) => info!(service = name, "service stopped"),
                Ok(Ok(Err(e))) => {
                    error!(service = name, error = ?e, "service exited with error");
                    clean = false;
                }
                Ok(Err(join_error)) => {
                    error!(service = name, error = ?join_error, "service task panicked");
                    clean = false;
                }
                Err(_) => {
                    warn!(service = name, "service did not stop in time, aborting");
                    abort.abort();
                    clean = false;
                }
            }
        }
        clean
    }
}
