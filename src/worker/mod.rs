//! The worker plane: job consumption, solving, persistence, recovery.

pub mod gather;
pub mod reaper;
pub mod worker;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::info;

use crate::data::DbContext;
use crate::services::Service;
use crate::solver::SolverSettings;
use crate::state::{ServiceStatusRegistry, ServiceStatus};
use reaper::Reaper;
use worker::Worker;

/// Runs a pool of workers plus the abandoned-run reaper.
pub struct WorkerService {
    db: DbContext,
    settings: SolverSettings,
    worker_count: usize,
    statuses: ServiceStatusRegistry,
}

impl WorkerService {
    pub fn new(
        db: DbContext,
        settings: SolverSettings,
        worker_count: usize,
        statuses: ServiceStatusRegistry,
    ) -> Self {
        Self {
            db,
            settings,
            worker_count,
            statuses,
        }
    }
}

#[async_trait]
impl Service for WorkerService {
    async fn run(self: Box<Self>, shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        self.statuses.set("worker", ServiceStatus::Active);
        info!(workers = self.worker_count, "worker service starting");

        let mut handles = Vec::with_capacity(self.worker_count + 1);
        for id in 0..self.worker_count {
            let worker = Worker::new(id, self.db.clone(), self.settings);
            let rx = shutdown_rx.resubscribe();
            handles.push(tokio::spawn(async move { worker.run(rx).await }));
        }

        let reaper = Reaper::new(self.db.clone(), self.settings.time_limit);
        let rx = shutdown_rx.resubscribe();
        handles.push(tokio::spawn(async move { reaper.run(rx).await }));

        for handle in handles {
            if let Err(e) = handle.await {
                self.statuses.set("worker", ServiceStatus::Error);
                return Err(e.into());
            }
        }
        info!("worker service stopped");
        Ok(())
    }
}
