//! Recovery of schedules abandoned by crashed workers.
//!
//! A worker that dies mid-run leaves its schedule in `Running` forever.
//! The reaper periodically sweeps for runs older than three solver budgets
//! and fails them with the `abandoned` classifier, discarding any partial
//! placements they may have written.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time;
use tracing::{error, info, warn};

use crate::data::{DbContext, jobs, scheduled_activities, schedules};

pub struct Reaper {
    db: DbContext,
    /// The solver's wall-clock budget; abandonment cutoff is three times
    /// this.
    time_limit: Duration,
}

impl Reaper {
    pub fn new(db: DbContext, time_limit: Duration) -> Self {
        Self { db, time_limit }
    }

    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("reaper started");
        let mut ticker = time::interval(self.time_limit.max(Duration::from_secs(30)));
        ticker.tick().await; // skip the immediate first tick

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("reaper received shutdown signal, exiting");
                    break;
                }
                _ = ticker.tick() => {
                    self.sweep().await;
                }
            }
        }
    }

    async fn sweep(&self) {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.time_limit * 3)
                .unwrap_or_else(|_| chrono::Duration::seconds(180));

        let stale = match schedules::find_stale_running(&self.db, cutoff).await {
            Ok(stale) => stale,
            Err(e) => {
                warn!(error = ?e, "reaper sweep query failed");
                return;
            }
        };

        for schedule in stale {
            warn!(
                schedule_id = %schedule.id,
                started_at = ?schedule.started_at,
                "abandoned run detected"
            );
            if let Err(e) = scheduled_activities::delete_by_schedule(&self.db, &schedule.id).await
            {
                error!(schedule_id = %schedule.id, error = ?e, "failed to discard partial placements");
            }
            match schedules::mark_failed(&self.db, &schedule.id, "abandoned").await {
                Ok(true) => info!(schedule_id = %schedule.id, "abandoned schedule failed"),
                Ok(false) => {}
                Err(e) => {
                    error!(schedule_id = %schedule.id, error = ?e, "failed to mark abandoned schedule")
                }
            }
            if let Err(e) = jobs::complete(&self.db, &schedule.id).await {
                warn!(schedule_id = %schedule.id, error = ?e, "failed to drop abandoned job");
            }
        }
    }
}
