//! A single schedule-generation worker.
//!
//! Workers poll the job queue, drive the schedule state machine, invoke
//! the solver core, and persist the result. Redelivered jobs fall through
//! the `Draft -> Running` guard and are dropped, which makes the whole
//! pipeline idempotent under at-least-once delivery.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;
use tracing::{Instrument, debug, error, info, warn};

use crate::data::jobs::GenerateJob;
use crate::data::models::{ScheduledActivity, new_id};
use crate::data::{DbContext, jobs, scheduled_activities, schedules};
use crate::solver::{self, Placement, SolverSettings};
use crate::worker::gather;

/// Attempts for the placement insert before giving up.
const PERSIST_ATTEMPTS: u32 = 3;

pub struct Worker {
    id: usize,
    db: DbContext,
    settings: SolverSettings,
}

impl Worker {
    pub fn new(id: usize, db: DbContext, settings: SolverSettings) -> Self {
        Self { id, db, settings }
    }

    /// Runs the worker's main loop until shutdown.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(worker_id = self.id, "worker started");

        loop {
            let job = tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!(worker_id = self.id, "worker received shutdown signal, exiting");
                    break;
                }
                result = jobs::claim_next(&self.db) => {
                    match result {
                        Ok(Some(job)) => job,
                        Ok(None) => {
                            time::sleep(Duration::from_secs(2)).await;
                            continue;
                        }
                        Err(e) => {
                            warn!(worker_id = self.id, error = ?e, "failed to poll job queue, waiting");
                            time::sleep(Duration::from_secs(5)).await;
                            continue;
                        }
                    }
                }
            };

            let span = tracing::info_span!("generate", schedule_id = %job.schedule_id);
            self.process_job(job).instrument(span).await;
        }
    }

    async fn process_job(&self, job: GenerateJob) {
        // Claim the schedule. Anything other than Draft means another
        // delivery already ran (or the schedule is gone): drop the job.
        let schedule = match schedules::try_mark_running(&self.db, &job.schedule_id).await {
            Ok(Some(schedule)) => schedule,
            Ok(None) => {
                info!(worker_id = self.id, "schedule not in draft, dropping job");
                self.finish_job(&job.schedule_id).await;
                return;
            }
            Err(e) => {
                warn!(worker_id = self.id, error = ?e, "failed to claim schedule, releasing job");
                if let Err(release_err) = jobs::release(&self.db, &job.schedule_id).await {
                    error!(worker_id = self.id, error = ?release_err, "failed to release job");
                }
                return;
            }
        };

        let input = match gather::gather(
            &self.db,
            &job.institution_id,
            schedule.time_grid_config.clone(),
        )
        .await
        {
            Ok(input) => input,
            Err(e) => {
                warn!(worker_id = self.id, error = %e, "input gathering failed");
                self.fail_schedule(&job.schedule_id, &e.failure_code()).await;
                self.finish_job(&job.schedule_id).await;
                return;
            }
        };

        // The solver is CPU-bound and synchronous; run it off the async
        // workers so storage and queue traffic keep flowing.
        let settings = self.settings;
        let solve_result =
            tokio::task::spawn_blocking(move || solver::solve(&input, &settings)).await;

        match solve_result {
            Ok(Ok(placements)) => {
                info!(
                    worker_id = self.id,
                    placements = placements.len(),
                    "feasible schedule found"
                );
                self.persist_placements(&job.schedule_id, placements).await;
            }
            Ok(Err(e)) => {
                warn!(worker_id = self.id, error = %e, "schedule generation failed");
                self.fail_schedule(&job.schedule_id, &e.failure_code()).await;
            }
            Err(join_error) => {
                error!(worker_id = self.id, error = ?join_error, "solver task crashed");
                self.fail_schedule(&job.schedule_id, "solver_error").await;
            }
        }

        self.finish_job(&job.schedule_id).await;
    }

    /// Inserts all placements, then flips the schedule to `Completed`. The
    /// status write is the commit signal: readers never observe a partial
    /// placement set as completed.
    async fn persist_placements(&self, schedule_id: &str, placements: Vec<Placement>) {
        let rows: Vec<ScheduledActivity> = placements
            .into_iter()
            .map(|p| ScheduledActivity {
                id: new_id(),
                schedule_id: schedule_id.to_string(),
                activity_id: p.activity_id,
                room_id: p.room_id,
                start_timeslot: p.start_timeslot,
                active_weeks: p.active_weeks,
            })
            .collect();

        let mut last_error = None;
        for attempt in 1..=PERSIST_ATTEMPTS {
            match scheduled_activities::insert_many(&self.db, &rows).await {
                Ok(()) => {
                    last_error = None;
                    break;
                }
                Err(e) => {
                    warn!(
                        worker_id = self.id,
                        attempt,
                        error = ?e,
                        "placement insert failed"
                    );
                    last_error = Some(e);
                    // Remove whatever landed so a retry starts clean.
                    if let Err(cleanup) =
                        scheduled_activities::delete_by_schedule(&self.db, schedule_id).await
                    {
                        warn!(worker_id = self.id, error = ?cleanup, "placement cleanup failed");
                    }
                    time::sleep(Duration::from_millis(250 * 2u64.pow(attempt - 1))).await;
                }
            }
        }

        if let Some(e) = last_error {
            self.fail_schedule(schedule_id, &format!("persist_error:{e}"))
                .await;
            return;
        }

        match schedules::mark_completed(&self.db, schedule_id).await {
            Ok(true) => {
                info!(worker_id = self.id, rows = rows.len(), "schedule completed");
            }
            Ok(false) => {
                // The schedule left Running while we were inserting (e.g.
                // reaped). Its placements must not become visible.
                warn!(
                    worker_id = self.id,
                    "schedule no longer running, discarding placements"
                );
                if let Err(e) = scheduled_activities::delete_by_schedule(&self.db, schedule_id).await
                {
                    error!(worker_id = self.id, error = ?e, "failed to discard placements");
                }
            }
            Err(e) => {
                error!(worker_id = self.id, error = ?e, "failed to mark schedule completed");
                if let Err(cleanup) =
                    scheduled_activities::delete_by_schedule(&self.db, schedule_id).await
                {
                    warn!(worker_id = self.id, error = ?cleanup, "placement cleanup failed");
                }
                self.fail_schedule(schedule_id, &format!("persist_error:{e}"))
                    .await;
            }
        }
    }

    /// Records a terminal failure classifier on the schedule.
    async fn fail_schedule(&self, schedule_id: &str, reason: &str) {
        match schedules::mark_failed(&self.db, schedule_id, reason).await {
            Ok(true) => debug!(worker_id = self.id, reason, "schedule marked failed"),
            Ok(false) => warn!(
                worker_id = self.id,
                reason, "schedule already left running, failure not recorded"
            ),
            Err(e) => error!(worker_id = self.id, error = ?e, "failed to record failure"),
        }
    }

    /// Removes the job from the queue; the schedule record carries the
    /// outcome.
    async fn finish_job(&self, schedule_id: &str) {
        if let Err(e) = jobs::complete(&self.db, schedule_id).await {
            error!(worker_id = self.id, error = ?e, "failed to remove finished job");
        }
    }
}
