//! The schedule-generation job queue.
//!
//! Jobs live in the `schedule_jobs` collection, keyed by the schedule id,
//! so enqueueing the same schedule twice cannot create a second document.
//! Workers claim with an atomic `find_one_and_update` on the unlocked
//! filter; delivery is at-least-once and the `Draft -> Running` status
//! guard in [`crate::data::schedules`] makes redelivery harmless.

use chrono::{DateTime, Utc};
use mongodb::bson::{doc, to_bson};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ReturnDocument;
use serde::{Deserialize, Serialize};

use crate::data::DbContext;

/// The queue's task name; the only task this service processes.
pub const TASK_GENERATE_SCHEDULE: &str = "generate_schedule";

/// A queued generation request. The payload is minimal: everything else is
/// re-fetched from storage when the job runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateJob {
    /// Equals the schedule id, which deduplicates enqueues at the broker
    /// level.
    #[serde(rename = "_id")]
    pub schedule_id: String,
    pub institution_id: String,
    pub task_name: String,
    pub queued_at: DateTime<Utc>,
    /// Present while a worker holds the job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<DateTime<Utc>>,
}

impl GenerateJob {
    pub fn new(schedule_id: &str, institution_id: &str) -> Self {
        Self {
            schedule_id: schedule_id.to_string(),
            institution_id: institution_id.to_string(),
            task_name: TASK_GENERATE_SCHEDULE.to_string(),
            queued_at: Utc::now(),
            locked_at: None,
        }
    }
}

/// Inserts the job; a duplicate schedule id is treated as already enqueued.
pub async fn enqueue(db: &DbContext, job: &GenerateJob) -> mongodb::error::Result<()> {
    match db.schedule_jobs().insert_one(job).await {
        Ok(_) => Ok(()),
        Err(error) => {
            let duplicate_key = matches!(
                *error.kind,
                ErrorKind::Write(WriteFailure::WriteError(ref write_error))
                    if write_error.code == 11000
            );
            if duplicate_key { Ok(()) } else { Err(error) }
        }
    }
}

/// Atomically claims the oldest unlocked job, if any.
pub async fn claim_next(db: &DbContext) -> mongodb::error::Result<Option<GenerateJob>> {
    db.schedule_jobs()
        .find_one_and_update(
            doc! { "locked_at": { "$exists": false } },
            doc! { "$set": { "locked_at": to_bson(&Utc::now())? } },
        )
        .sort(doc! { "queued_at": 1 })
        .return_document(ReturnDocument::After)
        .await
}

/// Deletes a finished job (the schedule record carries the outcome).
pub async fn complete(db: &DbContext, schedule_id: &str) -> mongodb::error::Result<()> {
    db.schedule_jobs()
        .delete_one(doc! { "_id": schedule_id })
        .await?;
    Ok(())
}

/// Unlocks a claimed job so another worker can pick it up, e.g. during
/// shutdown before processing started.
pub async fn release(db: &DbContext, schedule_id: &str) -> mongodb::error::Result<()> {
    db.schedule_jobs()
        .update_one(
            doc! { "_id": schedule_id },
            doc! { "$unset": { "locked_at": "" } },
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_shape_is_minimal() {
        let job = GenerateJob::new("sched-1", "inst-1");
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["_id"], "sched-1");
        assert_eq!(value["institution_id"], "inst-1");
        assert_eq!(value["task_name"], "generate_schedule");
        assert!(value.get("locked_at").is_none());
    }
}
