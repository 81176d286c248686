//! Schedule queries and the status state machine.
//!
//! The status column is the commit signal for a schedule's placements:
//! `Draft -> Running` is claimed atomically at job pickup, and placements
//! become visible only when `Running -> Completed` lands after they are all
//! inserted. Both transitions filter on the expected current status so
//! redelivered jobs and racing workers fall through harmlessly.

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, to_bson};
use mongodb::options::ReturnDocument;

use crate::data::DbContext;
use crate::data::models::{Schedule, ScheduleStatus};

pub async fn insert(db: &DbContext, schedule: &Schedule) -> mongodb::error::Result<()> {
    db.schedules().insert_one(schedule).await?;
    Ok(())
}

pub async fn find_by_id(
    db: &DbContext,
    schedule_id: &str,
) -> mongodb::error::Result<Option<Schedule>> {
    db.schedules().find_one(doc! { "_id": schedule_id }).await
}

pub async fn find_all(db: &DbContext) -> mongodb::error::Result<Vec<Schedule>> {
    db.schedules().find(doc! {}).await?.try_collect().await
}

pub async fn find_by_institution(
    db: &DbContext,
    institution_id: &str,
) -> mongodb::error::Result<Vec<Schedule>> {
    db.schedules()
        .find(doc! { "institution_id": institution_id })
        .await?
        .try_collect()
        .await
}

/// Atomically claims a draft schedule for execution.
///
/// Returns the updated schedule, or `None` when it is no longer in `Draft`
/// (already claimed, finished, or deleted) -- the caller drops the job.
pub async fn try_mark_running(
    db: &DbContext,
    schedule_id: &str,
) -> mongodb::error::Result<Option<Schedule>> {
    db.schedules()
        .find_one_and_update(
            doc! { "_id": schedule_id, "status": ScheduleStatus::Draft.as_str() },
            doc! { "$set": {
                "status": ScheduleStatus::Running.as_str(),
                "started_at": to_bson(&Utc::now())?,
            }},
        )
        .return_document(ReturnDocument::After)
        .await
}

/// Flips a running schedule to `Completed`. The placements must already be
/// inserted; this write makes them visible.
pub async fn mark_completed(db: &DbContext, schedule_id: &str) -> mongodb::error::Result<bool> {
    let result = db
        .schedules()
        .update_one(
            doc! { "_id": schedule_id, "status": ScheduleStatus::Running.as_str() },
            doc! { "$set": { "status": ScheduleStatus::Completed.as_str() } },
        )
        .await?;
    Ok(result.matched_count > 0)
}

/// Records a terminal failure with its short classifier.
pub async fn mark_failed(
    db: &DbContext,
    schedule_id: &str,
    error_message: &str,
) -> mongodb::error::Result<bool> {
    let result = db
        .schedules()
        .update_one(
            doc! { "_id": schedule_id, "status": ScheduleStatus::Running.as_str() },
            doc! { "$set": {
                "status": ScheduleStatus::Failed.as_str(),
                "error_message": error_message,
            }},
        )
        .await?;
    Ok(result.matched_count > 0)
}

/// Control-plane update of status and/or error message.
pub async fn update_by_id(
    db: &DbContext,
    schedule_id: &str,
    status: Option<ScheduleStatus>,
    error_message: Option<&str>,
) -> mongodb::error::Result<bool> {
    let mut set = doc! {};
    if let Some(status) = status {
        set.insert("status", status.as_str());
    }
    if let Some(message) = error_message {
        set.insert("error_message", message);
    }
    if set.is_empty() {
        return Ok(find_by_id(db, schedule_id).await?.is_some());
    }
    let result = db
        .schedules()
        .update_one(doc! { "_id": schedule_id }, doc! { "$set": set })
        .await?;
    Ok(result.matched_count > 0)
}

pub async fn delete_by_id(db: &DbContext, schedule_id: &str) -> mongodb::error::Result<bool> {
    let result = db
        .schedules()
        .delete_one(doc! { "_id": schedule_id })
        .await?;
    Ok(result.deleted_count > 0)
}

pub async fn delete_by_institution(
    db: &DbContext,
    institution_id: &str,
) -> mongodb::error::Result<Vec<String>> {
    let schedules = find_by_institution(db, institution_id).await?;
    let ids: Vec<String> = schedules.into_iter().map(|s| s.id).collect();
    if !ids.is_empty() {
        db.schedules()
            .delete_many(doc! { "_id": { "$in": &ids } })
            .await?;
    }
    Ok(ids)
}

/// Schedules stuck in `Running` since before `cutoff` (crashed workers).
pub async fn find_stale_running(
    db: &DbContext,
    cutoff: DateTime<Utc>,
) -> mongodb::error::Result<Vec<Schedule>> {
    db.schedules()
        .find(doc! {
            "status": ScheduleStatus::Running.as_str(),
            "started_at": { "$lt": to_bson(&cutoff)? },
        })
        .await?
        .try_collect()
        .await
}
