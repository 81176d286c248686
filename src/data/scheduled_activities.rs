//! Scheduled-activity (placement) queries.

use futures::TryStreamExt;
use mongodb::bson::doc;

use crate::data::DbContext;
use crate::data::models::ScheduledActivity;

pub async fn insert_many(
    db: &DbContext,
    placements: &[ScheduledActivity],
) -> mongodb::error::Result<()> {
    if placements.is_empty() {
        return Ok(());
    }
    db.scheduled_activities().insert_many(placements).await?;
    Ok(())
}

pub async fn find_by_schedule(
    db: &DbContext,
    schedule_id: &str,
) -> mongodb::error::Result<Vec<ScheduledActivity>> {
    db.scheduled_activities()
        .find(doc! { "schedule_id": schedule_id })
        .await?
        .try_collect()
        .await
}

/// Removes every placement of a schedule. Used by the application-level
/// cascade on schedule deletion and by the worker's cleanup after a partial
/// insert.
pub async fn delete_by_schedule(
    db: &DbContext,
    schedule_id: &str,
) -> mongodb::error::Result<u64> {
    let result = db
        .scheduled_activities()
        .delete_many(doc! { "schedule_id": schedule_id })
        .await?;
    Ok(result.deleted_count)
}
