//! Activity queries.

use futures::TryStreamExt;
use mongodb::bson::doc;

use crate::data::DbContext;
use crate::data::models::Activity;

pub async fn find_by_id(
    db: &DbContext,
    activity_id: &str,
) -> mongodb::error::Result<Option<Activity>> {
    db.activities().find_one(doc! { "_id": activity_id }).await
}

pub async fn find_by_institution(
    db: &DbContext,
    institution_id: &str,
) -> mongodb::error::Result<Vec<Activity>> {
    db.activities()
        .find(doc! { "institution_id": institution_id })
        .await?
        .try_collect()
        .await
}

/// Activities taught by one professor, across the institution.
pub async fn find_by_professor(
    db: &DbContext,
    professor_id: &str,
) -> mongodb::error::Result<Vec<Activity>> {
    db.activities()
        .find(doc! { "professor_id": professor_id })
        .await?
        .try_collect()
        .await
}

pub async fn insert(db: &DbContext, activity: &Activity) -> mongodb::error::Result<()> {
    db.activities().insert_one(activity).await?;
    Ok(())
}

/// Replaces every mutable field of the activity document.
pub async fn update_by_id(db: &DbContext, activity: &Activity) -> mongodb::error::Result<bool> {
    let result = db
        .activities()
        .replace_one(doc! { "_id": &activity.id }, activity)
        .await?;
    Ok(result.matched_count > 0)
}

pub async fn delete_by_id(db: &DbContext, activity_id: &str) -> mongodb::error::Result<bool> {
    let result = db
        .activities()
        .delete_one(doc! { "_id": activity_id })
        .await?;
    Ok(result.deleted_count > 0)
}

pub async fn delete_by_course(db: &DbContext, course_id: &str) -> mongodb::error::Result<u64> {
    let result = db
        .activities()
        .delete_many(doc! { "course_id": course_id })
        .await?;
    Ok(result.deleted_count)
}

pub async fn delete_by_group(db: &DbContext, group_id: &str) -> mongodb::error::Result<u64> {
    let result = db
        .activities()
        .delete_many(doc! { "group_id": group_id })
        .await?;
    Ok(result.deleted_count)
}

pub async fn delete_by_institution(
    db: &DbContext,
    institution_id: &str,
) -> mongodb::error::Result<u64> {
    let result = db
        .activities()
        .delete_many(doc! { "institution_id": institution_id })
        .await?;
    Ok(result.deleted_count)
}
