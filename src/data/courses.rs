//! Course queries.

use futures::TryStreamExt;
use mongodb::bson::doc;

use crate::data::DbContext;
use crate::data::models::Course;

pub async fn find_by_id(db: &DbContext, course_id: &str) -> mongodb::error::Result<Option<Course>> {
    db.courses().find_one(doc! { "_id": course_id }).await
}

pub async fn find_by_institution(
    db: &DbContext,
    institution_id: &str,
) -> mongodb::error::Result<Vec<Course>> {
    db.courses()
        .find(doc! { "institution_id": institution_id })
        .await?
        .try_collect()
        .await
}

pub async fn insert(db: &DbContext, course: &Course) -> mongodb::error::Result<()> {
    db.courses().insert_one(course).await?;
    Ok(())
}

pub async fn update_by_id(db: &DbContext, course: &Course) -> mongodb::error::Result<bool> {
    let result = db
        .courses()
        .update_one(
            doc! { "_id": &course.id },
            doc! { "$set": {
                "name": &course.name,
                "activities_duration_slots":
                    mongodb::bson::to_bson(&course.activities_duration_slots)?,
            }},
        )
        .await?;
    Ok(result.matched_count > 0)
}

pub async fn delete_by_id(db: &DbContext, course_id: &str) -> mongodb::error::Result<bool> {
    let result = db.courses().delete_one(doc! { "_id": course_id }).await?;
    Ok(result.deleted_count > 0)
}

pub async fn delete_by_institution(
    db: &DbContext,
    institution_id: &str,
) -> mongodb::error::Result<u64> {
    let result = db
        .courses()
        .delete_many(doc! { "institution_id": institution_id })
        .await?;
    Ok(result.deleted_count)
}
