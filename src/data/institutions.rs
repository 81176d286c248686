//! Institution queries.

use futures::TryStreamExt;
use mongodb::bson::doc;

use crate::data::DbContext;
use crate::data::models::Institution;

pub async fn find_by_id(
    db: &DbContext,
    institution_id: &str,
) -> mongodb::error::Result<Option<Institution>> {
    db.institutions()
        .find_one(doc! { "_id": institution_id })
        .await
}

pub async fn find_all(db: &DbContext) -> mongodb::error::Result<Vec<Institution>> {
    db.institutions().find(doc! {}).await?.try_collect().await
}

pub async fn insert(db: &DbContext, institution: &Institution) -> mongodb::error::Result<()> {
    db.institutions().insert_one(institution).await?;
    Ok(())
}

/// Replaces the mutable fields; returns whether a document matched.
pub async fn update_by_id(
    db: &DbContext,
    institution: &Institution,
) -> mongodb::error::Result<bool> {
    let result = db
        .institutions()
        .update_one(
            doc! { "_id": &institution.id },
            doc! { "$set": {
                "name": &institution.name,
                "time_grid_config": mongodb::bson::to_bson(&institution.time_grid_config)?,
            }},
        )
        .await?;
    Ok(result.matched_count > 0)
}

pub async fn delete_by_id(db: &DbContext, institution_id: &str) -> mongodb::error::Result<bool> {
    let result = db
        .institutions()
        .delete_one(doc! { "_id": institution_id })
        .await?;
    Ok(result.deleted_count > 0)
}
