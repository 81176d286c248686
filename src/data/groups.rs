//! Group queries.

use futures::TryStreamExt;
use mongodb::bson::{Bson, doc};

use crate::data::DbContext;
use crate::data::models::Group;

pub async fn find_by_id(db: &DbContext, group_id: &str) -> mongodb::error::Result<Option<Group>> {
    db.groups().find_one(doc! { "_id": group_id }).await
}

pub async fn find_by_institution(
    db: &DbContext,
    institution_id: &str,
) -> mongodb::error::Result<Vec<Group>> {
    db.groups()
        .find(doc! { "institution_id": institution_id })
        .await?
        .try_collect()
        .await
}

pub async fn insert(db: &DbContext, group: &Group) -> mongodb::error::Result<()> {
    db.groups().insert_one(group).await?;
    Ok(())
}

pub async fn update_by_id(db: &DbContext, group: &Group) -> mongodb::error::Result<bool> {
    let parent: Bson = match &group.parent_group_id {
        Some(id) => Bson::String(id.clone()),
        None => Bson::Null,
    };
    let result = db
        .groups()
        .update_one(
            doc! { "_id": &group.id },
            doc! { "$set": { "name": &group.name, "parent_group_id": parent } },
        )
        .await?;
    Ok(result.matched_count > 0)
}

pub async fn delete_by_id(db: &DbContext, group_id: &str) -> mongodb::error::Result<bool> {
    let result = db.groups().delete_one(doc! { "_id": group_id }).await?;
    Ok(result.deleted_count > 0)
}

/// Detaches every child of a deleted group, turning them into roots.
pub async fn clear_parent(db: &DbContext, parent_group_id: &str) -> mongodb::error::Result<u64> {
    let result = db
        .groups()
        .update_many(
            doc! { "parent_group_id": parent_group_id },
            doc! { "$unset": { "parent_group_id": "" } },
        )
        .await?;
    Ok(result.modified_count)
}

pub async fn delete_by_institution(
    db: &DbContext,
    institution_id: &str,
) -> mongodb::error::Result<u64> {
    let result = db
        .groups()
        .delete_many(doc! { "institution_id": institution_id })
        .await?;
    Ok(result.deleted_count)
}
