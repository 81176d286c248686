//! Room queries.

use futures::TryStreamExt;
use mongodb::bson::doc;

use crate::data::DbContext;
use crate::data::models::Room;

pub async fn find_by_id(db: &DbContext, room_id: &str) -> mongodb::error::Result<Option<Room>> {
    db.rooms().find_one(doc! { "_id": room_id }).await
}

pub async fn find_by_institution(
    db: &DbContext,
    institution_id: &str,
) -> mongodb::error::Result<Vec<Room>> {
    db.rooms()
        .find(doc! { "institution_id": institution_id })
        .await?
        .try_collect()
        .await
}

pub async fn insert(db: &DbContext, room: &Room) -> mongodb::error::Result<()> {
    db.rooms().insert_one(room).await?;
    Ok(())
}

pub async fn update_by_id(db: &DbContext, room: &Room) -> mongodb::error::Result<bool> {
    let result = db
        .rooms()
        .update_one(
            doc! { "_id": &room.id },
            doc! { "$set": {
                "name": &room.name,
                "capacity": room.capacity,
                "features": mongodb::bson::to_bson(&room.features)?,
            }},
        )
        .await?;
    Ok(result.matched_count > 0)
}

pub async fn delete_by_id(db: &DbContext, room_id: &str) -> mongodb::error::Result<bool> {
    let result = db.rooms().delete_one(doc! { "_id": room_id }).await?;
    Ok(result.deleted_count > 0)
}

pub async fn delete_by_institution(
    db: &DbContext,
    institution_id: &str,
) -> mongodb::error::Result<u64> {
    let result = db
        .rooms()
        .delete_many(doc! { "institution_id": institution_id })
        .await?;
    Ok(result.deleted_count)
}
