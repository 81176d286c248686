//! User queries.

use mongodb::bson::doc;

use crate::data::DbContext;
use crate::data::models::User;

pub async fn find_by_id(db: &DbContext, user_id: &str) -> mongodb::error::Result<Option<User>> {
    db.users().find_one(doc! { "_id": user_id }).await
}

pub async fn find_by_email(db: &DbContext, email: &str) -> mongodb::error::Result<Option<User>> {
    db.users().find_one(doc! { "email": email }).await
}

pub async fn insert(db: &DbContext, user: &User) -> mongodb::error::Result<()> {
    db.users().insert_one(user).await?;
    Ok(())
}

/// Replaces the role map for one institution on the user document.
pub async fn set_institution_roles(
    db: &DbContext,
    user_id: &str,
    institution_id: &str,
    roles: &[crate::data::models::UserRole],
) -> mongodb::error::Result<bool> {
    let key = format!("user_roles.{institution_id}");
    let result = db
        .users()
        .update_one(
            doc! { "_id": user_id },
            doc! { "$set": { key: mongodb::bson::to_bson(roles)? } },
        )
        .await?;
    Ok(result.matched_count > 0)
}
