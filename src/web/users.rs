//! User registration and role management handlers.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use mongodb::error::{ErrorKind, WriteFailure};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::models::{User, UserRole, new_id};
use crate::data::users;
use crate::state::AppState;
use crate::web::auth::{AuthUser, require_admin};
use crate::web::error::{ApiError, OptionNotFoundExt, db_error};

/// A user record without its credential material.
#[derive(Debug, Serialize)]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub user_roles: BTreeMap<String, Vec<UserRole>>,
    pub group_ids: Vec<String>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            user_roles: user.user_roles,
            group_ids: user.group_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct GetUser {
    pub user: UserView,
}

/// `POST /users` -- open registration. Roles are granted later by
/// institution admins.
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUser>,
) -> Result<Json<GetUser>, ApiError> {
    if request.email.trim().is_empty() || !request.email.contains('@') {
        return Err(ApiError::invalid("a valid email address is required"));
    }
    if request.password.len() < 8 {
        return Err(ApiError::invalid("password must be at least 8 characters"));
    }

    let hashed_password = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
        .map_err(|_| ApiError::invalid("password could not be hashed"))?;
    let user = User {
        id: new_id(),
        name: request.name,
        email: request.email,
        hashed_password,
        user_roles: BTreeMap::new(),
        group_ids: Vec::new(),
    };

    match users::insert(&state.db, &user).await {
        Ok(()) => {}
        Err(error) => {
            if let ErrorKind::Write(WriteFailure::WriteError(ref write_error)) = *error.kind
                && write_error.code == 11000
            {
                return Err(ApiError::invalid("email is already registered"));
            }
            return Err(db_error("User insert", error));
        }
    }

    info!(user_id = %user.id, "user registered");
    Ok(Json(GetUser { user: user.into() }))
}

/// `GET /users/{id}` -- visible to the user themself and to anyone sharing
/// an institution with them.
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<GetUser>, ApiError> {
    let user = users::find_by_id(&state.db, &user_id)
        .await
        .map_err(|e| db_error("User lookup", e))?
        .or_not_found("User", &user_id)?;

    let shares_institution = user
        .user_roles
        .keys()
        .any(|institution_id| caller.is_member_of(institution_id));
    if caller.id != user.id && !shares_institution {
        return Err(ApiError::forbidden(format!(
            "user {} has no access to user {user_id}",
            caller.id
        )));
    }

    Ok(Json(GetUser { user: user.into() }))
}

#[derive(Debug, Deserialize)]
pub struct SetRoles {
    pub institution_id: String,
    pub roles: Vec<UserRole>,
}

/// `PUT /users/{id}/roles` -- grants roles at one institution. Admin-only
/// for that institution.
pub async fn set_roles(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<String>,
    Json(request): Json<SetRoles>,
) -> Result<Json<GetUser>, ApiError> {
    require_admin(&caller, &request.institution_id)?;

    let matched =
        users::set_institution_roles(&state.db, &user_id, &request.institution_id, &request.roles)
            .await
            .map_err(|e| db_error("Role update", e))?;
    if !matched {
        return Err(ApiError::not_found("User", &user_id));
    }

    let user = users::find_by_id(&state.db, &user_id)
        .await
        .map_err(|e| db_error("User lookup", e))?
        .or_not_found("User", &user_id)?;
    info!(user_id = %user_id, institution_id = %request.institution_id, "roles updated");
    Ok(Json(GetUser { user: user.into() }))
}
