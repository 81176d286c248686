//! Group CRUD handlers.
//!
//! Groups form a forest per institution; create and update validate that a
//! parent belongs to the same institution and that re-parenting never
//! introduces a cycle.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::data::models::{Group, new_id};
use crate::data::{activities, groups, institutions};
use crate::state::AppState;
use crate::web::auth::{AuthUser, require_admin, require_member};
use crate::web::error::{ApiError, OptionNotFoundExt, db_error};

/// Checks that `parent_id` exists in the institution and that walking its
/// ancestor chain never reaches `child_id`.
async fn validate_parent(
    state: &AppState,
    institution_id: &str,
    child_id: &str,
    parent_id: &str,
) -> Result<(), ApiError> {
    let all = groups::find_by_institution(&state.db, institution_id)
        .await
        .map_err(|e| db_error("Group list", e))?;
    let parent_of: std::collections::HashMap<&str, Option<&str>> = all
        .iter()
        .map(|g| (g.id.as_str(), g.parent_group_id.as_deref()))
        .collect();

    if !parent_of.contains_key(parent_id) {
        return Err(ApiError::invalid(format!(
            "parent group {parent_id} does not exist in institution {institution_id}"
        )));
    }

    let mut current = Some(parent_id);
    let mut hops = 0;
    while let Some(group_id) = current {
        if group_id == child_id {
            return Err(ApiError::invalid(
                "group parent chain would form a cycle",
            ));
        }
        hops += 1;
        if hops > all.len() {
            // Pre-existing cycle in stored data; refuse to extend it.
            return Err(ApiError::invalid("group parent chain is cyclic"));
        }
        current = parent_of.get(group_id).copied().flatten();
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct CreateGroup {
    pub institution_id: String,
    pub name: String,
    #[serde(default)]
    pub parent_group_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GetGroup {
    pub group: Group,
}

/// `POST /groups`
pub async fn create_group(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(request): Json<CreateGroup>,
) -> Result<Json<GetGroup>, ApiError> {
    require_admin(&caller, &request.institution_id)?;
    institutions::find_by_id(&state.db, &request.institution_id)
        .await
        .map_err(|e| db_error("Institution lookup", e))?
        .or_not_found("Institution", &request.institution_id)?;

    let group = Group {
        id: new_id(),
        institution_id: request.institution_id,
        name: request.name,
        parent_group_id: request.parent_group_id,
    };
    if let Some(parent_id) = &group.parent_group_id {
        validate_parent(&state, &group.institution_id, &group.id, parent_id).await?;
    }

    groups::insert(&state.db, &group)
        .await
        .map_err(|e| db_error("Group insert", e))?;
    Ok(Json(GetGroup { group }))
}

/// `GET /groups/{id}`
pub async fn get_group(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(group_id): Path<String>,
) -> Result<Json<GetGroup>, ApiError> {
    let group = groups::find_by_id(&state.db, &group_id)
        .await
        .map_err(|e| db_error("Group lookup", e))?
        .or_not_found("Group", &group_id)?;
    require_member(&caller, &group.institution_id)?;
    Ok(Json(GetGroup { group }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateGroup {
    pub name: Option<String>,
    /// `Some(None)` clears the parent; absent leaves it unchanged.
    #[serde(default, with = "double_option")]
    pub parent_group_id: Option<Option<String>>,
}

/// Distinguishes an absent field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(de).map(Some)
    }
}

/// `PUT /groups/{id}`
pub async fn update_group(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(group_id): Path<String>,
    Json(request): Json<UpdateGroup>,
) -> Result<Json<GetGroup>, ApiError> {
    let mut group = groups::find_by_id(&state.db, &group_id)
        .await
        .map_err(|e| db_error("Group lookup", e))?
        .or_not_found("Group", &group_id)?;
    require_admin(&caller, &group.institution_id)?;

    if let Some(name) = request.name {
        group.name = name;
    }
    if let Some(parent) = request.parent_group_id {
        if let Some(parent_id) = &parent {
            validate_parent(&state, &group.institution_id, &group.id, parent_id).await?;
        }
        group.parent_group_id = parent;
    }

    groups::update_by_id(&state.db, &group)
        .await
        .map_err(|e| db_error("Group update", e))?;
    Ok(Json(GetGroup { group }))
}

/// `DELETE /groups/{id}` -- children are detached, not deleted; the
/// group's own activities go with it.
pub async fn delete_group(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let group = groups::find_by_id(&state.db, &group_id)
        .await
        .map_err(|e| db_error("Group lookup", e))?
        .or_not_found("Group", &group_id)?;
    require_admin(&caller, &group.institution_id)?;

    groups::clear_parent(&state.db, &group_id)
        .await
        .map_err(|e| db_error("Group detach", e))?;
    activities::delete_by_group(&state.db, &group_id)
        .await
        .map_err(|e| db_error("Activity cascade", e))?;
    groups::delete_by_id(&state.db, &group_id)
        .await
        .map_err(|e| db_error("Group delete", e))?;
    Ok(StatusCode::NO_CONTENT)
}
