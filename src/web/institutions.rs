//! Institution CRUD and institution-scoped list handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::models::{
    Activity, Group, Institution, Room, TimeGridConfig, UserRole, new_id,
};
use crate::data::{
    self, activities, courses, groups, institutions, rooms, scheduled_activities, schedules,
};
use crate::state::AppState;
use crate::web::auth::{AuthUser, require_admin, require_member};
use crate::web::error::{ApiError, OptionNotFoundExt, db_error};

fn validate_grid(grid: &TimeGridConfig) -> Result<(), ApiError> {
    if grid.weeks == 0
        || grid.days == 0
        || grid.timeslots_per_day == 0
        || grid.max_timeslots_per_day_per_group == 0
    {
        return Err(ApiError::invalid("time grid dimensions must be positive"));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct CreateInstitution {
    pub name: String,
    pub time_grid_config: TimeGridConfig,
}

#[derive(Debug, Serialize)]
pub struct GetInstitution {
    pub institution: Institution,
}

#[derive(Debug, Serialize)]
pub struct GetAllInstitutions {
    pub institutions: Vec<Institution>,
}

/// `POST /institutions` -- the creator becomes the institution's first
/// admin.
pub async fn create_institution(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(request): Json<CreateInstitution>,
) -> Result<Json<GetInstitution>, ApiError> {
    validate_grid(&request.time_grid_config)?;

    let institution = Institution {
        id: new_id(),
        name: request.name,
        time_grid_config: request.time_grid_config,
    };
    institutions::insert(&state.db, &institution)
        .await
        .map_err(|e| db_error("Institution insert", e))?;

    data::users::set_institution_roles(
        &state.db,
        &caller.id,
        &institution.id,
        &[UserRole::Admin],
    )
    .await
    .map_err(|e| db_error("Role grant", e))?;

    info!(institution_id = %institution.id, "institution created");
    Ok(Json(GetInstitution { institution }))
}

/// `GET /institutions` -- institutions the caller belongs to.
pub async fn list_institutions(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<GetAllInstitutions>, ApiError> {
    let all = institutions::find_all(&state.db)
        .await
        .map_err(|e| db_error("Institution list", e))?;
    let institutions = all
        .into_iter()
        .filter(|institution| caller.is_member_of(&institution.id))
        .collect();
    Ok(Json(GetAllInstitutions { institutions }))
}

/// `GET /institutions/{id}`
pub async fn get_institution(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(institution_id): Path<String>,
) -> Result<Json<GetInstitution>, ApiError> {
    let institution = institutions::find_by_id(&state.db, &institution_id)
        .await
        .map_err(|e| db_error("Institution lookup", e))?
        .or_not_found("Institution", &institution_id)?;
    require_member(&caller, &institution.id)?;
    Ok(Json(GetInstitution { institution }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateInstitution {
    pub name: Option<String>,
    pub time_grid_config: Option<TimeGridConfig>,
}

/// `PUT /institutions/{id}` -- admin only. Grid changes do not touch
/// already generated schedules, which carry their own copy.
pub async fn update_institution(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(institution_id): Path<String>,
    Json(request): Json<UpdateInstitution>,
) -> Result<Json<GetInstitution>, ApiError> {
    require_admin(&caller, &institution_id)?;

    let mut institution = institutions::find_by_id(&state.db, &institution_id)
        .await
        .map_err(|e| db_error("Institution lookup", e))?
        .or_not_found("Institution", &institution_id)?;
    if let Some(name) = request.name {
        institution.name = name;
    }
    if let Some(grid) = request.time_grid_config {
        validate_grid(&grid)?;
        institution.time_grid_config = grid;
    }

    institutions::update_by_id(&state.db, &institution)
        .await
        .map_err(|e| db_error("Institution update", e))?;
    Ok(Json(GetInstitution { institution }))
}

/// `DELETE /institutions/{id}` -- admin only. Cascades to every owned
/// entity, schedules and their placements included.
pub async fn delete_institution(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(institution_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_admin(&caller, &institution_id)?;

    institutions::find_by_id(&state.db, &institution_id)
        .await
        .map_err(|e| db_error("Institution lookup", e))?
        .or_not_found("Institution", &institution_id)?;

    let schedule_ids = schedules::delete_by_institution(&state.db, &institution_id)
        .await
        .map_err(|e| db_error("Schedule cascade", e))?;
    for schedule_id in &schedule_ids {
        scheduled_activities::delete_by_schedule(&state.db, schedule_id)
            .await
            .map_err(|e| db_error("Placement cascade", e))?;
    }
    activities::delete_by_institution(&state.db, &institution_id)
        .await
        .map_err(|e| db_error("Activity cascade", e))?;
    courses::delete_by_institution(&state.db, &institution_id)
        .await
        .map_err(|e| db_error("Course cascade", e))?;
    groups::delete_by_institution(&state.db, &institution_id)
        .await
        .map_err(|e| db_error("Group cascade", e))?;
    rooms::delete_by_institution(&state.db, &institution_id)
        .await
        .map_err(|e| db_error("Room cascade", e))?;
    institutions::delete_by_id(&state.db, &institution_id)
        .await
        .map_err(|e| db_error("Institution delete", e))?;

    info!(institution_id = %institution_id, schedules = schedule_ids.len(), "institution deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct GetInstitutionRooms {
    pub rooms: Vec<Room>,
}

/// `GET /institutions/{id}/rooms`
pub async fn list_institution_rooms(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(institution_id): Path<String>,
) -> Result<Json<GetInstitutionRooms>, ApiError> {
    require_member(&caller, &institution_id)?;
    let rooms = rooms::find_by_institution(&state.db, &institution_id)
        .await
        .map_err(|e| db_error("Room list", e))?;
    Ok(Json(GetInstitutionRooms { rooms }))
}

#[derive(Debug, Serialize)]
pub struct GetInstitutionGroups {
    pub groups: Vec<Group>,
}

/// `GET /institutions/{id}/groups`
pub async fn list_institution_groups(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(institution_id): Path<String>,
) -> Result<Json<GetInstitutionGroups>, ApiError> {
    require_member(&caller, &institution_id)?;
    let groups = groups::find_by_institution(&state.db, &institution_id)
        .await
        .map_err(|e| db_error("Group list", e))?;
    Ok(Json(GetInstitutionGroups { groups }))
}

#[derive(Debug, Serialize)]
pub struct GetInstitutionActivities {
    pub activities: Vec<Activity>,
}

/// `GET /institutions/{id}/activities`
pub async fn list_institution_activities(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(institution_id): Path<String>,
) -> Result<Json<GetInstitutionActivities>, ApiError> {
    require_member(&caller, &institution_id)?;
    let activities = activities::find_by_institution(&state.db, &institution_id)
        .await
        .map_err(|e| db_error("Activity list", e))?;
    Ok(Json(GetInstitutionActivities { activities }))
}
