//! Activity CRUD handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::data::models::{Activity, ActivityType, Frequency, SelectedTimeslot, new_id};
use crate::data::{activities, courses, groups};
use crate::state::AppState;
use crate::web::auth::{AuthUser, require_admin, require_member};
use crate::web::error::{ApiError, OptionNotFoundExt, db_error};

#[derive(Debug, Deserialize)]
pub struct CreateActivity {
    pub institution_id: String,
    pub course_id: String,
    pub activity_type: ActivityType,
    pub duration_slots: u32,
    pub group_id: String,
    #[serde(default)]
    pub professor_id: Option<String>,
    #[serde(default)]
    pub required_room_features: Vec<String>,
    pub frequency: Frequency,
    #[serde(default)]
    pub selected_timeslot: Option<SelectedTimeslot>,
}

#[derive(Debug, Serialize)]
pub struct GetActivity {
    pub activity: Activity,
}

#[derive(Debug, Serialize)]
pub struct GetAllActivities {
    pub activities: Vec<Activity>,
}

/// Checks the activity's references stay inside its institution.
async fn validate_references(
    state: &AppState,
    institution_id: &str,
    course_id: &str,
    group_id: &str,
    duration_slots: u32,
) -> Result<(), ApiError> {
    if duration_slots == 0 {
        return Err(ApiError::invalid("duration_slots must be at least 1"));
    }

    let course = courses::find_by_id(&state.db, course_id)
        .await
        .map_err(|e| db_error("Course lookup", e))?
        .or_not_found("Course", course_id)?;
    if course.institution_id != institution_id {
        return Err(ApiError::invalid(format!(
            "course {course_id} belongs to a different institution"
        )));
    }

    let group = groups::find_by_id(&state.db, group_id)
        .await
        .map_err(|e| db_error("Group lookup", e))?
        .or_not_found("Group", group_id)?;
    if group.institution_id != institution_id {
        return Err(ApiError::invalid(format!(
            "group {group_id} belongs to a different institution"
        )));
    }
    Ok(())
}

/// `POST /activities`
pub async fn create_activity(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(request): Json<CreateActivity>,
) -> Result<Json<GetActivity>, ApiError> {
    require_admin(&caller, &request.institution_id)?;
    validate_references(
        &state,
        &request.institution_id,
        &request.course_id,
        &request.group_id,
        request.duration_slots,
    )
    .await?;

    let activity = Activity {
        id: new_id(),
        institution_id: request.institution_id,
        course_id: request.course_id,
        activity_type: request.activity_type,
        duration_slots: request.duration_slots,
        group_id: request.group_id,
        professor_id: request.professor_id,
        required_room_features: request.required_room_features,
        frequency: request.frequency,
        selected_timeslot: request.selected_timeslot,
    };
    activities::insert(&state.db, &activity)
        .await
        .map_err(|e| db_error("Activity insert", e))?;
    Ok(Json(GetActivity { activity }))
}

#[derive(Debug, Deserialize)]
pub struct ActivityFilter {
    pub professor_id: Option<String>,
}

/// `GET /activities?professor_id=` -- the professor view. Results are
/// limited to institutions the caller belongs to.
pub async fn list_activities(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Query(filter): Query<ActivityFilter>,
) -> Result<Json<GetAllActivities>, ApiError> {
    let professor_id = filter
        .professor_id
        .ok_or_else(|| ApiError::invalid("professor_id query parameter is required"))?;

    let found = activities::find_by_professor(&state.db, &professor_id)
        .await
        .map_err(|e| db_error("Activity list", e))?;
    let activities = found
        .into_iter()
        .filter(|activity| caller.is_member_of(&activity.institution_id))
        .collect();
    Ok(Json(GetAllActivities { activities }))
}

/// `GET /activities/{id}`
pub async fn get_activity(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(activity_id): Path<String>,
) -> Result<Json<GetActivity>, ApiError> {
    let activity = activities::find_by_id(&state.db, &activity_id)
        .await
        .map_err(|e| db_error("Activity lookup", e))?
        .or_not_found("Activity", &activity_id)?;
    require_member(&caller, &activity.institution_id)?;
    Ok(Json(GetActivity { activity }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateActivity {
    pub activity_type: Option<ActivityType>,
    pub duration_slots: Option<u32>,
    pub group_id: Option<String>,
    pub professor_id: Option<String>,
    pub required_room_features: Option<Vec<String>>,
    pub frequency: Option<Frequency>,
    pub selected_timeslot: Option<SelectedTimeslot>,
}

/// `PUT /activities/{id}`
pub async fn update_activity(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(activity_id): Path<String>,
    Json(request): Json<UpdateActivity>,
) -> Result<Json<GetActivity>, ApiError> {
    let mut activity = activities::find_by_id(&state.db, &activity_id)
        .await
        .map_err(|e| db_error("Activity lookup", e))?
        .or_not_found("Activity", &activity_id)?;
    require_admin(&caller, &activity.institution_id)?;

    if let Some(activity_type) = request.activity_type {
        activity.activity_type = activity_type;
    }
    if let Some(duration) = request.duration_slots {
        activity.duration_slots = duration;
    }
    if let Some(group_id) = request.group_id {
        activity.group_id = group_id;
    }
    if let Some(professor_id) = request.professor_id {
        activity.professor_id = Some(professor_id);
    }
    if let Some(features) = request.required_room_features {
        activity.required_room_features = features;
    }
    if let Some(frequency) = request.frequency {
        activity.frequency = frequency;
    }
    if let Some(selected) = request.selected_timeslot {
        activity.selected_timeslot = Some(selected);
    }

    validate_references(
        &state,
        &activity.institution_id,
        &activity.course_id,
        &activity.group_id,
        activity.duration_slots,
    )
    .await?;

    activities::update_by_id(&state.db, &activity)
        .await
        .map_err(|e| db_error("Activity update", e))?;
    Ok(Json(GetActivity { activity }))
}

/// `DELETE /activities/{id}`
pub async fn delete_activity(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(activity_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let activity = activities::find_by_id(&state.db, &activity_id)
        .await
        .map_err(|e| db_error("Activity lookup", e))?
        .or_not_found("Activity", &activity_id)?;
    require_admin(&caller, &activity.institution_id)?;

    activities::delete_by_id(&state.db, &activity_id)
        .await
        .map_err(|e| db_error("Activity delete", e))?;
    Ok(StatusCode::NO_CONTENT)
}
