//! Course CRUD handlers.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::data::models::{ActivityType, Course, new_id};
use crate::data::{activities, courses, institutions};
use crate::state::AppState;
use crate::web::auth::{AuthUser, require_admin, require_member};
use crate::web::error::{ApiError, OptionNotFoundExt, db_error};

#[derive(Debug, Deserialize)]
pub struct CreateCourse {
    pub institution_id: String,
    pub name: String,
    #[serde(default)]
    pub activities_duration_slots: BTreeMap<ActivityType, u32>,
}

#[derive(Debug, Serialize)]
pub struct GetCourse {
    pub course: Course,
}

/// `POST /courses`
pub async fn create_course(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(request): Json<CreateCourse>,
) -> Result<Json<GetCourse>, ApiError> {
    require_admin(&caller, &request.institution_id)?;
    institutions::find_by_id(&state.db, &request.institution_id)
        .await
        .map_err(|e| db_error("Institution lookup", e))?
        .or_not_found("Institution", &request.institution_id)?;

    let course = Course {
        id: new_id(),
        institution_id: request.institution_id,
        name: request.name,
        activities_duration_slots: request.activities_duration_slots,
    };
    courses::insert(&state.db, &course)
        .await
        .map_err(|e| db_error("Course insert", e))?;
    Ok(Json(GetCourse { course }))
}

/// `GET /courses/{id}`
pub async fn get_course(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(course_id): Path<String>,
) -> Result<Json<GetCourse>, ApiError> {
    let course = courses::find_by_id(&state.db, &course_id)
        .await
        .map_err(|e| db_error("Course lookup", e))?
        .or_not_found("Course", &course_id)?;
    require_member(&caller, &course.institution_id)?;
    Ok(Json(GetCourse { course }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateCourse {
    pub name: Option<String>,
    pub activities_duration_slots: Option<BTreeMap<ActivityType, u32>>,
}

/// `PUT /courses/{id}`
pub async fn update_course(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(course_id): Path<String>,
    Json(request): Json<UpdateCourse>,
) -> Result<Json<GetCourse>, ApiError> {
    let mut course = courses::find_by_id(&state.db, &course_id)
        .await
        .map_err(|e| db_error("Course lookup", e))?
        .or_not_found("Course", &course_id)?;
    require_admin(&caller, &course.institution_id)?;

    if let Some(name) = request.name {
        course.name = name;
    }
    if let Some(durations) = request.activities_duration_slots {
        course.activities_duration_slots = durations;
    }

    courses::update_by_id(&state.db, &course)
        .await
        .map_err(|e| db_error("Course update", e))?;
    Ok(Json(GetCourse { course }))
}

/// `DELETE /courses/{id}` -- removes the course's activities with it.
pub async fn delete_course(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(course_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let course = courses::find_by_id(&state.db, &course_id)
        .await
        .map_err(|e| db_error("Course lookup", e))?
        .or_not_found("Course", &course_id)?;
    require_admin(&caller, &course.institution_id)?;

    activities::delete_by_course(&state.db, &course_id)
        .await
        .map_err(|e| db_error("Activity cascade", e))?;
    courses::delete_by_id(&state.db, &course_id)
        .await
        .map_err(|e| db_error("Course delete", e))?;
    Ok(StatusCode::NO_CONTENT)
}
