//! Schedule generation trigger and read-only schedule views.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::jobs::GenerateJob;
use crate::data::models::{Schedule, ScheduleStatus, ScheduledActivity};
use crate::data::{activities, institutions, jobs, scheduled_activities, schedules};
use crate::state::AppState;
use crate::web::auth::{AuthUser, require_admin, require_member};
use crate::web::error::{ApiError, OptionNotFoundExt, db_error};

#[derive(Debug, Deserialize)]
pub struct CreateSchedule {
    pub institution_id: String,
}

#[derive(Debug, Serialize)]
pub struct GetSchedule {
    pub schedule: Schedule,
}

#[derive(Debug, Serialize)]
pub struct GetAllSchedules {
    pub schedules: Vec<Schedule>,
}

#[derive(Debug, Serialize)]
pub struct GetScheduledActivities {
    pub scheduled_activities: Vec<ScheduledActivity>,
}

/// `POST /schedules` -- creates a draft schedule and enqueues its
/// generation job. The draft carries a copy of the institution's grid so
/// later edits cannot affect this run.
pub async fn trigger_generation(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(request): Json<CreateSchedule>,
) -> Result<Json<GetSchedule>, ApiError> {
    let institution = institutions::find_by_id(&state.db, &request.institution_id)
        .await
        .map_err(|e| db_error("Institution lookup", e))?
        .or_not_found("Institution", &request.institution_id)?;
    require_admin(&caller, &institution.id)?;

    let institution_activities = activities::find_by_institution(&state.db, &institution.id)
        .await
        .map_err(|e| db_error("Activity list", e))?;
    if institution_activities.is_empty() {
        return Err(ApiError::invalid(format!(
            "no activities found for institution {}",
            institution.id
        )));
    }

    let schedule = Schedule::draft(&institution);
    schedules::insert(&state.db, &schedule)
        .await
        .map_err(|e| db_error("Schedule insert", e))?;

    jobs::enqueue(&state.db, &GenerateJob::new(&schedule.id, &institution.id))
        .await
        .map_err(|e| db_error("Job enqueue", e))?;

    info!(
        schedule_id = %schedule.id,
        institution_id = %institution.id,
        activities = institution_activities.len(),
        "schedule generation enqueued"
    );
    Ok(Json(GetSchedule { schedule }))
}

/// `GET /schedules` -- schedules of institutions the caller belongs to.
pub async fn list_schedules(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<GetAllSchedules>, ApiError> {
    let all = schedules::find_all(&state.db)
        .await
        .map_err(|e| db_error("Schedule list", e))?;
    let schedules = all
        .into_iter()
        .filter(|schedule| caller.is_member_of(&schedule.institution_id))
        .collect();
    Ok(Json(GetAllSchedules { schedules }))
}

/// `GET /schedules/{id}`
pub async fn get_schedule(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(schedule_id): Path<String>,
) -> Result<Json<GetSchedule>, ApiError> {
    let schedule = schedules::find_by_id(&state.db, &schedule_id)
        .await
        .map_err(|e| db_error("Schedule lookup", e))?
        .or_not_found("Schedule", &schedule_id)?;
    require_member(&caller, &schedule.institution_id)?;
    Ok(Json(GetSchedule { schedule }))
}

/// `GET /schedules/{id}/scheduled-activities` -- empty until the schedule
/// completes; placements become visible atomically with the `completed`
/// status.
pub async fn list_scheduled_activities(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(schedule_id): Path<String>,
) -> Result<Json<GetScheduledActivities>, ApiError> {
    let schedule = schedules::find_by_id(&state.db, &schedule_id)
        .await
        .map_err(|e| db_error("Schedule lookup", e))?
        .or_not_found("Schedule", &schedule_id)?;
    require_member(&caller, &schedule.institution_id)?;

    let scheduled_activities = if schedule.status == ScheduleStatus::Completed {
        scheduled_activities::find_by_schedule(&state.db, &schedule_id)
            .await
            .map_err(|e| db_error("Placement list", e))?
    } else {
        Vec::new()
    };
    Ok(Json(GetScheduledActivities {
        scheduled_activities,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSchedule {
    pub status: Option<ScheduleStatus>,
    pub error_message: Option<String>,
}

/// `PUT /schedules/{id}` -- admin escape hatch for status corrections.
pub async fn update_schedule(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(schedule_id): Path<String>,
    Json(request): Json<UpdateSchedule>,
) -> Result<Json<GetSchedule>, ApiError> {
    let schedule = schedules::find_by_id(&state.db, &schedule_id)
        .await
        .map_err(|e| db_error("Schedule lookup", e))?
        .or_not_found("Schedule", &schedule_id)?;
    require_admin(&caller, &schedule.institution_id)?;

    schedules::update_by_id(
        &state.db,
        &schedule_id,
        request.status,
        request.error_message.as_deref(),
    )
    .await
    .map_err(|e| db_error("Schedule update", e))?;

    let schedule = schedules::find_by_id(&state.db, &schedule_id)
        .await
        .map_err(|e| db_error("Schedule lookup", e))?
        .or_not_found("Schedule", &schedule_id)?;
    Ok(Json(GetSchedule { schedule }))
}

/// `DELETE /schedules/{id}` -- cascades to the schedule's placements and
/// drops any still-queued job.
pub async fn delete_schedule(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(schedule_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let schedule = schedules::find_by_id(&state.db, &schedule_id)
        .await
        .map_err(|e| db_error("Schedule lookup", e))?
        .or_not_found("Schedule", &schedule_id)?;
    require_admin(&caller, &schedule.institution_id)?;

    scheduled_activities::delete_by_schedule(&state.db, &schedule_id)
        .await
        .map_err(|e| db_error("Placement cascade", e))?;
    jobs::complete(&state.db, &schedule_id)
        .await
        .map_err(|e| db_error("Job cleanup", e))?;
    schedules::delete_by_id(&state.db, &schedule_id)
        .await
        .map_err(|e| db_error("Schedule delete", e))?;

    info!(schedule_id = %schedule_id, "schedule deleted");
    Ok(StatusCode::NO_CONTENT)
}
