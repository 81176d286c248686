//! Web API router construction.

use std::time::Duration;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

use crate::state::AppState;
use crate::web::middleware::RequestIdLayer;
use crate::web::{
    activities, auth, courses, groups, institutions, rooms, schedules, status, users,
};

/// Creates the control-plane router, versioned under `/api/v1`.
pub fn create_router(app_state: AppState) -> Router {
    let api_router = Router::new()
        .route("/health", get(status::health))
        .route("/status", get(status::status))
        .route("/auth/token", post(auth::issue_token))
        .route("/auth/me", get(auth::me))
        .route("/users", post(users::create_user))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/roles", put(users::set_roles))
        .route(
            "/institutions",
            get(institutions::list_institutions).post(institutions::create_institution),
        )
        .route(
            "/institutions/{id}",
            get(institutions::get_institution)
                .put(institutions::update_institution)
                .delete(institutions::delete_institution),
        )
        .route(
            "/institutions/{id}/rooms",
            get(institutions::list_institution_rooms),
        )
        .route(
            "/institutions/{id}/groups",
            get(institutions::list_institution_groups),
        )
        .route(
            "/institutions/{id}/activities",
            get(institutions::list_institution_activities),
        )
        .route("/rooms", post(rooms::create_room))
        .route(
            "/rooms/{id}",
            get(rooms::get_room)
                .put(rooms::update_room)
                .delete(rooms::delete_room),
        )
        .route("/groups", post(groups::create_group))
        .route(
            "/groups/{id}",
            get(groups::get_group)
                .put(groups::update_group)
                .delete(groups::delete_group),
        )
        .route("/courses", post(courses::create_course))
        .route(
            "/courses/{id}",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route(
            "/activities",
            get(activities::list_activities).post(activities::create_activity),
        )
        .route(
            "/activities/{id}",
            get(activities::get_activity)
                .put(activities::update_activity)
                .delete(activities::delete_activity),
        )
        .route(
            "/schedules",
            get(schedules::list_schedules).post(schedules::trigger_generation),
        )
        .route(
            "/schedules/{id}",
            get(schedules::get_schedule)
                .put(schedules::update_schedule)
                .delete(schedules::delete_schedule),
        )
        .route(
            "/schedules/{id}/scheduled-activities",
            get(schedules::list_scheduled_activities),
        )
        .with_state(app_state);

    Router::new().nest("/api/v1", api_router).layer((
        // Outermost: per-request ID span + severity-proportional response logging.
        RequestIdLayer,
        CorsLayer::permissive(),
        TimeoutLayer::new(Duration::from_secs(60)),
    ))
}
