//! Room CRUD handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::data::models::{Room, new_id};
use crate::data::{institutions, rooms};
use crate::state::AppState;
use crate::web::auth::{AuthUser, require_admin, require_member};
use crate::web::error::{ApiError, OptionNotFoundExt, db_error};

#[derive(Debug, Deserialize)]
pub struct CreateRoom {
    pub institution_id: String,
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GetRoom {
    pub room: Room,
}

/// `POST /rooms`
pub async fn create_room(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(request): Json<CreateRoom>,
) -> Result<Json<GetRoom>, ApiError> {
    require_admin(&caller, &request.institution_id)?;
    institutions::find_by_id(&state.db, &request.institution_id)
        .await
        .map_err(|e| db_error("Institution lookup", e))?
        .or_not_found("Institution", &request.institution_id)?;

    let room = Room {
        id: new_id(),
        institution_id: request.institution_id,
        name: request.name,
        capacity: request.capacity,
        features: request.features,
    };
    rooms::insert(&state.db, &room)
        .await
        .map_err(|e| db_error("Room insert", e))?;
    Ok(Json(GetRoom { room }))
}

/// `GET /rooms/{id}`
pub async fn get_room(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(room_id): Path<String>,
) -> Result<Json<GetRoom>, ApiError> {
    let room = rooms::find_by_id(&state.db, &room_id)
        .await
        .map_err(|e| db_error("Room lookup", e))?
        .or_not_found("Room", &room_id)?;
    require_member(&caller, &room.institution_id)?;
    Ok(Json(GetRoom { room }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoom {
    pub name: Option<String>,
    pub capacity: Option<u32>,
    pub features: Option<Vec<String>>,
}

/// `PUT /rooms/{id}`
pub async fn update_room(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(room_id): Path<String>,
    Json(request): Json<UpdateRoom>,
) -> Result<Json<GetRoom>, ApiError> {
    let mut room = rooms::find_by_id(&state.db, &room_id)
        .await
        .map_err(|e| db_error("Room lookup", e))?
        .or_not_found("Room", &room_id)?;
    require_admin(&caller, &room.institution_id)?;

    if let Some(name) = request.name {
        room.name = name;
    }
    if let Some(capacity) = request.capacity {
        room.capacity = capacity;
    }
    if let Some(features) = request.features {
        room.features = features;
    }

    rooms::update_by_id(&state.db, &room)
        .await
        .map_err(|e| db_error("Room update", e))?;
    Ok(Json(GetRoom { room }))
}

/// `DELETE /rooms/{id}`
pub async fn delete_room(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(room_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let room = rooms::find_by_id(&state.db, &room_id)
        .await
        .map_err(|e| db_error("Room lookup", e))?
        .or_not_found("Room", &room_id)?;
    require_admin(&caller, &room.institution_id)?;

    rooms::delete_by_id(&state.db, &room_id)
        .await
        .map_err(|e| db_error("Room delete", e))?;
    Ok(StatusCode::NO_CONTENT)
}
