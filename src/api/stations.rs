use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::db::types::StationStatus;
use crate::repositories;
use crate::schemas::station::{StationCreate, StationResponse, StationStatusUpdate};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/stations", get(list_stations))
        .route("/admin/stations", post(create_station))
        .route("/admin/stations/:station_id", patch(update_station_status))
}

async fn list_stations(State(state): State<AppState>) -> Result<Json<Vec<StationResponse>>, ApiError> {
    let stations = repositories::stations::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list stations"))?;

    Ok(Json(stations.into_iter().map(StationResponse::from_db).collect()))
}

async fn create_station(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Json(payload): Json<StationCreate>,
) -> Result<(StatusCode, Json<StationResponse>), ApiError> {
    payload.validate().map_err(|errors| ApiError::from_validation(&errors))?;

    let ip_address = payload.ip_address.as_deref().map(str::trim).filter(|ip| !ip.is_empty());
    let result = repositories::stations::create(
        state.db(),
        repositories::stations::CreateStation {
            id: &Uuid::new_v4().to_string(),
            room_number: payload.room_number.trim(),
            room: payload.room.trim(),
            ip_address,
        },
    )
    .await;

    let station = match result {
        Ok(station) => station,
        Err(err) if crate::db::is_unique_violation(&err) => {
            return Err(ApiError::Conflict(format!(
                "Station {} already exists",
                payload.room_number.trim()
            )));
        }
        Err(err) => return Err(ApiError::internal(err, "Failed to create station")),
    };

    tracing::info!(admin_id = %admin.id, room_number = %station.room_number, "Station created");

    Ok((StatusCode::CREATED, Json(StationResponse::from_db(station))))
}

/// Occupancy is driven by work sessions, so admins may only toggle maintenance.
fn check_status_change(
    station_status: StationStatus,
    requested: StationStatus,
) -> Result<(), ApiError> {
    if requested == StationStatus::Occupied {
        return Err(ApiError::BadRequest(
            "Status must be either available or maintenance".to_string(),
        ));
    }
    if station_status == StationStatus::Occupied {
        return Err(ApiError::Conflict("Station is occupied by an active session".to_string()));
    }
    Ok(())
}

async fn update_station_status(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(station_id): Path<String>,
    Json(payload): Json<StationStatusUpdate>,
) -> Result<Json<StationResponse>, ApiError> {
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let station = repositories::stations::lock_by_id(&mut *tx, &station_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch station"))?
        .ok_or_else(|| ApiError::NotFound("Station not found".to_string()))?;

    check_status_change(station.status, payload.status)?;

    let station = repositories::stations::set_status(&mut *tx, &station.id, payload.status)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update station"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        admin_id = %admin.id,
        room_number = %station.room_number,
        status = ?station.status,
        "Station status changed"
    );

    Ok(Json(StationResponse::from_db(station)))
}
