use axum::{extract::State, routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::students::photo_url;
use crate::core::state::AppState;
use crate::core::time::{days_before, format_primitive, primitive_now_utc};
use crate::db::types::StationStatus;
use crate::repositories;
use crate::schemas::dashboard::{DashboardResponse, WorkingResponse};
use crate::schemas::station::OccupiedStationResponse;
use crate::schemas::student::{RecentWorkerResponse, StudentResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/working", get(working))
}

async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, ApiError> {
    let lab = state.settings().lab();
    let since = days_before(primitive_now_utc(), lab.message_window_days);

    let total_students = repositories::students::count_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count students"))?;
    let working_now = repositories::students::count_working(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count working students"))?;
    let active_messages = repositories::messages::count_since(state.db(), since)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count messages"))?;

    let recent_workers = repositories::students::list_recent_workers(state.db(), lab.recent_workers_limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list recent workers"))?
        .into_iter()
        .map(|row| RecentWorkerResponse::from_db(row.student, row.last_session_end))
        .collect();

    Ok(Json(DashboardResponse { total_students, working_now, active_messages, recent_workers }))
}

async fn working(State(state): State<AppState>) -> Result<Json<WorkingResponse>, ApiError> {
    let students = repositories::students::list_working(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list working students"))?;

    let mut working_students = Vec::with_capacity(students.len());
    for student in students {
        let photo = photo_url(&state, student.photo.as_deref()).await;
        working_students.push(StudentResponse::from_db(student, photo));
    }

    let occupied_computers: Vec<OccupiedStationResponse> =
        repositories::stations::list_occupied(state.db())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list occupied stations"))?
            .into_iter()
            .map(OccupiedStationResponse::from_row)
            .collect();

    let total_computers = repositories::stations::count_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count stations"))?;
    let available_computers =
        repositories::stations::count_by_status(state.db(), StationStatus::Available)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count stations"))?;

    Ok(Json(WorkingResponse {
        total_working: working_students.len() as i64,
        working_students,
        occupied_computers,
        total_computers,
        available_computers,
        current_time: format_primitive(primitive_now_utc()),
    }))
}
