use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::api::pagination::{PageWindow, PaginatedResponse};
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::work_session::{StartSessionRequest, WorkSessionResponse};
use crate::services::work_sessions;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions/start", post(start_session))
        .route("/sessions/stop", post(stop_session))
        .route("/sessions/me", get(my_sessions))
}

#[derive(Debug, Default, Deserialize)]
struct SessionListQuery {
    #[serde(default)]
    page: Option<String>,
}

async fn start_session(
    State(state): State<AppState>,
    CurrentStudent { student, .. }: CurrentStudent,
    payload: Option<Json<StartSessionRequest>>,
) -> Result<(StatusCode, Json<WorkSessionResponse>), ApiError> {
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    let computer_number = payload
        .computer_number
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let session = work_sessions::open_session(state.db(), &student.id, computer_number).await?;

    Ok((StatusCode::CREATED, Json(WorkSessionResponse::from_db(session))))
}

async fn stop_session(
    State(state): State<AppState>,
    CurrentStudent { student, .. }: CurrentStudent,
) -> Result<Json<WorkSessionResponse>, ApiError> {
    let session = work_sessions::close_session(state.db(), &student.id).await?;
    Ok(Json(WorkSessionResponse::from_db(session)))
}

async fn my_sessions(
    State(state): State<AppState>,
    CurrentStudent { student, .. }: CurrentStudent,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<PaginatedResponse<WorkSessionResponse>>, ApiError> {
    let total = repositories::work_sessions::count_by_student(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count work sessions"))?;
    let window = PageWindow::resolve(query.page.as_deref(), total, state.settings().lab().page_size);

    let sessions = repositories::work_sessions::list_by_student(
        state.db(),
        &student.id,
        window.offset(),
        window.page_size,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list work sessions"))?;

    let items = sessions.into_iter().map(WorkSessionResponse::from_db).collect();
    Ok(Json(window.wrap(items, total)))
}
