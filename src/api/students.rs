use std::time::Duration;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::pagination::{PageWindow, PaginatedResponse};
use crate::core::state::AppState;
use crate::db::types::StudentStatus;
use crate::repositories;
use crate::repositories::students::{StudentFilter, StudentSort};
use crate::schemas::student::{StudentListItem, StudentListQuery, StudentListStats, StudentResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/admin/students", get(list_students))
}

/// Presigned URL for a stored photo key. Storage failures only cost the photo.
pub(crate) async fn photo_url(state: &AppState, key: Option<&str>) -> Option<String> {
    let key = key.filter(|key| !key.is_empty())?;
    let storage = state.storage()?;
    let expires =
        Duration::from_secs(state.settings().storage().presigned_url_expire_minutes * 60);

    match storage.presign_get(key, expires).await {
        Ok(url) => Some(url),
        Err(err) => {
            tracing::warn!(error = %err, key, "Failed to presign photo URL");
            None
        }
    }
}

#[derive(Debug, Serialize)]
struct StudentListResponse {
    #[serde(flatten)]
    page: PaginatedResponse<StudentListItem>,
    stats: StudentListStats,
}

fn filter_from_query(query: &StudentListQuery) -> StudentFilter {
    let non_empty = |value: &Option<String>| {
        value.as_deref().map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
    };

    StudentFilter {
        status: query.status.as_deref().and_then(StudentStatus::parse),
        group: non_empty(&query.group),
        search: non_empty(&query.q),
    }
}

async fn list_students(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Query(query): Query<StudentListQuery>,
) -> Result<Json<StudentListResponse>, ApiError> {
    let filter = filter_from_query(&query);
    let sort = query.sort.as_deref().and_then(StudentSort::parse).unwrap_or_default();

    let total = repositories::students::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count students"))?;
    let window = PageWindow::resolve(query.page.as_deref(), total, state.settings().lab().page_size);

    let rows =
        repositories::students::list(state.db(), &filter, sort, window.offset(), window.page_size)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list students"))?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let photo = photo_url(&state, row.student.photo.as_deref()).await;
        items.push(StudentListItem {
            student: StudentResponse::from_db(row.student, photo),
            is_working: row.is_working,
        });
    }

    let stats = StudentListStats {
        total_students: repositories::students::count_all(state.db())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count students"))?,
        active_students: repositories::students::count_by_status(state.db(), StudentStatus::Active)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count students"))?,
        working_now: repositories::students::count_working(state.db())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count working students"))?,
    };

    tracing::debug!(admin_id = %admin.id, total, page = window.page, "Listed students");

    Ok(Json(StudentListResponse { page: window.wrap(items, total), stats }))
}
