use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentStudent};
use crate::api::pagination::{PageWindow, PaginatedResponse};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::MessageType;
use crate::repositories;
use crate::repositories::messages::MessageFilter;
use crate::schemas::message::{
    MessageCreate, MessageListItem, MessageListQuery, MessageRespond, MessageResponse,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/messages", post(send_message))
        .route("/messages/me", get(my_messages))
        .route("/admin/messages", get(list_messages))
        .route("/admin/messages/:message_id/respond", post(respond_to_message))
        .route("/admin/messages/:message_id/read", post(mark_message_read))
}

#[derive(Debug, Serialize)]
struct MessageListResponse {
    #[serde(flatten)]
    page: PaginatedResponse<MessageListItem>,
    unread_count: i64,
}

async fn send_message(
    State(state): State<AppState>,
    CurrentStudent { student, .. }: CurrentStudent,
    Json(payload): Json<MessageCreate>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    payload.validate().map_err(|errors| ApiError::from_validation(&errors))?;

    let message = repositories::messages::create(
        state.db(),
        repositories::messages::CreateMessage {
            id: &Uuid::new_v4().to_string(),
            student_id: &student.id,
            message_type: payload.message_type,
            subject: payload.subject.trim(),
            content: payload.content.trim(),
            sent_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to send message"))?;

    tracing::info!(
        student_id = %student.id,
        message_id = %message.id,
        message_type = ?message.message_type,
        "Message sent"
    );

    Ok((StatusCode::CREATED, Json(MessageResponse::from_db(message))))
}

async fn my_messages(
    State(state): State<AppState>,
    CurrentStudent { student, .. }: CurrentStudent,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let messages = repositories::messages::list_by_student(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list messages"))?;

    Ok(Json(messages.into_iter().map(MessageResponse::from_db).collect()))
}

fn filter_from_query(query: &MessageListQuery) -> MessageFilter {
    let is_read = match query.read.as_deref().map(str::trim) {
        Some("read") | Some("true") | Some("1") => Some(true),
        Some("unread") | Some("false") | Some("0") => Some(false),
        _ => None,
    };

    MessageFilter {
        message_type: query.message_type.as_deref().and_then(MessageType::parse),
        is_read,
        search: query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string),
    }
}

async fn list_messages(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let filter = filter_from_query(&query);

    let total = repositories::messages::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count messages"))?;
    let window = PageWindow::resolve(query.page.as_deref(), total, state.settings().lab().page_size);

    let items = repositories::messages::list(state.db(), &filter, window.offset(), window.page_size)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list messages"))?
        .into_iter()
        .map(MessageListItem::from_row)
        .collect();

    let unread_count = repositories::messages::count_unread(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count unread messages"))?;

    Ok(Json(MessageListResponse { page: window.wrap(items, total), unread_count }))
}

async fn respond_to_message(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(message_id): Path<String>,
    Json(payload): Json<MessageRespond>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload.validate().map_err(|errors| ApiError::from_validation(&errors))?;

    let message = repositories::messages::respond(
        state.db(),
        &message_id,
        &admin.id,
        payload.response.trim(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to respond to message"))?
    .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))?;

    tracing::info!(admin_id = %admin.id, message_id = %message.id, "Message answered");

    Ok(Json(MessageResponse::from_db(message)))
}

async fn mark_message_read(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(message_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = repositories::messages::mark_read(state.db(), &message_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update message"))?
        .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))?;

    Ok(Json(MessageResponse::from_db(message)))
}
