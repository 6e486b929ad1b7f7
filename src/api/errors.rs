use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::registration::{FieldErrors, RegistrationError};
use crate::services::work_sessions::WorkSessionError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    login_url: Option<String>,
}

impl ErrorResponse {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self { status: status.as_u16(), detail: detail.into(), errors: None, login_url: None }
    }
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    /// Per-field form errors, answered with 422.
    Validation(FieldErrors),
    /// The caller should log in by hand at `login_url`.
    AuthenticationFailure { detail: &'static str, login_url: String },
    TooManyRequests(&'static str),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    pub(crate) fn from_validation(errors: &validator::ValidationErrors) -> Self {
        Self::Validation(FieldErrors::from_validation(errors))
    }

    pub(crate) fn from_registration(err: RegistrationError, login_url: &str) -> Self {
        match err {
            RegistrationError::Fields(errors) => Self::Validation(errors),
            RegistrationError::Collision(_) => Self::Conflict(
                "A student with this email or student ID is already registered".to_string(),
            ),
            RegistrationError::Authentication => Self::AuthenticationFailure {
                detail: "Registration succeeded but automatic sign-in failed. Please log in.",
                login_url: login_url.to_string(),
            },
            RegistrationError::Persistence(err) => {
                Self::internal(format!("{err:#}"), "Registration failed, please try again later")
            }
        }
    }
}

impl From<WorkSessionError> for ApiError {
    fn from(err: WorkSessionError) -> Self {
        match err {
            WorkSessionError::StudentNotFound => Self::NotFound("Student not found".to_string()),
            WorkSessionError::AlreadyActive | WorkSessionError::NotActive => {
                Self::Conflict(capitalize(&err.to_string()))
            }
            WorkSessionError::StationNotFound(_) => Self::NotFound(capitalize(&err.to_string())),
            WorkSessionError::StationUnavailable { .. } => {
                Self::Conflict(capitalize(&err.to_string()))
            }
            WorkSessionError::Database(err) => Self::internal(err, "Failed to update work session"),
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let status = StatusCode::UNAUTHORIZED;
                let mut response =
                    (status, Json(ErrorResponse::new(status, message))).into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => {
                let status = StatusCode::FORBIDDEN;
                (status, Json(ErrorResponse::new(status, message))).into_response()
            }
            ApiError::BadRequest(message) => {
                let status = StatusCode::BAD_REQUEST;
                (status, Json(ErrorResponse::new(status, message))).into_response()
            }
            ApiError::NotFound(message) => {
                let status = StatusCode::NOT_FOUND;
                (status, Json(ErrorResponse::new(status, message))).into_response()
            }
            ApiError::Conflict(message) => {
                let status = StatusCode::CONFLICT;
                (status, Json(ErrorResponse::new(status, message))).into_response()
            }
            ApiError::Validation(errors) => {
                let status = StatusCode::UNPROCESSABLE_ENTITY;
                let body = ErrorResponse {
                    errors: Some(errors),
                    ..ErrorResponse::new(status, "Please correct the errors below")
                };
                (status, Json(body)).into_response()
            }
            ApiError::AuthenticationFailure { detail, login_url } => {
                let status = StatusCode::UNAUTHORIZED;
                let body =
                    ErrorResponse { login_url: Some(login_url), ..ErrorResponse::new(status, detail) };
                (status, Json(body)).into_response()
            }
            ApiError::TooManyRequests(message) => {
                let status = StatusCode::TOO_MANY_REQUESTS;
                (status, Json(ErrorResponse::new(status, message))).into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (status, Json(ErrorResponse::new(status, message))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::registration::CollisionField;

    #[test]
    fn collisions_do_not_reveal_the_field() {
        let email = ApiError::from_registration(
            RegistrationError::Collision(CollisionField::Email),
            "/login",
        );
        let student_id = ApiError::from_registration(
            RegistrationError::Collision(CollisionField::StudentId),
            "/login",
        );
        match (email, student_id) {
            (ApiError::Conflict(a), ApiError::Conflict(b)) => assert_eq!(a, b),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn field_errors_become_validation_response() {
        let mut errors = FieldErrors::default();
        errors.add("password_confirm", "Passwords do not match");
        let response =
            ApiError::from_registration(RegistrationError::Fields(errors), "/login").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn persistence_errors_hide_the_cause() {
        let err = ApiError::from_registration(
            RegistrationError::Persistence(anyhow::anyhow!("connection reset by peer")),
            "/login",
        );
        match err {
            ApiError::Internal(message) => assert!(!message.contains("connection reset")),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn work_session_conflicts_map_to_409() {
        let response = ApiError::from(WorkSessionError::AlreadyActive).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let response =
            ApiError::from(WorkSessionError::StationNotFound("9".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
