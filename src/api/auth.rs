use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, DefaultBodyLimit, Multipart, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{authenticated_account, CurrentUser};
use crate::api::students::photo_url;
use crate::core::redis::rate_limit_key;
use crate::core::security;
use crate::core::state::AppState;
use crate::db::models::Account;
use crate::repositories;
use crate::schemas::auth::{
    AccountResponse, LoginRequest, MeResponse, RegisterResponse, TokenResponse,
};
use crate::schemas::student::{AdminProfileResponse, StudentResponse};
use crate::services::photos::PhotoUpload;
use crate::services::registration::{self, PgRegistrationStore, RegistrationForm};

/// Max attempts per window for login and registration.
const AUTH_RATE_LIMIT: u64 = 10;
/// Rate limit window in seconds.
const AUTH_RATE_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/register",
            post(register).layer(DefaultBodyLimit::max(max_upload_bytes + 64 * 1024)),
        )
        .route("/login", post(login))
        .route("/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    client: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let dashboard = state.settings().api().dashboard_path.clone();
    if authenticated_account(&state, &headers).await?.is_some() {
        return Ok(Redirect::to(&dashboard).into_response());
    }

    // The peer is throttled before the body, photo included, is read.
    if let Some(ConnectInfo(peer)) = client {
        let client_key = rate_limit_key("register-client", &peer.ip().to_string());
        if !within_auth_limit(&state, &client_key).await {
            return Err(ApiError::TooManyRequests(
                "Too many registration attempts, try again later",
            ));
        }
    }

    let form = read_registration_form(multipart).await?;

    if !within_auth_limit(&state, &rate_limit_key("register", &form.email)).await {
        return Err(ApiError::TooManyRequests("Too many registration attempts, try again later"));
    }

    let store = PgRegistrationStore::new(state.db());
    let registered = registration::register(&store, state.photo_store(), state.settings(), form)
        .await
        .map_err(|err| ApiError::from_registration(err, &state.settings().api().login_path))?;

    let photo = photo_url(&state, registered.student.photo.as_deref()).await;
    let response = RegisterResponse {
        access_token: registered.access_token,
        token_type: "bearer".to_string(),
        account: AccountResponse::from_db(registered.account),
        student: StudentResponse::from_db(registered.student, photo),
        redirect_to: dashboard,
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Fails open when Redis errors.
async fn within_auth_limit(state: &AppState, key: &str) -> bool {
    state
        .redis()
        .rate_limit(key, AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true)
}

async fn read_registration_form(mut multipart: Multipart) -> Result<RegistrationForm, ApiError> {
    let mut form = RegistrationForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "photo" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read photo: {e}")))?;
            // Browsers send an empty part when no file was chosen.
            if !(filename.is_empty() && bytes.is_empty()) {
                form.photo = Some(PhotoUpload { filename, content_type, bytes: bytes.to_vec() });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read field {name}: {e}")))?;
        match name.as_str() {
            "student_id" => form.student_id = value,
            "first_name" => form.first_name = value,
            "last_name" => form.last_name = value,
            "email" => form.email = value,
            "phone" => form.phone = value,
            "group" => form.group = value,
            "password" => form.password = value,
            "password_confirm" => form.password_confirm = value,
            _ => {}
        }
    }

    Ok(form)
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let username = payload.username.trim().to_ascii_lowercase();

    if !within_auth_limit(&state, &rate_limit_key("login", &username)).await {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let account = repositories::accounts::find_by_username(state.db(), &username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch account"))?
        .ok_or(ApiError::Unauthorized("Incorrect username or password"))?;

    let verified = security::verify_password(&payload.password, &account.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect username or password"))?;
    if !verified {
        return Err(ApiError::Unauthorized("Incorrect username or password"));
    }

    if !account.is_active {
        return Err(ApiError::BadRequest("Inactive account".to_string()));
    }

    let token = security::create_access_token(&account.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    let redirect_to = if has_dashboard(&state, &account).await? {
        state.settings().api().dashboard_path.clone()
    } else {
        "/".to_string()
    };

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        account: AccountResponse::from_db(account),
        redirect_to,
    }))
}

/// Students and administrators land on the dashboard after login.
async fn has_dashboard(state: &AppState, account: &Account) -> Result<bool, ApiError> {
    if account.is_staff {
        return Ok(true);
    }

    let student = repositories::students::find_by_account(state.db(), &account.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student profile"))?;
    if student.is_some() {
        return Ok(true);
    }

    let profile = repositories::admin_profiles::find_by_account(state.db(), &account.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch admin profile"))?;
    Ok(profile.is_some_and(|profile| profile.is_active))
}

async fn me(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
) -> Result<Json<MeResponse>, ApiError> {
    let student = repositories::students::find_by_account(state.db(), &account.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student profile"))?;
    let student = match student {
        Some(student) => {
            let photo = photo_url(&state, student.photo.as_deref()).await;
            Some(StudentResponse::from_db(student, photo))
        }
        None => None,
    };

    let admin_profile = repositories::admin_profiles::find_by_account(state.db(), &account.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch admin profile"))?
        .map(AdminProfileResponse::from_db);

    Ok(Json(MeResponse { account: AccountResponse::from_db(account), student, admin_profile }))
}
