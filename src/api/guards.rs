use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts, HeaderMap};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::{Account, Student};
use crate::repositories;

pub(crate) struct CurrentUser(pub(crate) Account);

pub(crate) struct CurrentStudent {
    pub(crate) account: Account,
    pub(crate) student: Student,
}

pub(crate) struct CurrentAdmin(pub(crate) Account);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Resolves the bearer token of a request to an active account, if there is one.
pub(crate) async fn authenticated_account(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<Account>, ApiError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(None);
    };
    let Ok(claims) = security::verify_token(token, state.settings()) else {
        return Ok(None);
    };

    let account = repositories::accounts::find_by_id(state.db(), &claims.sub)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load account"))?;

    Ok(account.filter(|account| account.is_active))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let token = bearer_token(&parts.headers)
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let account = repositories::accounts::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load account"))?;

        let Some(account) = account else {
            return Err(ApiError::Unauthorized("Account not found"));
        };

        if !account.is_active {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        Ok(CurrentUser(account))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStudent {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(account) = CurrentUser::from_request_parts(parts, state).await?;

        let student = repositories::students::find_by_account(state.db(), &account.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load student profile"))?;

        match student {
            Some(student) => Ok(CurrentStudent { account, student }),
            None => Err(ApiError::Forbidden("Student profile required")),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(account) = CurrentUser::from_request_parts(parts, state).await?;

        let profile = repositories::admin_profiles::find_by_account(state.db(), &account.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load admin profile"))?
            .filter(|profile| profile.is_active);

        match profile {
            Some(profile) => {
                tracing::debug!(account_id = %account.id, role = profile.role.as_str(), "Admin access");
            }
            None if account.is_staff => {}
            None => return Err(ApiError::Forbidden("Admin access required")),
        }

        Ok(CurrentAdmin(account))
    }
}
