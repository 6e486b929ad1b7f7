use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::Account;
use crate::schemas::student::{AdminProfileResponse, StudentResponse};

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) username: String,
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AccountResponse {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) display_name: String,
    pub(crate) is_active: bool,
    pub(crate) is_staff: bool,
    pub(crate) created_at: String,
}

impl AccountResponse {
    pub(crate) fn from_db(account: Account) -> Self {
        Self {
            display_name: account.display_name(),
            id: account.id,
            username: account.username,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            is_active: account.is_active,
            is_staff: account.is_staff,
            created_at: format_primitive(account.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) account: AccountResponse,
    pub(crate) redirect_to: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) account: AccountResponse,
    pub(crate) student: StudentResponse,
    pub(crate) redirect_to: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MeResponse {
    pub(crate) account: AccountResponse,
    pub(crate) student: Option<StudentResponse>,
    pub(crate) admin_profile: Option<AdminProfileResponse>,
}
