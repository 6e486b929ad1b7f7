use std::collections::HashMap;

use serde::Serialize;

pub(crate) mod auth;
pub(crate) mod dashboard;
pub(crate) mod message;
pub(crate) mod station;
pub(crate) mod student;
pub(crate) mod work_session;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) api_prefix: String,
}
