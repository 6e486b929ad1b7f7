use serde::{Deserialize, Serialize};

use crate::core::time::{format_optional, format_primitive};
use crate::db::models::WorkSession;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StartSessionRequest {
    #[serde(default)]
    pub(crate) computer_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WorkSessionResponse {
    pub(crate) id: String,
    pub(crate) start_time: String,
    pub(crate) end_time: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) computer_number: Option<String>,
    pub(crate) is_active: bool,
}

impl WorkSessionResponse {
    pub(crate) fn from_db(session: WorkSession) -> Self {
        Self {
            id: session.id,
            start_time: format_primitive(session.start_time),
            end_time: format_optional(session.end_time),
            duration_minutes: session.duration_minutes,
            computer_number: session.computer_number,
            is_active: session.is_active,
        }
    }
}
