use serde::Serialize;

use crate::schemas::station::OccupiedStationResponse;
use crate::schemas::student::{RecentWorkerResponse, StudentResponse};

#[derive(Debug, Serialize)]
pub(crate) struct DashboardResponse {
    pub(crate) total_students: i64,
    pub(crate) working_now: i64,
    pub(crate) active_messages: i64,
    pub(crate) recent_workers: Vec<RecentWorkerResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WorkingResponse {
    pub(crate) working_students: Vec<StudentResponse>,
    pub(crate) occupied_computers: Vec<OccupiedStationResponse>,
    pub(crate) total_working: i64,
    pub(crate) total_computers: i64,
    pub(crate) available_computers: i64,
    pub(crate) current_time: String,
}
