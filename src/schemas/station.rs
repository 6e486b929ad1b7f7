use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_optional;
use crate::db::models::ComputerStation;
use crate::db::types::StationStatus;
use crate::repositories::stations::OccupiedStationRow;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StationCreate {
    #[validate(length(min = 1, max = 10, message = "room_number must be 1 to 10 characters"))]
    pub(crate) room_number: String,
    #[validate(length(min = 1, max = 50, message = "room must be 1 to 50 characters"))]
    pub(crate) room: String,
    #[serde(default)]
    pub(crate) ip_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StationStatusUpdate {
    pub(crate) status: StationStatus,
}

#[derive(Debug, Serialize)]
pub(crate) struct StationResponse {
    pub(crate) id: String,
    pub(crate) room_number: String,
    pub(crate) room: String,
    pub(crate) ip_address: Option<String>,
    pub(crate) status: StationStatus,
    pub(crate) current_student_id: Option<String>,
    pub(crate) last_used: Option<String>,
}

impl StationResponse {
    pub(crate) fn from_db(station: ComputerStation) -> Self {
        Self {
            id: station.id,
            room_number: station.room_number,
            room: station.room,
            ip_address: station.ip_address,
            status: station.status,
            current_student_id: station.current_student_id,
            last_used: format_optional(station.last_used),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OccupiedStationResponse {
    pub(crate) id: String,
    pub(crate) room_number: String,
    pub(crate) room: String,
    pub(crate) last_used: Option<String>,
    pub(crate) student_id: Option<String>,
    pub(crate) student_code: Option<String>,
    pub(crate) student_full_name: Option<String>,
}

impl OccupiedStationResponse {
    pub(crate) fn from_row(row: OccupiedStationRow) -> Self {
        Self {
            id: row.id,
            room_number: row.room_number,
            room: row.room,
            last_used: format_optional(row.last_used),
            student_id: row.student_id,
            student_code: row.student_code,
            student_full_name: row.student_full_name,
        }
    }
}
