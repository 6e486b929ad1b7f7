use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{AdminRole, MessageType, StationStatus, StudentStatus};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Account {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) is_active: bool,
    pub(crate) is_staff: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl Account {
    pub(crate) fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let trimmed = full.trim();
        if trimmed.is_empty() {
            self.username.clone()
        } else {
            trimmed.to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Student {
    pub(crate) id: String,
    pub(crate) account_id: String,
    pub(crate) student_id: String,
    pub(crate) full_name: String,
    pub(crate) email: String,
    pub(crate) phone: String,
    pub(crate) group_name: String,
    pub(crate) photo: Option<String>,
    pub(crate) redmine_id: Option<String>,
    pub(crate) gitlab_id: Option<String>,
    pub(crate) github_id: Option<String>,
    pub(crate) status: StudentStatus,
    pub(crate) registration_date: PrimitiveDateTime,
    pub(crate) last_activity: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct WorkSession {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: Option<PrimitiveDateTime>,
    pub(crate) duration_minutes: i32,
    pub(crate) computer_number: Option<String>,
    pub(crate) is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Message {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) admin_account_id: Option<String>,
    pub(crate) message_type: MessageType,
    pub(crate) subject: String,
    pub(crate) content: String,
    pub(crate) sent_at: PrimitiveDateTime,
    pub(crate) is_read: bool,
    pub(crate) response: Option<String>,
    pub(crate) responded_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AdminProfile {
    pub(crate) id: String,
    pub(crate) account_id: String,
    pub(crate) role: AdminRole,
    pub(crate) phone: String,
    pub(crate) can_manage_students: bool,
    pub(crate) can_manage_admins: bool,
    pub(crate) can_view_reports: bool,
    pub(crate) is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ComputerStation {
    pub(crate) id: String,
    pub(crate) room_number: String,
    pub(crate) room: String,
    pub(crate) ip_address: Option<String>,
    pub(crate) status: StationStatus,
    pub(crate) current_student_id: Option<String>,
    pub(crate) last_used: Option<PrimitiveDateTime>,
}
