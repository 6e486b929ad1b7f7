use serde::{Deserialize, Serialize};

use crate::core::time::{format_optional, format_primitive};
use crate::db::models::{AdminProfile, Student};
use crate::db::types::{AdminRole, StudentStatus};

#[derive(Debug, Serialize)]
pub(crate) struct StudentResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) full_name: String,
    pub(crate) email: String,
    pub(crate) phone: String,
    pub(crate) group: String,
    pub(crate) photo_url: Option<String>,
    pub(crate) redmine_id: Option<String>,
    pub(crate) gitlab_id: Option<String>,
    pub(crate) github_id: Option<String>,
    pub(crate) status: StudentStatus,
    pub(crate) registration_date: String,
    pub(crate) last_activity: String,
}

impl StudentResponse {
    /// `photo_url` is resolved by the caller since it needs object storage.
    pub(crate) fn from_db(student: Student, photo_url: Option<String>) -> Self {
        Self {
            id: student.id,
            student_id: student.student_id,
            full_name: student.full_name,
            email: student.email,
            phone: student.phone,
            group: student.group_name,
            photo_url,
            redmine_id: student.redmine_id,
            gitlab_id: student.gitlab_id,
            github_id: student.github_id,
            status: student.status,
            registration_date: format_primitive(student.registration_date),
            last_activity: format_primitive(student.last_activity),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentListItem {
    #[serde(flatten)]
    pub(crate) student: StudentResponse,
    pub(crate) is_working: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecentWorkerResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) full_name: String,
    pub(crate) group: String,
    pub(crate) last_session_end: Option<String>,
}

impl RecentWorkerResponse {
    pub(crate) fn from_db(student: Student, last_session_end: Option<time::PrimitiveDateTime>) -> Self {
        Self {
            id: student.id,
            student_id: student.student_id,
            full_name: student.full_name,
            group: student.group_name,
            last_session_end: format_optional(last_session_end),
        }
    }
}

/// Raw query string of the admin student list. Unknown values fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StudentListQuery {
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) group: Option<String>,
    #[serde(default)]
    pub(crate) q: Option<String>,
    #[serde(default)]
    pub(crate) sort: Option<String>,
    #[serde(default)]
    pub(crate) page: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentListStats {
    pub(crate) total_students: i64,
    pub(crate) active_students: i64,
    pub(crate) working_now: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct AdminProfileResponse {
    pub(crate) role: AdminRole,
    pub(crate) can_manage_students: bool,
    pub(crate) can_manage_admins: bool,
    pub(crate) can_view_reports: bool,
    pub(crate) is_active: bool,
}

impl AdminProfileResponse {
    pub(crate) fn from_db(profile: AdminProfile) -> Self {
        Self {
            role: profile.role,
            can_manage_students: profile.can_manage_students,
            can_manage_admins: profile.can_manage_admins,
            can_view_reports: profile.can_view_reports,
            is_active: profile.is_active,
        }
    }
}
