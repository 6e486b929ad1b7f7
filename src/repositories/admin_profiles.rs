use crate::db::models::AdminProfile;
use crate::db::types::AdminRole;

const COLUMNS: &str = "\
    id, account_id, role, phone, can_manage_students, can_manage_admins, \
    can_view_reports, is_active";

pub(crate) async fn find_by_account(
    executor: impl sqlx::PgExecutor<'_>,
    account_id: &str,
) -> Result<Option<AdminProfile>, sqlx::Error> {
    sqlx::query_as::<_, AdminProfile>(&format!(
        "SELECT {COLUMNS} FROM admin_profiles WHERE account_id = $1"
    ))
    .bind(account_id)
    .fetch_optional(executor)
    .await
}

pub(crate) struct UpsertAdminProfile<'a> {
    pub(crate) id: &'a str,
    pub(crate) account_id: &'a str,
    pub(crate) role: AdminRole,
    pub(crate) can_manage_students: bool,
    pub(crate) can_manage_admins: bool,
}

/// Inserts the profile, or re-activates the existing one with the given role and capabilities.
pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    params: UpsertAdminProfile<'_>,
) -> Result<AdminProfile, sqlx::Error> {
    sqlx::query_as::<_, AdminProfile>(&format!(
        "INSERT INTO admin_profiles (
            id, account_id, role, can_manage_students, can_manage_admins, is_active
        ) VALUES ($1,$2,$3,$4,$5,TRUE)
        ON CONFLICT (account_id) DO UPDATE SET
            role = EXCLUDED.role,
            can_manage_students = EXCLUDED.can_manage_students,
            can_manage_admins = EXCLUDED.can_manage_admins,
            is_active = TRUE
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.account_id)
    .bind(params.role)
    .bind(params.can_manage_students)
    .bind(params.can_manage_admins)
    .fetch_one(executor)
    .await
}
