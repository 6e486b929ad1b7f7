use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Student;
use crate::db::types::StudentStatus;

pub(crate) const COLUMNS: &str = "\
    id, account_id, student_id, full_name, email, phone, group_name, photo, \
    redmine_id, gitlab_id, github_id, status, registration_date, last_activity";

const PREFIXED_COLUMNS: &str = "\
    s.id, s.account_id, s.student_id, s.full_name, s.email, s.phone, s.group_name, s.photo, \
    s.redmine_id, s.gitlab_id, s.github_id, s.status, s.registration_date, s.last_activity";

const IS_WORKING: &str =
    "EXISTS (SELECT 1 FROM work_sessions ws WHERE ws.student_id = s.id AND ws.is_active)";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RecentWorkerRow {
    #[sqlx(flatten)]
    pub(crate) student: Student,
    pub(crate) last_session_end: Option<PrimitiveDateTime>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct StudentListRow {
    #[sqlx(flatten)]
    pub(crate) student: Student,
    pub(crate) is_working: bool,
}

/// Sort keys accepted by the admin listing. Anything else falls back to the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StudentSortKey {
    RegistrationDate,
    FullName,
    StudentId,
    Group,
    Status,
    LastActivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StudentSort {
    pub(crate) key: StudentSortKey,
    pub(crate) descending: bool,
}

impl Default for StudentSort {
    fn default() -> Self {
        Self { key: StudentSortKey::RegistrationDate, descending: true }
    }
}

impl StudentSort {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (descending, name) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let key = match name {
            "registration_date" => StudentSortKey::RegistrationDate,
            "full_name" => StudentSortKey::FullName,
            "student_id" => StudentSortKey::StudentId,
            "group" => StudentSortKey::Group,
            "status" => StudentSortKey::Status,
            "last_activity" => StudentSortKey::LastActivity,
            _ => return None,
        };
        Some(Self { key, descending })
    }

    fn column(self) -> &'static str {
        match self.key {
            StudentSortKey::RegistrationDate => "s.registration_date",
            StudentSortKey::FullName => "s.full_name",
            StudentSortKey::StudentId => "s.student_id",
            StudentSortKey::Group => "s.group_name",
            StudentSortKey::Status => "s.status",
            StudentSortKey::LastActivity => "s.last_activity",
        }
    }

    fn direction(self) -> &'static str {
        if self.descending {
            "DESC"
        } else {
            "ASC"
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct StudentFilter {
    pub(crate) status: Option<StudentStatus>,
    pub(crate) group: Option<String>,
    pub(crate) search: Option<String>,
}

pub(crate) async fn find_by_account(
    executor: impl sqlx::PgExecutor<'_>,
    account_id: &str,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("SELECT {COLUMNS} FROM students WHERE account_id = $1"))
        .bind(account_id)
        .fetch_optional(executor)
        .await
}

/// Row lock serializing concurrent session changes for one student.
pub(crate) async fn lock_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "SELECT {COLUMNS} FROM students WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn student_id_exists(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM students WHERE student_id = $1)")
        .bind(student_id)
        .fetch_one(executor)
        .await
}

pub(crate) async fn email_exists(
    executor: impl sqlx::PgExecutor<'_>,
    email: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM students WHERE lower(email) = lower($1))",
    )
    .bind(email)
    .fetch_one(executor)
    .await
}

pub(crate) struct CreateStudent<'a> {
    pub(crate) id: &'a str,
    pub(crate) account_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) full_name: &'a str,
    pub(crate) email: &'a str,
    pub(crate) phone: &'a str,
    pub(crate) group_name: &'a str,
    pub(crate) photo: Option<&'a str>,
    pub(crate) registered_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateStudent<'_>,
) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "INSERT INTO students (
            id, account_id, student_id, full_name, email, phone, group_name, photo,
            status, registration_date, last_activity
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.account_id)
    .bind(params.student_id)
    .bind(params.full_name)
    .bind(params.email)
    .bind(params.phone)
    .bind(params.group_name)
    .bind(params.photo)
    .bind(StudentStatus::Active)
    .bind(params.registered_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn touch_last_activity(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE students SET last_activity = $1 WHERE id = $2")
        .bind(now)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn count_all(executor: impl sqlx::PgExecutor<'_>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM students").fetch_one(executor).await
}

pub(crate) async fn count_by_status(
    executor: impl sqlx::PgExecutor<'_>,
    status: StudentStatus,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE status = $1")
        .bind(status)
        .fetch_one(executor)
        .await
}

pub(crate) async fn count_working(executor: impl sqlx::PgExecutor<'_>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(DISTINCT student_id) FROM work_sessions WHERE is_active")
        .fetch_one(executor)
        .await
}

pub(crate) async fn list_working(pool: &PgPool) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "SELECT {PREFIXED_COLUMNS} FROM students s WHERE {IS_WORKING} ORDER BY s.full_name"
    ))
    .fetch_all(pool)
    .await
}

/// Students with no open session, most recently finished first.
pub(crate) async fn list_recent_workers(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<RecentWorkerRow>, sqlx::Error> {
    sqlx::query_as::<_, RecentWorkerRow>(&format!(
        "SELECT {PREFIXED_COLUMNS}, MAX(closed.end_time) AS last_session_end
         FROM students s
         JOIN work_sessions closed ON closed.student_id = s.id AND NOT closed.is_active
         WHERE NOT {IS_WORKING}
         GROUP BY s.id
         ORDER BY last_session_end DESC NULLS LAST
         LIMIT $1"
    ))
    .bind(limit.clamp(1, 100))
    .fetch_all(pool)
    .await
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &StudentFilter) {
    builder.push(" WHERE TRUE");

    if let Some(status) = filter.status {
        builder.push(" AND s.status = ");
        builder.push_bind(status);
    }

    if let Some(group) = filter.group.as_deref().filter(|value| !value.is_empty()) {
        builder.push(" AND s.group_name = ");
        builder.push_bind(group.to_string());
    }

    if let Some(search) = filter.search.as_deref().filter(|value| !value.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        builder.push(" AND (s.student_id ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR s.full_name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR s.email ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR s.phone ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &StudentFilter,
    sort: StudentSort,
    skip: i64,
    limit: i64,
) -> Result<Vec<StudentListRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {PREFIXED_COLUMNS}, {IS_WORKING} AS is_working FROM students s"
    ));
    push_filters(&mut builder, filter);

    builder.push(format!(" ORDER BY {} {}, s.id ASC", sort.column(), sort.direction()));
    builder.push(" OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<StudentListRow>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, filter: &StudentFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM students s");
    push_filters(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

/// Escapes `%`, `_` and `\` so user input matches literally inside ILIKE.
pub(crate) fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_parses_whitelisted_keys_with_direction() {
        assert_eq!(
            StudentSort::parse("-full_name"),
            Some(StudentSort { key: StudentSortKey::FullName, descending: true })
        );
        assert_eq!(
            StudentSort::parse("group"),
            Some(StudentSort { key: StudentSortKey::Group, descending: false })
        );
        assert_eq!(StudentSort::parse("password"), None);
        assert_eq!(StudentSort::parse("full_name; DROP TABLE students"), None);
    }

    #[test]
    fn default_sort_is_newest_registration_first() {
        let sort = StudentSort::default();
        assert_eq!(sort.column(), "s.registration_date");
        assert_eq!(sort.direction(), "DESC");
    }

    async fn worked(pool: &PgPool, student: &Student, start: PrimitiveDateTime, end: Option<PrimitiveDateTime>) {
        use crate::repositories::work_sessions::{self, CreateWorkSession};

        let opened = work_sessions::create(
            pool,
            CreateWorkSession {
                id: &uuid::Uuid::new_v4().to_string(),
                student_id: &student.id,
                computer_number: None,
                start_time: start,
            },
        )
        .await
        .expect("open session");

        if let Some(end) = end {
            let closed = crate::services::work_sessions::closed_at(&opened, end);
            work_sessions::close(pool, &closed).await.expect("close session");
        }
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database at DATABASE_URL"]
    async fn recent_workers_follow_latest_closed_session_and_skip_working_students() {
        use time::macros::datetime;

        let db = crate::test_support::test_db().await;
        let pool = &db.pool;
        let early_and_late = crate::test_support::seed_student(pool, "PA").await;
        let middle = crate::test_support::seed_student(pool, "PB").await;
        let back_at_work = crate::test_support::seed_student(pool, "PC").await;
        crate::test_support::seed_student(pool, "PD").await;

        worked(pool, &early_and_late, datetime!(2025-01-01 09:00), Some(datetime!(2025-01-01 10:00))).await;
        worked(pool, &early_and_late, datetime!(2025-01-05 09:00), Some(datetime!(2025-01-05 10:00))).await;
        worked(pool, &middle, datetime!(2025-01-02 09:00), Some(datetime!(2025-01-02 10:00))).await;
        worked(pool, &back_at_work, datetime!(2025-01-03 09:00), Some(datetime!(2025-01-03 10:00))).await;
        worked(pool, &back_at_work, datetime!(2025-01-04 09:00), None).await;

        let recent = list_recent_workers(pool, 10).await.expect("recent workers");
        let codes: Vec<&str> = recent.iter().map(|row| row.student.student_id.as_str()).collect();
        assert_eq!(codes, vec!["PA", "PB"]);
        assert_eq!(recent[0].last_session_end, Some(datetime!(2025-01-05 10:00)));

        let top = list_recent_workers(pool, 1).await.expect("recent workers");
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].student.student_id, "PA");

        assert_eq!(count_working(pool).await.expect("working"), 1);
    }

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_a\\b"), "50\\%\\_a\\\\b");
        assert_eq!(escape_like("Ivan"), "Ivan");
    }
}
