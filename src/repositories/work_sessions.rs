use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::WorkSession;

pub(crate) const COLUMNS: &str = "\
    id, student_id, start_time, end_time, duration_minutes, computer_number, is_active";

pub(crate) async fn find_active(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
) -> Result<Option<WorkSession>, sqlx::Error> {
    sqlx::query_as::<_, WorkSession>(&format!(
        "SELECT {COLUMNS} FROM work_sessions WHERE student_id = $1 AND is_active"
    ))
    .bind(student_id)
    .fetch_optional(executor)
    .await
}

pub(crate) struct CreateWorkSession<'a> {
    pub(crate) id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) computer_number: Option<&'a str>,
    pub(crate) start_time: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateWorkSession<'_>,
) -> Result<WorkSession, sqlx::Error> {
    sqlx::query_as::<_, WorkSession>(&format!(
        "INSERT INTO work_sessions (
            id, student_id, start_time, end_time, duration_minutes, computer_number, is_active
        ) VALUES ($1,$2,$3,NULL,0,$4,TRUE)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.start_time)
    .bind(params.computer_number)
    .fetch_one(executor)
    .await
}

pub(crate) async fn close(
    executor: impl sqlx::PgExecutor<'_>,
    session: &WorkSession,
) -> Result<WorkSession, sqlx::Error> {
    sqlx::query_as::<_, WorkSession>(&format!(
        "UPDATE work_sessions
         SET end_time = $1, duration_minutes = $2, is_active = FALSE
         WHERE id = $3
         RETURNING {COLUMNS}",
    ))
    .bind(session.end_time)
    .bind(session.duration_minutes)
    .bind(&session.id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_student(
    pool: &PgPool,
    student_id: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<WorkSession>, sqlx::Error> {
    sqlx::query_as::<_, WorkSession>(&format!(
        "SELECT {COLUMNS} FROM work_sessions WHERE student_id = $1
         ORDER BY start_time DESC OFFSET $2 LIMIT $3"
    ))
    .bind(student_id)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_student(pool: &PgPool, student_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM work_sessions WHERE student_id = $1")
        .bind(student_id)
        .fetch_one(pool)
        .await
}
