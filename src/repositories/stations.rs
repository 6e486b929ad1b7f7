use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::ComputerStation;
use crate::db::types::StationStatus;

pub(crate) const COLUMNS: &str = "\
    id, room_number, room, ip_address, status, current_student_id, last_used";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OccupiedStationRow {
    pub(crate) id: String,
    pub(crate) room_number: String,
    pub(crate) room: String,
    pub(crate) last_used: Option<PrimitiveDateTime>,
    pub(crate) student_id: Option<String>,
    pub(crate) student_code: Option<String>,
    pub(crate) student_full_name: Option<String>,
}

#[cfg(test)]
pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<ComputerStation>, sqlx::Error> {
    sqlx::query_as::<_, ComputerStation>(&format!(
        "SELECT {COLUMNS} FROM computer_stations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn lock_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<ComputerStation>, sqlx::Error> {
    sqlx::query_as::<_, ComputerStation>(&format!(
        "SELECT {COLUMNS} FROM computer_stations WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn lock_by_room_number(
    executor: impl sqlx::PgExecutor<'_>,
    room_number: &str,
) -> Result<Option<ComputerStation>, sqlx::Error> {
    sqlx::query_as::<_, ComputerStation>(&format!(
        "SELECT {COLUMNS} FROM computer_stations WHERE room_number = $1 FOR UPDATE"
    ))
    .bind(room_number)
    .fetch_optional(executor)
    .await
}

pub(crate) struct CreateStation<'a> {
    pub(crate) id: &'a str,
    pub(crate) room_number: &'a str,
    pub(crate) room: &'a str,
    pub(crate) ip_address: Option<&'a str>,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateStation<'_>,
) -> Result<ComputerStation, sqlx::Error> {
    sqlx::query_as::<_, ComputerStation>(&format!(
        "INSERT INTO computer_stations (id, room_number, room, ip_address, status)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.room_number)
    .bind(params.room)
    .bind(params.ip_address)
    .bind(StationStatus::Available)
    .fetch_one(executor)
    .await
}

pub(crate) async fn occupy(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    student_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE computer_stations SET status = $1, current_student_id = $2 WHERE id = $3",
    )
    .bind(StationStatus::Occupied)
    .bind(student_id)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Frees the station only while it is still held by `student_id`. Returns whether it was freed.
pub(crate) async fn release(
    executor: impl sqlx::PgExecutor<'_>,
    room_number: &str,
    student_id: &str,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE computer_stations
         SET status = $1, current_student_id = NULL, last_used = $2
         WHERE room_number = $3 AND current_student_id = $4",
    )
    .bind(StationStatus::Available)
    .bind(now)
    .bind(room_number)
    .bind(student_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn set_status(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    status: StationStatus,
) -> Result<ComputerStation, sqlx::Error> {
    sqlx::query_as::<_, ComputerStation>(&format!(
        "UPDATE computer_stations SET status = $1 WHERE id = $2 RETURNING {COLUMNS}"
    ))
    .bind(status)
    .bind(id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<ComputerStation>, sqlx::Error> {
    sqlx::query_as::<_, ComputerStation>(&format!(
        "SELECT {COLUMNS} FROM computer_stations ORDER BY room_number"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_occupied(pool: &PgPool) -> Result<Vec<OccupiedStationRow>, sqlx::Error> {
    sqlx::query_as::<_, OccupiedStationRow>(
        "SELECT c.id, c.room_number, c.room, c.last_used,
                s.id AS student_id, s.student_id AS student_code, s.full_name AS student_full_name
         FROM computer_stations c
         LEFT JOIN students s ON s.id = c.current_student_id
         WHERE c.status = $1
         ORDER BY c.room_number",
    )
    .bind(StationStatus::Occupied)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_all(executor: impl sqlx::PgExecutor<'_>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM computer_stations").fetch_one(executor).await
}

pub(crate) async fn count_by_status(
    executor: impl sqlx::PgExecutor<'_>,
    status: StationStatus,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM computer_stations WHERE status = $1")
        .bind(status)
        .fetch_one(executor)
        .await
}
