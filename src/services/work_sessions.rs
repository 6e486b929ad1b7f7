use sqlx::PgPool;
use thiserror::Error;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::core::{metrics, time::primitive_now_utc};
use crate::db::models::WorkSession;
use crate::db::types::StationStatus;
use crate::repositories;

#[derive(Debug, Error)]
pub(crate) enum WorkSessionError {
    #[error("student not found")]
    StudentNotFound,
    #[error("student already has an active work session")]
    AlreadyActive,
    #[error("student has no active work session")]
    NotActive,
    #[error("computer station {0} not found")]
    StationNotFound(String),
    #[error("computer station {room_number} is {}", status_label(.status))]
    StationUnavailable { room_number: String, status: StationStatus },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

fn status_label(status: &StationStatus) -> &'static str {
    match status {
        StationStatus::Available => "available",
        StationStatus::Occupied => "occupied",
        StationStatus::Maintenance => "under maintenance",
    }
}

/// Whole minutes between `start` and `end`. Partial minutes are floored, not rounded, so a
/// 59 second session records 0 and a session never reports time not yet spent. Never negative.
pub(crate) fn elapsed_minutes(start: PrimitiveDateTime, end: PrimitiveDateTime) -> i32 {
    let minutes = (end - start).whole_minutes().max(0);
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

/// The closed form of an open session, ending at `now`.
pub(crate) fn closed_at(session: &WorkSession, now: PrimitiveDateTime) -> WorkSession {
    WorkSession {
        end_time: Some(now),
        duration_minutes: elapsed_minutes(session.start_time, now),
        is_active: false,
        ..session.clone()
    }
}

/// Opens a session for `student_id`, optionally seating the student at `computer_number`.
/// The station flips to occupied in the same transaction.
pub(crate) async fn open_session(
    pool: &PgPool,
    student_id: &str,
    computer_number: Option<&str>,
) -> Result<WorkSession, WorkSessionError> {
    let now = primitive_now_utc();
    let mut tx = pool.begin().await?;

    repositories::students::lock_for_update(&mut *tx, student_id)
        .await?
        .ok_or(WorkSessionError::StudentNotFound)?;

    if repositories::work_sessions::find_active(&mut *tx, student_id).await?.is_some() {
        return Err(WorkSessionError::AlreadyActive);
    }

    let station = match computer_number {
        Some(room_number) => {
            let station = repositories::stations::lock_by_room_number(&mut *tx, room_number)
                .await?
                .ok_or_else(|| WorkSessionError::StationNotFound(room_number.to_string()))?;
            if !station.status.accepts_new_session() {
                return Err(WorkSessionError::StationUnavailable {
                    room_number: station.room_number,
                    status: station.status,
                });
            }
            Some(station)
        }
        None => None,
    };

    let session = repositories::work_sessions::create(
        &mut *tx,
        repositories::work_sessions::CreateWorkSession {
            id: &Uuid::new_v4().to_string(),
            student_id,
            computer_number,
            start_time: now,
        },
    )
    .await
    .map_err(|err| {
        if crate::db::is_unique_violation(&err) {
            WorkSessionError::AlreadyActive
        } else {
            WorkSessionError::Database(err)
        }
    })?;

    if let Some(station) = &station {
        repositories::stations::occupy(&mut *tx, &station.id, student_id).await?;
    }
    repositories::students::touch_last_activity(&mut *tx, student_id, now).await?;

    tx.commit().await?;

    metrics::record_work_session_opened();
    tracing::info!(
        session_id = %session.id,
        student_id,
        computer_number = computer_number.unwrap_or("-"),
        "Work session opened"
    );

    Ok(session)
}

/// Closes the student's active session and frees the station it was bound to,
/// if the station is still held by this student.
pub(crate) async fn close_session(
    pool: &PgPool,
    student_id: &str,
) -> Result<WorkSession, WorkSessionError> {
    let now = primitive_now_utc();
    let mut tx = pool.begin().await?;

    repositories::students::lock_for_update(&mut *tx, student_id)
        .await?
        .ok_or(WorkSessionError::StudentNotFound)?;

    let active = repositories::work_sessions::find_active(&mut *tx, student_id)
        .await?
        .ok_or(WorkSessionError::NotActive)?;

    let closed = repositories::work_sessions::close(&mut *tx, &closed_at(&active, now)).await?;

    if let Some(room_number) = closed.computer_number.as_deref() {
        let freed =
            repositories::stations::release(&mut *tx, room_number, student_id, now).await?;
        if !freed {
            tracing::warn!(room_number, student_id, "Station was no longer held by the student");
        }
    }
    repositories::students::touch_last_activity(&mut *tx, student_id, now).await?;

    tx.commit().await?;

    metrics::record_work_session_closed(closed.duration_minutes);
    tracing::info!(
        session_id = %closed.id,
        student_id,
        duration_minutes = closed.duration_minutes,
        "Work session closed"
    );

    Ok(closed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::Duration;

    fn open_at(start: PrimitiveDateTime) -> WorkSession {
        WorkSession {
            id: "session-1".to_string(),
            student_id: "student-1".to_string(),
            start_time: start,
            end_time: None,
            duration_minutes: 0,
            computer_number: Some("101".to_string()),
            is_active: true,
        }
    }

    #[test]
    fn closing_after_37_minutes_records_37() {
        let start = datetime!(2024-09-02 10:00:00);
        let closed = closed_at(&open_at(start), start + Duration::minutes(37));

        assert!(!closed.is_active);
        assert_eq!(closed.end_time, Some(datetime!(2024-09-02 10:37:00)));
        assert_eq!(closed.duration_minutes, 37);
        assert_eq!(closed.start_time, start);
        assert_eq!(closed.computer_number.as_deref(), Some("101"));
    }

    #[test]
    fn partial_minutes_are_not_counted() {
        let start = datetime!(2024-09-02 10:00:00);
        assert_eq!(elapsed_minutes(start, datetime!(2024-09-02 10:00:59)), 0);
        assert_eq!(elapsed_minutes(start, datetime!(2024-09-02 10:01:00)), 1);
        assert_eq!(elapsed_minutes(start, datetime!(2024-09-02 10:01:45)), 1);
        assert_eq!(elapsed_minutes(start, datetime!(2024-09-02 12:29:59.9)), 149);
    }

    #[test]
    fn clock_going_backwards_yields_zero() {
        let start = datetime!(2024-09-02 10:00:00);
        assert_eq!(elapsed_minutes(start, start - Duration::minutes(5)), 0);
    }

    #[test]
    fn sessions_spanning_midnight_are_measured_correctly() {
        let start = datetime!(2024-09-02 23:50:00);
        let closed = closed_at(&open_at(start), datetime!(2024-09-03 00:20:30));
        assert_eq!(closed.duration_minutes, 30);
    }

    #[test]
    fn unavailable_station_message_names_the_state() {
        let err = WorkSessionError::StationUnavailable {
            room_number: "101".to_string(),
            status: StationStatus::Maintenance,
        };
        assert_eq!(err.to_string(), "computer station 101 is under maintenance");
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database at DATABASE_URL"]
    async fn open_and_close_keep_station_in_step() {
        let db = crate::test_support::test_db().await;
        let pool = &db.pool;
        let student = crate::test_support::seed_student(pool, "WS-1").await;
        let station = crate::test_support::seed_station(pool, "W101").await;

        let opened = open_session(pool, &student.id, Some("W101")).await.expect("open");
        assert!(opened.is_active);
        let held = repositories::stations::find_by_id(pool, &station.id)
            .await
            .expect("station")
            .expect("exists");
        assert_eq!(held.status, StationStatus::Occupied);
        assert_eq!(held.current_student_id.as_deref(), Some(student.id.as_str()));

        let again = open_session(pool, &student.id, None).await;
        assert!(matches!(again, Err(WorkSessionError::AlreadyActive)));

        let closed = close_session(pool, &student.id).await.expect("close");
        assert!(!closed.is_active);
        assert!(closed.end_time.is_some());
        let freed = repositories::stations::find_by_id(pool, &station.id)
            .await
            .expect("station")
            .expect("exists");
        assert_eq!(freed.status, StationStatus::Available);
        assert!(freed.current_student_id.is_none());
        assert!(freed.last_used.is_some());

        let missing = close_session(pool, &student.id).await;
        assert!(matches!(missing, Err(WorkSessionError::NotActive)));
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database at DATABASE_URL"]
    async fn maintenance_station_cannot_be_occupied() {
        let db = crate::test_support::test_db().await;
        let pool = &db.pool;
        let student = crate::test_support::seed_student(pool, "WS-2").await;
        let station = crate::test_support::seed_station(pool, "W102").await;
        repositories::stations::set_status(pool, &station.id, StationStatus::Maintenance)
            .await
            .expect("maintenance");

        let result = open_session(pool, &student.id, Some("W102")).await;
        assert!(matches!(
            result,
            Err(WorkSessionError::StationUnavailable { status: StationStatus::Maintenance, .. })
        ));
        let active = repositories::work_sessions::find_active(pool, &student.id)
            .await
            .expect("query");
        assert!(active.is_none());
    }
}
