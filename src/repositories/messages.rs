use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Message;
use crate::db::types::MessageType;
use crate::repositories::students::escape_like;

pub(crate) const COLUMNS: &str = "\
    id, student_id, admin_account_id, message_type, subject, content, sent_at, \
    is_read, response, responded_at";

const PREFIXED_COLUMNS: &str = "\
    m.id, m.student_id, m.admin_account_id, m.message_type, m.subject, m.content, m.sent_at, \
    m.is_read, m.response, m.responded_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MessageListRow {
    #[sqlx(flatten)]
    pub(crate) message: Message,
    pub(crate) student_full_name: String,
    pub(crate) student_code: String,
}

#[derive(Debug, Default)]
pub(crate) struct MessageFilter {
    pub(crate) message_type: Option<MessageType>,
    pub(crate) is_read: Option<bool>,
    pub(crate) search: Option<String>,
}

pub(crate) struct CreateMessage<'a> {
    pub(crate) id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) message_type: MessageType,
    pub(crate) subject: &'a str,
    pub(crate) content: &'a str,
    pub(crate) sent_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateMessage<'_>,
) -> Result<Message, sqlx::Error> {
    sqlx::query_as::<_, Message>(&format!(
        "INSERT INTO messages (id, student_id, message_type, subject, content, sent_at, is_read)
         VALUES ($1,$2,$3,$4,$5,$6,FALSE)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.message_type)
    .bind(params.subject)
    .bind(params.content)
    .bind(params.sent_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(&format!(
        "SELECT {COLUMNS} FROM messages WHERE student_id = $1 ORDER BY sent_at DESC"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &MessageFilter) {
    builder.push(" WHERE TRUE");

    if let Some(message_type) = filter.message_type {
        builder.push(" AND m.message_type = ");
        builder.push_bind(message_type);
    }

    if let Some(is_read) = filter.is_read {
        builder.push(" AND m.is_read = ");
        builder.push_bind(is_read);
    }

    if let Some(search) = filter.search.as_deref().filter(|value| !value.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        builder.push(" AND (m.subject ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR m.content ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR s.full_name ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &MessageFilter,
    skip: i64,
    limit: i64,
) -> Result<Vec<MessageListRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {PREFIXED_COLUMNS}, s.full_name AS student_full_name, s.student_id AS student_code
         FROM messages m JOIN students s ON s.id = m.student_id"
    ));
    push_filters(&mut builder, filter);

    builder.push(" ORDER BY m.sent_at DESC, m.is_read ASC, m.id ASC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<MessageListRow>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, filter: &MessageFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) FROM messages m JOIN students s ON s.id = m.student_id",
    );
    push_filters(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn count_unread(executor: impl sqlx::PgExecutor<'_>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE NOT is_read").fetch_one(executor).await
}

pub(crate) async fn count_since(
    executor: impl sqlx::PgExecutor<'_>,
    since: PrimitiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE sent_at >= $1")
        .bind(since)
        .fetch_one(executor)
        .await
}

pub(crate) async fn respond(
    pool: &PgPool,
    id: &str,
    admin_account_id: &str,
    response: &str,
    now: PrimitiveDateTime,
) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(&format!(
        "UPDATE messages
         SET response = $1, responded_at = $2, admin_account_id = $3, is_read = TRUE
         WHERE id = $4
         RETURNING {COLUMNS}",
    ))
    .bind(response)
    .bind(now)
    .bind(admin_account_id)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn mark_read(pool: &PgPool, id: &str) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(&format!(
        "UPDATE messages SET is_read = TRUE WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}
