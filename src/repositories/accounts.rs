use crate::db::models::Account;

const COLUMNS: &str = "\
    id, username, email, hashed_password, first_name, last_name, \
    is_active, is_staff, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!("SELECT {COLUMNS} FROM accounts WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_by_username(
    executor: impl sqlx::PgExecutor<'_>,
    username: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!("SELECT {COLUMNS} FROM accounts WHERE username = $1"))
        .bind(username)
        .fetch_optional(executor)
        .await
}

/// Case-insensitive, matching the unique index on `lower(email)`.
pub(crate) async fn email_exists(
    executor: impl sqlx::PgExecutor<'_>,
    email: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM accounts WHERE lower(email) = lower($1))",
    )
    .bind(email)
    .fetch_one(executor)
    .await
}

pub(crate) struct CreateAccount<'a> {
    pub(crate) id: &'a str,
    pub(crate) username: &'a str,
    pub(crate) email: &'a str,
    pub(crate) hashed_password: String,
    pub(crate) first_name: &'a str,
    pub(crate) last_name: &'a str,
    pub(crate) is_staff: bool,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAccount<'_>,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "INSERT INTO accounts (
            id, username, email, hashed_password, first_name, last_name,
            is_active, is_staff, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,TRUE,$7,$8,$8)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.username)
    .bind(params.email)
    .bind(params.hashed_password)
    .bind(params.first_name)
    .bind(params.last_name)
    .bind(params.is_staff)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) struct UpdateAccount {
    pub(crate) hashed_password: Option<String>,
    pub(crate) is_active: Option<bool>,
    pub(crate) is_staff: Option<bool>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    params: UpdateAccount,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE accounts SET
            hashed_password = COALESCE($1, hashed_password),
            is_active = COALESCE($2, is_active),
            is_staff = COALESCE($3, is_staff),
            updated_at = $4
         WHERE id = $5",
    )
    .bind(params.hashed_password)
    .bind(params.is_active)
    .bind(params.is_staff)
    .bind(params.updated_at)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}
