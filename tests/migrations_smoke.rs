use sqlx::Row;

fn database_url() -> String {
    dotenvy::dotenv().ok();

    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.trim().is_empty() {
            return url;
        }
    }

    let server = std::env::var("POSTGRES_SERVER").unwrap_or_else(|_| "localhost".into());
    let port = std::env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".into());
    let user = std::env::var("POSTGRES_USER").unwrap_or_else(|_| "lab".into());
    let password = std::env::var("POSTGRES_PASSWORD").unwrap_or_default();
    let db = std::env::var("POSTGRES_DB").unwrap_or_else(|_| "student_lab".into());

    format!("postgresql://{user}:{password}@{server}:{port}/{db}")
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database at DATABASE_URL"]
async fn migrations_apply_and_tables_exist() -> anyhow::Result<()> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url())
        .await?;

    let migrations_dir =
        std::env::var("LAB_MIGRATIONS_DIR").unwrap_or_else(|_| "migrations".to_string());
    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(&migrations_dir)).await?;
    migrator.run(&pool).await?;

    let tables =
        ["accounts", "admin_profiles", "students", "work_sessions", "computer_stations", "messages"];

    for table in tables {
        let row = sqlx::query("SELECT to_regclass($1)::text").bind(table).fetch_one(&pool).await?;
        let regclass: Option<String> = row.try_get(0)?;
        assert!(regclass.is_some(), "expected table {table} to exist after migrations");
    }

    let one_active: Option<String> =
        sqlx::query_scalar("SELECT to_regclass('work_sessions_one_active_per_student')::text")
            .fetch_one(&pool)
            .await?;
    assert!(one_active.is_some(), "expected the one-active-session index to exist");

    Ok(())
}
