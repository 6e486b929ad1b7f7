pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;

use crate::core::{config::Settings, redis::RedisHandle, state::AppState, telemetry};
use crate::services::storage::StorageService;

/// Starts the HTTP API and serves until Ctrl+C or SIGTERM.
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let state = build_state(settings).await?;
    let addr = state.settings().server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        %addr,
        environment = state.settings().runtime().environment.as_str(),
        "Student lab API listening"
    );

    let app = api::router::router(state.clone());
    let served = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(core::shutdown::shutdown_signal())
        .await;

    state.redis().disconnect().await;
    served?;
    Ok(())
}

async fn build_state(settings: Settings) -> anyhow::Result<AppState> {
    let pool = db::init_pool(&settings).await?;
    db::run_migrations(&pool).await?;

    // Only rate limiting depends on Redis, and it fails open.
    let redis = RedisHandle::new(settings.redis().redis_url());
    match redis.connect().await {
        Ok(()) => tracing::info!("Redis connected"),
        Err(err) => tracing::warn!(error = %err, "Redis unavailable; rate limiting disabled"),
    }

    let storage = StorageService::from_settings(&settings).await?;
    if storage.is_none() {
        tracing::warn!("S3 credentials missing; registration photos are disabled");
    }

    let strict = settings.runtime().strict_config;
    let state = AppState::new(settings, pool, redis, storage);

    if let Err(err) = core::bootstrap::ensure_superuser(&state).await {
        if strict {
            return Err(err);
        }
        tracing::error!(error = %err, "Failed to ensure the lab superuser");
    }

    Ok(state)
}
