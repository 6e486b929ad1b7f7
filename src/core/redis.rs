use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::{cmd, Client, RedisError};
use tokio::sync::RwLock;

/// Lazily connected Redis handle. Every operation degrades gracefully while disconnected.
#[derive(Clone)]
pub(crate) struct RedisHandle {
    url: String,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
}

#[derive(Debug, Clone)]
pub(crate) enum RedisHealth {
    Healthy,
    Disconnected,
    Unhealthy(String),
}

const RATE_LIMIT_SCRIPT: &str = r#"
    local current = redis.call("INCR", KEYS[1])
    if current == 1 then
        redis.call("EXPIRE", KEYS[1], ARGV[1])
    end
    return current
"#;

pub(crate) fn rate_limit_key(scope: &str, identity: &str) -> String {
    format!("rl:{scope}:{}", identity.trim().to_lowercase())
}

impl RedisHandle {
    pub(crate) fn new(url: String) -> Self {
        Self { url, manager: Arc::new(RwLock::new(None)) }
    }

    pub(crate) async fn connect(&self) -> Result<(), RedisError> {
        let client = Client::open(self.url.clone())?;
        let manager = ConnectionManager::new(client).await?;
        *self.manager.write().await = Some(manager);
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        *self.manager.write().await = None;
    }

    pub(crate) async fn health(&self) -> RedisHealth {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return RedisHealth::Disconnected;
        };

        match cmd("PING").query_async::<_, String>(&mut manager).await {
            Ok(_) => RedisHealth::Healthy,
            Err(err) => RedisHealth::Unhealthy(err.to_string()),
        }
    }

    /// Fixed-window counter. Returns `Ok(true)` while the caller is under `limit`, and
    /// always `Ok(true)` when Redis is not connected.
    pub(crate) async fn rate_limit(
        &self,
        key: &str,
        limit: u64,
        window_seconds: u64,
    ) -> Result<bool, RedisError> {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return Ok(true);
        };

        let current: i64 = redis::Script::new(RATE_LIMIT_SCRIPT)
            .key(key)
            .arg(window_seconds as i64)
            .invoke_async(&mut manager)
            .await?;

        Ok(current <= limit as i64)
    }
}
