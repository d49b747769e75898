use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;

use crate::db::{KvStore, StoreKey};
use crate::error::AppResult;

/// Redis-backed document store
///
/// Documents are stored without TTL. The connection manager reconnects on its
/// own; a failed command is reported as `StorageUnavailable` and not retried.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Opens a managed connection to Redis
    pub async fn connect(redis_url: &str) -> AppResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!("Connected to Redis");
        Ok(Self { conn })
    }
}

#[async_trait::async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: StoreKey) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key.to_string()).await.map_err(|e| {
            tracing::error!(key = %key, error = %e, "Redis get failed");
            e
        })?;
        Ok(value)
    }

    async fn put(&self, key: StoreKey, value: String) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let bytes = value.len();
        let _: () = conn.set(key.to_string(), value).await.map_err(|e| {
            tracing::error!(key = %key, error = %e, "Redis set failed");
            e
        })?;
        tracing::debug!(key = %key, bytes, "Document written");
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
