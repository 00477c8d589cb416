use anyhow::Result;
use redis::aio::ConnectionManager;
use tracing::debug;

/// Redis client wrapper around a multiplexed connection manager.
///
/// One client is constructed at startup and cloned into each repository;
/// clones share the underlying connection and reconnect automatically.
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
}

impl RedisClient {
    /// Connects to Redis at the given URL (e.g. "redis://localhost:6379").
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self { manager })
    }

    /// Pings the server to verify connectivity.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection();
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        debug!("redis connection successful");
        Ok(())
    }

    /// Hands out a cheap clone of the shared connection.
    pub fn connection(&self) -> ConnectionManager {
        self.manager.clone()
    }
}
