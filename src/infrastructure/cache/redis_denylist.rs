use std::{future::Future, time::Duration};

use async_trait::async_trait;
use deadpool_redis::{Config as RedisPoolConfig, Pool, Runtime};
use redis::AsyncCommands;

use crate::errors::DenylistError;
use crate::repositories::denylist::DenylistRepository;
use crate::resilience::RetryPolicy;
use crate::settings::AppConfig;

const DENYLIST_PREFIX: &str = "denylist";
const REVOKED_MARKER: &str = "revoked";

/// Denylist shared by every server instance, backed by Redis key expiry.
#[derive(Clone)]
pub struct RedisDenylist {
    pool: Pool,
    timeout: Duration,
    retry: RetryPolicy,
}

impl RedisDenylist {
    pub fn new(pool: Pool, timeout: Duration) -> Self {
        RedisDenylist {
            pool,
            timeout,
            retry: RetryPolicy::DENYLIST,
        }
    }

    /// Builds the pool from config. No connection is opened until first use.
    pub fn from_config(config: &AppConfig) -> Result<Self, DenylistError> {
        let pool = RedisPoolConfig::from_url(config.redis_connection_url())
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| DenylistError::Connection(e.to_string()))?;

        Ok(RedisDenylist::new(pool, config.redis_timeout()))
    }

    pub async fn ping(&self) -> Result<(), DenylistError> {
        self.bounded(async {
            let mut conn = self.pool.get().await?;
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }

    fn key(jti: &str) -> String {
        format!("{}:{}", DENYLIST_PREFIX, jti)
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, DenylistError>
    where
        F: Future<Output = Result<T, DenylistError>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or(Err(DenylistError::Timeout(self.timeout)))
    }

    async fn set_with_ttl(&self, key: &str, ttl_seconds: u64) -> Result<(), DenylistError> {
        self.bounded(async {
            let mut conn = self.pool.get().await?;
            let _: () = conn.set_ex(key, REVOKED_MARKER, ttl_seconds).await?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl DenylistRepository for RedisDenylist {
    async fn add(&self, jti: &str, ttl_seconds: i64) -> Result<(), DenylistError> {
        if ttl_seconds <= 0 {
            return Ok(());
        }

        let key = Self::key(jti);
        let ttl = ttl_seconds as u64;

        self.retry
            .run("Denylist write", |_| true, || self.set_with_ttl(&key, ttl))
            .await?;

        tracing::info!(jti = %jti, ttl_seconds = ttl, "Refresh token identifier denylisted");
        Ok(())
    }

    async fn contains(&self, jti: &str) -> Result<bool, DenylistError> {
        let key = Self::key(jti);

        self.bounded(async {
            let mut conn = self.pool.get().await?;
            let exists: bool = conn.exists(&key).await?;
            Ok(exists)
        })
        .await
    }
}
