use async_trait::async_trait;

use crate::errors::DenylistError;

/// Time-bounded set of revoked refresh-token identifiers.
///
/// Errors are returned, never swallowed: deciding what an unreachable store
/// means (revoked, for reads) belongs to the caller.
#[async_trait]
pub trait DenylistRepository: Send + Sync {
    /// Marks `jti` as revoked for `ttl_seconds`. A non-positive TTL is a no-op.
    async fn add(&self, jti: &str, ttl_seconds: i64) -> Result<(), DenylistError>;

    /// Whether `jti` is currently revoked.
    async fn contains(&self, jti: &str) -> Result<bool, DenylistError>;
}
