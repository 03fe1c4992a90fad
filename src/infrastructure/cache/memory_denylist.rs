use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::errors::DenylistError;
use crate::repositories::denylist::DenylistRepository;

/// Process-local denylist for development and tests. Entries vanish with the
/// process and are not shared between instances.
#[derive(Clone, Default)]
pub struct InMemoryDenylist {
    entries: Arc<DashMap<String, Instant>>,
}

impl InMemoryDenylist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers that are still revoked.
    pub fn identifiers(&self) -> Vec<String> {
        self.purge_expired();
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.purge_expired();
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, expires_at| *expires_at > now);
    }
}

#[async_trait]
impl DenylistRepository for InMemoryDenylist {
    async fn add(&self, jti: &str, ttl_seconds: i64) -> Result<(), DenylistError> {
        if ttl_seconds <= 0 {
            return Ok(());
        }

        let expires_at = Instant::now()
            .checked_add(Duration::from_secs(ttl_seconds as u64))
            .ok_or_else(|| DenylistError::Operation(format!("TTL of {}s is out of range", ttl_seconds)))?;
        self.entries.insert(jti.to_string(), expires_at);
        Ok(())
    }

    async fn contains(&self, jti: &str) -> Result<bool, DenylistError> {
        let now = Instant::now();
        let live = self
            .entries
            .get(jti)
            .map(|expires_at| *expires_at > now);

        match live {
            Some(true) => Ok(true),
            Some(false) => {
                self.entries.remove_if(jti, |_, expires_at| *expires_at <= now);
                Ok(false)
            }
            None => Ok(false),
        }
    }
}
