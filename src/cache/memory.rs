//! In-process cache backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{Cache, CacheCommand, CacheResult, CacheStore};

/// [`Cache`] backed by an in-process TTL + LRU store shared behind an async lock.
///
/// Cloning is cheap and every clone sees the same entries.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    store: Arc<RwLock<CacheStore>>,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: Arc::new(RwLock::new(CacheStore::new(max_entries))),
        }
    }

    /// Drops every expired entry and returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        self.store.write().await.cleanup_expired()
    }

    /// Remaining lifetime of a live key.
    pub async fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.store.read().await.ttl_remaining(key)
    }

    pub async fn entry_count(&self) -> usize {
        self.store.read().await.len()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        // Write lock: reads update LRU order and may drop expired entries
        self.store.write().await.get(key)
    }

    async fn hash_get_all(&self, key: &str) -> CacheResult<Option<HashMap<String, String>>> {
        Ok(self
            .store
            .write()
            .await
            .hash_get_all(key)?
            .filter(|fields| !fields.is_empty()))
    }

    async fn execute(&self, commands: &[CacheCommand]) -> CacheResult<()> {
        self.store.write().await.apply(commands)
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}
