//! Cache Module
//!
//! Non-authoritative key-value cache with per-key expiration. Two backends
//! implement [`Cache`]: [`RedisCache`] and the in-process [`MemoryCache`]
//! (TTL expiration plus LRU eviction).

mod entry;
mod keys;
mod lru;
mod memory;
mod redis;
mod store;


use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

// Re-export public types
pub use keys::{student_key, STUDENT_KEY_PREFIX, STUDENT_LIST_KEY};
pub use memory::MemoryCache;
pub use self::redis::RedisCache;

pub(crate) use entry::{CacheEntry, CacheValue};
pub(crate) use lru::LruTracker;
pub(crate) use store::CacheStore;

// == Cache Error Enum ==
/// Failures of a cache backend. Never surfaced to API clients.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Connection or protocol failure of the backend
    #[error("cache backend error: {0}")]
    Backend(String),

    /// The key holds a value of another shape
    #[error("wrong value type for key: {0}")]
    WrongType(String),

    /// The operation did not finish within its deadline
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    /// A value could not be encoded for storage
    #[error("cache serialization error: {0}")]
    Serialization(String),
}

/// Convenience Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

// == Cache Command ==
/// One write in a batch handed to [`Cache::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheCommand {
    /// Write hash fields and reset the key's TTL
    HashSet {
        key: String,
        fields: Vec<(String, String)>,
        ttl: Duration,
    },
    /// Write a string value with a TTL
    Set {
        key: String,
        value: String,
        ttl: Duration,
    },
    Delete {
        key: String,
    },
}

// == Cache Trait ==
/// Operations the request handlers need from a cache backend.
///
/// Implementations must be safe for concurrent use; each call is atomic per
/// key, and a batch passed to `execute` is applied as one unit.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Reads a string key. Absent or expired keys yield `None`.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Reads every field of a hash key. Absent keys and empty hashes yield `None`.
    async fn hash_get_all(&self, key: &str) -> CacheResult<Option<HashMap<String, String>>>;

    /// Applies a batch of writes in order.
    async fn execute(&self, commands: &[CacheCommand]) -> CacheResult<()>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> CacheResult<()>;
}
