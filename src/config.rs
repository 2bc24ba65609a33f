//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which cache backend the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown cache backend `{}`", other)),
        }
    }
}

/// Cache-aside tuning shared by every handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Lifetime of every cached record and list snapshot
    pub ttl: Duration,
    /// Upper bound of a single cache round trip
    pub op_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
            op_timeout: Duration::from_millis(2000),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment label, only used in logs
    pub env: String,
    /// HTTP listen address
    pub http_addr: String,
    /// SQLite database file
    pub storage_path: String,
    /// Maximum pooled database connections
    pub db_max_connections: u32,
    pub cache_backend: CacheBackend,
    /// Redis endpoint, `host:port` or `redis://` URL
    pub redis_addr: String,
    /// TTL in seconds of cached records and list snapshots
    pub cache_ttl: u64,
    /// Timeout in milliseconds of one cache operation
    pub cache_op_timeout_ms: u64,
    /// Capacity of the in-process cache
    pub cache_max_entries: usize,
    /// In-process cache cleanup interval in seconds
    pub cleanup_interval: u64,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
    /// Seconds in-flight requests get to finish after a shutdown signal
    pub shutdown_grace: u64,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `APP_ENV` - Deployment label (default: dev)
    /// - `HTTP_ADDR` - Listen address (default: 0.0.0.0:8082)
    /// - `STORAGE_PATH` - SQLite file (default: storage/storage.db)
    /// - `DB_MAX_CONNECTIONS` - Pool size (default: 8)
    /// - `CACHE_BACKEND` - `redis` or `memory` (default: redis)
    /// - `REDIS_ADDR` - Redis endpoint (default: localhost:6379)
    /// - `CACHE_TTL_SECS` - Cache TTL in seconds (default: 600)
    /// - `CACHE_OP_TIMEOUT_MS` - Cache operation timeout (default: 2000)
    /// - `CACHE_MAX_ENTRIES` - In-process cache capacity (default: 10000)
    /// - `CLEANUP_INTERVAL` - In-process cache sweep in seconds (default: 1)
    /// - `REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
    /// - `SHUTDOWN_GRACE_SECS` - Shutdown grace period (default: 5)
    ///
    /// Unset or unparsable variables fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            env: env_or("APP_ENV", defaults.env),
            http_addr: env_or("HTTP_ADDR", defaults.http_addr),
            storage_path: env_or("STORAGE_PATH", defaults.storage_path),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", defaults.db_max_connections),
            cache_backend: env_or("CACHE_BACKEND", defaults.cache_backend),
            redis_addr: env_or("REDIS_ADDR", defaults.redis_addr),
            cache_ttl: env_or("CACHE_TTL_SECS", defaults.cache_ttl),
            cache_op_timeout_ms: env_or("CACHE_OP_TIMEOUT_MS", defaults.cache_op_timeout_ms),
            cache_max_entries: env_or("CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            request_timeout: env_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout),
            shutdown_grace: env_or("SHUTDOWN_GRACE_SECS", defaults.shutdown_grace),
        }
    }

    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            ttl: Duration::from_secs(self.cache_ttl),
            op_timeout: Duration::from_millis(self.cache_op_timeout_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: "dev".to_string(),
            http_addr: "0.0.0.0:8082".to_string(),
            storage_path: "storage/storage.db".to_string(),
            db_max_connections: 8,
            cache_backend: CacheBackend::Redis,
            redis_addr: "localhost:6379".to_string(),
            cache_ttl: 600,
            cache_op_timeout_ms: 2000,
            cache_max_entries: 10_000,
            cleanup_interval: 1,
            request_timeout: 30,
            shutdown_grace: 5,
        }
    }
}
