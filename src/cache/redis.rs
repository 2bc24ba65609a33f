//! Redis cache backend.
//!
//! Uses a multiplexed, auto-reconnecting connection manager; each batch is
//! sent as one `MULTI`/`EXEC` pipeline.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;

use crate::cache::{Cache, CacheCommand, CacheError, CacheResult};

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.code() == Some("WRONGTYPE") {
            CacheError::WrongType(err.to_string())
        } else {
            CacheError::Backend(err.to_string())
        }
    }
}

/// Reconnect attempts after the manager is up.
const RECONNECT_RETRIES: usize = 3;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(2);

/// Redis expirations have second granularity and reject zero.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

/// Accepts `host:port` or a full `redis://` / `rediss://` URL.
fn connection_url(addr: &str) -> String {
    if addr.starts_with("redis://") || addr.starts_with("rediss://") {
        addr.to_string()
    } else {
        format!("redis://{}/", addr)
    }
}

/// [`Cache`] backed by a Redis server.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    /// Connects to the server at `addr`.
    ///
    /// A direct probe connection runs first, so an unreachable server fails
    /// immediately instead of entering the manager's retry loop. Later
    /// disconnects are retried by the manager, a bounded number of times.
    pub async fn connect(addr: &str) -> CacheResult<Self> {
        let client = redis::Client::open(connection_url(addr))?;
        client.get_multiplexed_async_connection().await?;

        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(RECONNECT_RETRIES)
            .set_connection_timeout(CONNECTION_TIMEOUT);
        let manager = ConnectionManager::new_with_config(client, config).await?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn hash_get_all(&self, key: &str) -> CacheResult<Option<HashMap<String, String>>> {
        let mut conn = self.manager.clone();
        // HGETALL answers an empty map for missing keys
        let fields: HashMap<String, String> = conn.hgetall(key).await?;
        Ok((!fields.is_empty()).then_some(fields))
    }

    async fn execute(&self, commands: &[CacheCommand]) -> CacheResult<()> {
        if commands.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in commands {
            match command {
                CacheCommand::HashSet { key, fields, ttl } => {
                    pipe.hset_multiple(key, fields.as_slice())
                        .ignore()
                        .expire(key, ttl_secs(*ttl) as i64)
                        .ignore();
                }
                CacheCommand::Set { key, value, ttl } => {
                    pipe.set_ex(key, value, ttl_secs(*ttl)).ignore();
                }
                CacheCommand::Delete { key } => {
                    pipe.del(key).ignore();
                }
            }
        }

        let mut conn = self.manager.clone();
        let () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.manager.clone();
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
