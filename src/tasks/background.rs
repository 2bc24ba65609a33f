//! Fire-and-forget cache writes.
//!
//! Handlers hand a batch to [`spawn_cache_write`] and respond immediately.
//! The spawned task is detached from the request: it keeps running if the
//! client disconnects, is bounded only by the cache operation timeout, and
//! logs failures instead of reporting them.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::cache::{Cache, CacheCommand, CacheError, CacheResult, STUDENT_LIST_KEY};
use crate::models::Student;

/// Runs a cache operation under `timeout`, mapping expiry to `CacheError::Timeout`.
pub async fn bounded<T>(
    timeout: Duration,
    operation: impl Future<Output = CacheResult<T>>,
) -> CacheResult<T> {
    tokio::time::timeout(timeout, operation)
        .await
        .unwrap_or(Err(CacheError::Timeout(timeout)))
}

async fn run_batch(
    cache: &dyn Cache,
    commands: &[CacheCommand],
    timeout: Duration,
    operation: &'static str,
) {
    match bounded(timeout, cache.execute(commands)).await {
        Ok(()) => debug!(operation, commands = commands.len(), "cache updated"),
        Err(e) => error!(operation, error = %e, "failed to update cache"),
    }
}

/// Applies `commands` on a detached task.
///
/// The returned handle may be dropped; tests await it to observe completion.
pub fn spawn_cache_write(
    cache: Arc<dyn Cache>,
    commands: Vec<CacheCommand>,
    timeout: Duration,
    operation: &'static str,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_batch(cache.as_ref(), &commands, timeout, operation).await;
    })
}

/// Serializes `students` and stores the snapshot under the list key, on a
/// detached task.
pub fn spawn_list_snapshot(
    cache: Arc<dyn Cache>,
    students: Vec<Student>,
    ttl: Duration,
    timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let value = match serde_json::to_string(&students) {
            Ok(value) => value,
            Err(e) => {
                let e = CacheError::Serialization(e.to_string());
                error!(error = %e, "failed to encode student list snapshot");
                return;
            }
        };
        let commands = [CacheCommand::Set {
            key: STUDENT_LIST_KEY.to_string(),
            value,
            ttl,
        }];
        run_batch(cache.as_ref(), &commands, timeout, "cache_student_list").await;
    })
}
