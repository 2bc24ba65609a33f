//! Cache-aside discipline shared by the student handlers.
//!
//! Lookups run on the request path under the cache operation timeout and
//! treat every failure as a miss. Writes run only after the store has
//! committed, on detached tasks the response never waits for.

use tokio::task::JoinHandle;
use tracing::warn;

use crate::api::AppState;
use crate::cache::{student_key, CacheCommand, STUDENT_LIST_KEY};
use crate::models::Student;
use crate::tasks::{bounded, spawn_cache_write, spawn_list_snapshot};

fn put_student(state: &AppState, student: &Student) -> CacheCommand {
    CacheCommand::HashSet {
        key: student_key(student.id),
        fields: student.to_cache_fields(),
        ttl: state.cache_settings.ttl,
    }
}

fn invalidate_list() -> CacheCommand {
    CacheCommand::Delete {
        key: STUDENT_LIST_KEY.to_string(),
    }
}

fn dispatch(state: &AppState, commands: Vec<CacheCommand>, operation: &'static str) -> JoinHandle<()> {
    spawn_cache_write(
        state.cache.clone(),
        commands,
        state.cache_settings.op_timeout,
        operation,
    )
}

// == Lookups ==

/// Returns the cached copy of student `id`, if a complete one is present.
pub async fn cached_student(state: &AppState, id: i64) -> Option<Student> {
    let key = student_key(id);
    let lookup = bounded(
        state.cache_settings.op_timeout,
        state.cache.hash_get_all(&key),
    )
    .await;

    match lookup {
        Ok(Some(fields)) => {
            let student = Student::from_cache_fields(&fields).filter(|s| s.id == id);
            if student.is_none() {
                warn!(key = %key, "ignoring undecodable cached student");
            }
            student
        }
        Ok(None) => None,
        Err(e) => {
            warn!(key = %key, error = %e, "student cache lookup failed");
            None
        }
    }
}

/// Returns the cached list snapshot, if present and decodable.
pub async fn cached_list(state: &AppState) -> Option<Vec<Student>> {
    let lookup = bounded(
        state.cache_settings.op_timeout,
        state.cache.get(STUDENT_LIST_KEY),
    )
    .await;

    match lookup {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(students) => Some(students),
            Err(e) => {
                warn!(error = %e, "ignoring undecodable student list snapshot");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "student list cache lookup failed");
            None
        }
    }
}

// == Post-store writes ==

/// Caches a freshly created record and drops the stale list snapshot.
pub fn after_create(state: &AppState, student: &Student) -> JoinHandle<()> {
    dispatch(
        state,
        vec![put_student(state, student), invalidate_list()],
        "cache_created_student",
    )
}

/// Repopulates the record after a cache miss, refreshing its TTL.
pub fn after_read(state: &AppState, student: &Student) -> JoinHandle<()> {
    dispatch(state, vec![put_student(state, student)], "cache_student")
}

/// Stores the snapshot read after a list miss.
pub fn after_list(state: &AppState, students: Vec<Student>) -> JoinHandle<()> {
    spawn_list_snapshot(
        state.cache.clone(),
        students,
        state.cache_settings.ttl,
        state.cache_settings.op_timeout,
    )
}

/// Refreshes the updated record and drops the stale list snapshot.
pub fn after_update(state: &AppState, student: &Student) -> JoinHandle<()> {
    dispatch(
        state,
        vec![put_student(state, student), invalidate_list()],
        "cache_updated_student",
    )
}

/// Drops the deleted record and the list snapshot.
pub fn after_delete(state: &AppState, id: i64) -> JoinHandle<()> {
    dispatch(
        state,
        vec![
            CacheCommand::Delete {
                key: student_key(id),
            },
            invalidate_list(),
        ],
        "evict_deleted_student",
    )
}
