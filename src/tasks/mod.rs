//! Background Tasks Module
//!
//! Work that runs outside the request/response path.
//!
//! # Tasks
//! - Cache writes: detached, time-bounded batches dispatched by handlers
//! - TTL Cleanup: removes expired in-process cache entries at configured intervals

mod background;
mod cleanup;

pub use background::{bounded, spawn_cache_write, spawn_list_snapshot};
pub use cleanup::spawn_cleanup_task;
