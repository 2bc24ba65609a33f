//! Student API - CRUD service for student records
//!
//! SQLite is the source of truth; a Redis or in-process cache sits beside it
//! under a cache-aside discipline.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::{CacheBackend, CacheSettings, Config};
pub use tasks::spawn_cleanup_task;
