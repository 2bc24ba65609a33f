//! API Handlers
//!
//! HTTP request handlers for each student endpoint. Every handler commits to
//! the store before touching the cache; see [`super::cache_aside`].

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::cache_aside;
use crate::cache::Cache;
use crate::config::CacheSettings;
use crate::error::{ApiError, Result};
use crate::models::{
    HealthResponse, MessageResponse, Student, StudentIdResponse, StudentListResponse,
    StudentPayload, StudentResponse,
};
use crate::storage::Storage;
use crate::tasks::bounded;

/// Application state shared across all handlers.
///
/// Holds the authoritative store and the cache client; both are safe for
/// concurrent use, so handlers take no locks of their own.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn Cache>,
    pub cache_settings: CacheSettings,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn Storage>,
        cache: Arc<dyn Cache>,
        cache_settings: CacheSettings,
    ) -> Self {
        Self {
            storage,
            cache,
            cache_settings,
        }
    }
}

/// Parses a JSON body. A missing or blank body yields `None`.
fn parse_body(body: &[u8]) -> Result<Option<StudentPayload>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ApiError::InvalidBody(e.to_string()))
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse().map_err(|_| ApiError::InvalidId(raw.to_string()))
}

/// Handler for POST /api/students
pub async fn create_student(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<StudentIdResponse>)> {
    info!("creating a student");

    let new = parse_body(&body)?
        .ok_or(ApiError::EmptyBody)?
        .into_new_student()
        .map_err(ApiError::Validation)?;

    let id = state.storage.create_student(&new).await?;
    cache_aside::after_create(&state, &Student::from_new(id, new));

    info!(student_id = id, "student created successfully");
    Ok((StatusCode::CREATED, Json(StudentIdResponse::new(id))))
}

/// Handler for GET /api/students/:id
pub async fn get_student(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<StudentResponse>> {
    info!(id = %raw_id, "getting a student by id");
    let id = parse_id(&raw_id)?;

    if let Some(student) = cache_aside::cached_student(&state, id).await {
        info!(student_id = id, "serving student from cache");
        return Ok(Json(StudentResponse::new(student)));
    }

    let student = state.storage.get_student_by_id(id).await?;
    cache_aside::after_read(&state, &student);

    info!(student_id = id, "student fetched successfully");
    Ok(Json(StudentResponse::new(student)))
}

/// Handler for GET /api/students/
pub async fn list_students(State(state): State<AppState>) -> Result<Json<StudentListResponse>> {
    info!("getting list of students");

    if let Some(students) = cache_aside::cached_list(&state).await {
        info!(count = students.len(), "serving student list from cache");
        return Ok(Json(StudentListResponse::new(students)));
    }

    let students = state.storage.get_students().await?;
    cache_aside::after_list(&state, students.clone());

    info!(count = students.len(), "students fetched successfully");
    Ok(Json(StudentListResponse::new(students)))
}

/// Handler for PUT /api/students/:id
///
/// Fields omitted from the body keep their stored values; an empty body is a
/// no-op update that still refreshes the cache.
pub async fn update_student(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Json<StudentIdResponse>> {
    info!(id = %raw_id, "updating student");
    let id = parse_id(&raw_id)?;

    let payload = parse_body(&body)?.unwrap_or_default();
    let current = state.storage.get_student_by_id(id).await?;
    let merged = payload.merge_into(current).map_err(ApiError::Validation)?;

    state.storage.update_student(id, &merged).await?;
    cache_aside::after_update(&state, &Student::from_new(id, merged));

    info!(student_id = id, "student updated successfully");
    Ok(Json(StudentIdResponse::new(id)))
}

/// Handler for DELETE /api/students/:id
pub async fn delete_student(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    info!(id = %raw_id, "deleting student");
    let id = parse_id(&raw_id)?;

    state.storage.delete_student(id).await?;
    cache_aside::after_delete(&state, id);

    info!(student_id = id, "student deleted successfully");
    Ok(Json(MessageResponse::new("student deleted successfully")))
}

/// Handler for GET /health
///
/// Healthy as long as the store answers; the cache is reported but optional.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let storage_up = state.storage.health_check().await.is_ok();
    let cache_up = bounded(state.cache_settings.op_timeout, state.cache.ping())
        .await
        .is_ok();

    let status = if storage_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(HealthResponse::from_probes(storage_up, cache_up)))
}
