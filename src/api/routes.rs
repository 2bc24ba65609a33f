//! API Routes
//!
//! Configures the Axum router with all student endpoints.

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::handlers::{
    create_student, delete_student, get_student, health_handler, list_students, update_student,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /api/students` - Create a student
/// - `GET /api/students/` (or without the slash) - List all students
/// - `GET /api/students/:id` - Fetch one student
/// - `PUT /api/students/:id` - Partially update a student
/// - `DELETE /api/students/:id` - Delete a student
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Timeout: Requests running past `request_timeout` get 408
/// - Tracing: Logs all requests
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/students", post(create_student).get(list_students))
        .route("/api/students/", get(list_students))
        .route(
            "/api/students/:id",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
