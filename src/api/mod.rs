//! API Module
//!
//! HTTP handlers and routing for the student REST API.
//!
//! # Endpoints
//! - `POST /api/students` - Create a student
//! - `GET /api/students/` - List all students
//! - `GET /api/students/:id` - Fetch one student
//! - `PUT /api/students/:id` - Partially update a student
//! - `DELETE /api/students/:id` - Delete a student
//! - `GET /health` - Health check endpoint

pub mod cache_aside;
pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
