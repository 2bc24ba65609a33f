//! Domain and transport models for the student API
//!
//! This module defines the student entity and the DTOs used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;
pub mod student;

// Re-export commonly used types
pub use requests::{FieldError, StudentPayload, MAX_AGE};
pub use responses::{
    ErrorResponse, HealthResponse, MessageResponse, StudentIdResponse, StudentListResponse,
    StudentResponse, STATUS_ERROR, STATUS_OK,
};
pub use student::{NewStudent, Student};
