//! Response DTOs for the student API
//!
//! Every body carries a `status` of `"OK"` or `"Error"`.

use serde::Serialize;

use crate::models::{FieldError, Student};

/// `status` value of every successful response.
pub const STATUS_OK: &str = "OK";
/// `status` value of every error response.
pub const STATUS_ERROR: &str = "Error";

/// Response body for create and update (POST /api/students, PUT /api/students/:id)
#[derive(Debug, Clone, Serialize)]
pub struct StudentIdResponse {
    pub status: &'static str,
    pub student_id: i64,
}

impl StudentIdResponse {
    pub fn new(student_id: i64) -> Self {
        Self {
            status: STATUS_OK,
            student_id,
        }
    }
}

/// Response body for GET /api/students/:id
#[derive(Debug, Clone, Serialize)]
pub struct StudentResponse {
    pub status: &'static str,
    pub student: Student,
}

impl StudentResponse {
    pub fn new(student: Student) -> Self {
        Self {
            status: STATUS_OK,
            student,
        }
    }
}

/// Response body for GET /api/students/
#[derive(Debug, Clone, Serialize)]
pub struct StudentListResponse {
    pub status: &'static str,
    pub students: Vec<Student>,
}

impl StudentListResponse {
    pub fn new(students: Vec<Student>) -> Self {
        Self {
            status: STATUS_OK,
            students,
        }
    }
}

/// Response body for DELETE /api/students/:id
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub msg: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            status: STATUS_OK,
            msg: msg.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "OK" when the store answers, "Error" otherwise
    pub status: &'static str,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub storage: &'static str,
    pub cache: &'static str,
}

impl HealthResponse {
    /// Builds the report from the two dependency probes.
    pub fn from_probes(storage_up: bool, cache_up: bool) -> Self {
        let label = |up: bool| if up { "up" } else { "down" };
        Self {
            status: if storage_up { STATUS_OK } else { STATUS_ERROR },
            timestamp: chrono::Utc::now().to_rfc3339(),
            storage: label(storage_up),
            cache: label(cache_up),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    /// Error message describing what went wrong
    pub error: String,
    /// Per-field violations, only present for validation failures
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR,
            error: error.into(),
            errors: Vec::new(),
        }
    }

    /// Joins the field messages into `error` and keeps the structured list.
    pub fn validation(errors: Vec<FieldError>) -> Self {
        let error = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            status: STATUS_ERROR,
            error,
            errors,
        }
    }
}
