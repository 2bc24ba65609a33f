//! Error types for the HTTP layer
//!
//! Provides unified error handling using thiserror. Cache failures never reach
//! this type: handlers log and swallow them.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::{ErrorResponse, FieldError};
use crate::storage::StorageError;

// == API Error Enum ==
/// Every way a handler can fail.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request carried no body where one is required
    #[error("empty body")]
    EmptyBody,

    /// The body is not the expected JSON
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// The path id is not an integer
    #[error("invalid student id `{0}`")]
    InvalidId(String),

    /// One or more fields violate their constraints
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// The store rejected or failed the operation
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::EmptyBody
            | ApiError::InvalidBody(_)
            | ApiError::InvalidId(_)
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            // Not-found and duplicates stay 500 for existing clients; the
            // message tells them apart.
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = match self {
            ApiError::Validation(errors) => ErrorResponse::validation(errors),
            other => ErrorResponse::new(other.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
