//! Request DTOs for the student API
//!
//! Defines the structure of incoming HTTP request bodies and their validation.

use serde::{Deserialize, Serialize};

use crate::models::{NewStudent, Student};

/// Upper bound accepted for `age`.
pub const MAX_AGE: i64 = 150;

/// Request body for POST /api/students and PUT /api/students/:id
///
/// Every field is optional at the JSON level: on create a missing field is
/// reported as a validation error, on update it keeps the stored value.
/// Unknown fields, `id` included, are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl StudentPayload {
    /// Validates the payload as a brand new record.
    pub fn into_new_student(self) -> Result<NewStudent, Vec<FieldError>> {
        validate(self.name, self.email, self.age)
    }

    /// Overlays the provided fields on `current` and validates the result.
    pub fn merge_into(self, current: Student) -> Result<NewStudent, Vec<FieldError>> {
        validate(
            self.name.or(Some(current.name)),
            self.email.or(Some(current.email)),
            self.age.or(Some(current.age)),
        )
    }
}

fn validate(
    name: Option<String>,
    email: Option<String>,
    age: Option<i64>,
) -> Result<NewStudent, Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = match name {
        Some(name) if !name.trim().is_empty() => Some(name),
        _ => {
            errors.push(FieldError::new("name", "field name is required"));
            None
        }
    };

    let email = match email {
        Some(email) if email.trim().is_empty() => {
            errors.push(FieldError::new("email", "field email is required"));
            None
        }
        Some(email) if !is_valid_email(&email) => {
            errors.push(FieldError::new("email", "field email must be a valid email"));
            None
        }
        Some(email) => Some(email),
        None => {
            errors.push(FieldError::new("email", "field email is required"));
            None
        }
    };

    let age = match age {
        Some(age) if (0..=MAX_AGE).contains(&age) => Some(age),
        Some(_) => {
            errors.push(FieldError::new(
                "age",
                format!("field age must be between 0 and {}", MAX_AGE),
            ));
            None
        }
        None => {
            errors.push(FieldError::new("age", "field age is required"));
            None
        }
    };

    match (name, email, age) {
        (Some(name), Some(email), Some(age)) if errors.is_empty() => {
            Ok(NewStudent { name, email, age })
        }
        _ => Err(errors),
    }
}

/// Checks the `local@domain.tld` shape, without whitespace.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}
