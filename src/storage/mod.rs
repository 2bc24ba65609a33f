//! Storage Module
//!
//! The authoritative store for student records.

mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewStudent, Student};

pub use sqlite::SqliteStorage;

// == Storage Error Enum ==
/// Failures reported by a [`Storage`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No row matches the requested id
    #[error("student not found")]
    NotFound,

    /// A unique constraint rejected the write
    #[error("duplicate record violates unique constraint on `{field}`")]
    Duplicate { field: String },

    /// Any other failure of the underlying engine
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl StorageError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

// == Storage Trait ==
/// CRUD contract over the `students` table.
///
/// Every write is a single statement; implementations must tolerate
/// concurrent callers.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Inserts a record and returns the id assigned to it.
    async fn create_student(&self, new: &NewStudent) -> Result<i64, StorageError>;

    async fn get_student_by_id(&self, id: i64) -> Result<Student, StorageError>;

    /// Returns every record in ascending id order.
    async fn get_students(&self) -> Result<Vec<Student>, StorageError>;

    /// Overwrites all fields of an existing record.
    async fn update_student(&self, id: i64, student: &NewStudent) -> Result<(), StorageError>;

    async fn delete_student(&self, id: i64) -> Result<(), StorageError>;

    async fn health_check(&self) -> Result<(), StorageError>;
}
