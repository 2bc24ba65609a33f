//! SQLite Storage
//!
//! Pooled SQLite access in WAL mode: writers are serialized by the engine,
//! readers never wait on them.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use super::{Storage, StorageError};
use crate::models::{NewStudent, Student};

/// How long a writer waits for the database lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str = "SELECT id, name, email, age FROM students";

#[derive(sqlx::FromRow)]
struct StudentRow {
    id: i64,
    name: String,
    email: String,
    age: i64,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            age: row.age,
        }
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    match err {
        sqlx::Error::RowNotFound => StorageError::NotFound,
        // SQLite reports "UNIQUE constraint failed: students.email"
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Duplicate {
            field: db
                .message()
                .rsplit('.')
                .next()
                .unwrap_or("unknown")
                .to_string(),
        },
        other => StorageError::from_persistence(other),
    }
}

// == SQLite Storage ==
/// [`Storage`] backed by a single SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    // == Connect ==
    /// Opens (creating if needed) the database at `path` and applies migrations.
    ///
    /// # Arguments
    /// * `path` - Database file; missing parent directories are created
    /// * `max_connections` - Upper bound of the connection pool
    pub async fn connect(
        path: impl AsRef<Path>,
        max_connections: u32,
    ) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(StorageError::from_persistence)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(StorageError::from_persistence)?;

        info!(path = %path.display(), "SQLite storage ready");
        Ok(Self { pool })
    }

    // == Close ==
    /// Waits for checked-out connections and closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn create_student(&self, new: &NewStudent) -> Result<i64, StorageError> {
        let result = sqlx::query("INSERT INTO students (name, email, age) VALUES (?, ?, ?)")
            .bind(new.name.as_str())
            .bind(new.email.as_str())
            .bind(new.age)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.last_insert_rowid())
    }

    async fn get_student_by_id(&self, id: i64) -> Result<Student, StorageError> {
        let row: Option<StudentRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ? LIMIT 1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        row.map(Student::from).ok_or(StorageError::NotFound)
    }

    async fn get_students(&self) -> Result<Vec<Student>, StorageError> {
        let rows: Vec<StudentRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Student::from).collect())
    }

    async fn update_student(&self, id: i64, student: &NewStudent) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE students SET name = ?, email = ?, age = ? WHERE id = ?")
            .bind(student.name.as_str())
            .bind(student.email.as_str())
            .bind(student.age)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_student(&self, id: i64) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }
}
