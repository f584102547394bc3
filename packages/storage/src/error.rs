// ABOUTME: Storage error type shared by every persistence layer
// ABOUTME: Classifies driver errors into not-found, uniqueness, and opaque failures

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Sqlx error: {0}")]
    Sqlx(sqlx::Error),

    #[error("Record not found")]
    NotFound,

    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Stored data is invalid: {0}")]
    Corrupt(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// True when the error came from a uniqueness constraint
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StorageError::AlreadyExists(_))
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StorageError::AlreadyExists(db_err.message().to_string())
            }
            other => StorageError::Sqlx(other),
        }
    }
}
