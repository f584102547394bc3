// ABOUTME: Error type for the task engine
// ABOUTME: Wraps validation and storage failures and names the engine's own rule violations

use slips_core::ValidationError;
use slips_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("item_ids must include all checklist item IDs exactly once")]
    InvalidChecklistOrder,

    #[error("inconsistent start date: {0}")]
    InconsistentStartDate(&'static str),
}

impl From<sqlx::Error> for TaskError {
    fn from(err: sqlx::Error) -> Self {
        TaskError::Storage(err.into())
    }
}

impl TaskError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TaskError::Storage(StorageError::NotFound))
    }
}

pub type TaskResult<T> = Result<T, TaskError>;
