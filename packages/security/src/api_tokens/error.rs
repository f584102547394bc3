// ABOUTME: Error kinds for the API token store
// ABOUTME: Keeps revoked, expired, missing, and foreign tokens distinguishable

use slips_core::ValidationError;
use slips_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("API token not found")]
    NotFound,

    #[error("API token is inactive")]
    Inactive,

    #[error("API token is expired")]
    Expired,

    #[error("unauthorized: user mismatch")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<sqlx::Error> for TokenError {
    fn from(err: sqlx::Error) -> Self {
        match StorageError::from(err) {
            StorageError::NotFound => TokenError::NotFound,
            other => TokenError::Storage(other),
        }
    }
}

pub type TokenResult<T> = Result<T, TokenError>;
