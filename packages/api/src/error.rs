// ABOUTME: Application error type returned by every RPC handler
// ABOUTME: Maps domain failures onto a fixed code taxonomy and a sanitized JSON body

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use slips_auth::AuthError;
use slips_core::ValidationError;
use slips_security::TokenError;
use slips_storage::StorageError;
use slips_tasks::TaskError;

/// Main application error type that all handlers return
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Resource not found")]
    NotFound,

    #[error("Resource already exists")]
    AlreadyExists,

    #[error("Not implemented: {0}")]
    Unimplemented(String),

    #[error("Request deadline exceeded")]
    DeadlineExceeded,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

/// Structured error response format for API consistency
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: ErrorDetail,
    request_id: String,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl AppError {
    fn to_status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
            AppError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            AppError::Unauthorized(_) => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
            AppError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::AlreadyExists => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
            AppError::Unimplemented(_) => (StatusCode::NOT_IMPLEMENTED, "UNIMPLEMENTED"),
            AppError::DeadlineExceeded => (StatusCode::GATEWAY_TIMEOUT, "DEADLINE_EXCEEDED"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }

    /// Message safe to show the caller
    fn to_user_message(&self) -> String {
        match self {
            AppError::InvalidArgument(msg)
            | AppError::Unauthenticated(msg)
            | AppError::Unauthorized(msg)
            | AppError::Unimplemented(msg) => msg.clone(),
            AppError::NotFound => "The requested resource was not found".to_string(),
            AppError::AlreadyExists => "The resource already exists".to_string(),
            AppError::DeadlineExceeded => "The request did not complete in time".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        AppError::InvalidArgument(message.into())
    }

    pub fn unimplemented(message: impl Into<String>) -> Self {
        AppError::Unimplemented(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let (status_code, error_code) = self.to_status_and_code();
        let user_message = self.to_user_message();

        match &self {
            AppError::Internal(err) => {
                error!(
                    request_id = %request_id,
                    error = %format!("{:#}", err),
                    "Internal server error occurred"
                );
            }
            AppError::Unauthenticated(reason) => {
                warn!(request_id = %request_id, reason = %reason, "Request rejected as unauthenticated");
            }
            _ => {}
        }

        let body = ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: error_code,
                message: user_message,
            },
            request_id,
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidArgument(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => AppError::NotFound,
            StorageError::AlreadyExists(_) => AppError::AlreadyExists,
            other => AppError::Internal(other.into()),
        }
    }
}

impl From<TaskError> for AppError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::Validation(e) => e.into(),
            TaskError::Storage(e) => e.into(),
            TaskError::InvalidChecklistOrder | TaskError::InconsistentStartDate(_) => {
                AppError::InvalidArgument(err.to_string())
            }
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::NotFound => AppError::NotFound,
            TokenError::Unauthorized => AppError::Unauthorized(err.to_string()),
            TokenError::Inactive | TokenError::Expired => {
                AppError::Unauthenticated(err.to_string())
            }
            TokenError::Validation(e) => e.into(),
            TokenError::Storage(e) => e.into(),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        if err.is_internal() {
            AppError::Internal(err.into())
        } else {
            AppError::Unauthenticated(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::invalid_argument("title cannot be empty").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
        assert_eq!(body["error"]["message"], "title cannot be empty");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_internal_errors_are_sanitized() {
        let err = AppError::from(StorageError::Sqlx(sqlx::Error::PoolTimedOut));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL");
        assert_eq!(body["error"]["message"], "An internal server error occurred");
        assert!(!body.to_string().contains("pool"));
    }

    #[test]
    fn test_domain_error_mapping() {
        let cases: Vec<(AppError, StatusCode)> = vec![
            (StorageError::NotFound.into(), StatusCode::NOT_FOUND),
            (
                StorageError::AlreadyExists("tags.name".to_string()).into(),
                StatusCode::CONFLICT,
            ),
            (
                StorageError::Corrupt("bad row".to_string()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (TaskError::InvalidChecklistOrder.into(), StatusCode::BAD_REQUEST),
            (
                TaskError::Storage(StorageError::NotFound).into(),
                StatusCode::NOT_FOUND,
            ),
            (TokenError::Unauthorized.into(), StatusCode::FORBIDDEN),
            (TokenError::NotFound.into(), StatusCode::NOT_FOUND),
            (TokenError::Expired.into(), StatusCode::UNAUTHORIZED),
            (AuthError::InvalidIssuer.into(), StatusCode::UNAUTHORIZED),
            (
                AuthError::Jwks("unreachable".to_string()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::unimplemented("page_token is not supported yet"),
                StatusCode::NOT_IMPLEMENTED,
            ),
            (AppError::DeadlineExceeded, StatusCode::GATEWAY_TIMEOUT),
        ];

        for (err, expected) in cases {
            assert_eq!(err.to_status_and_code().0, expected, "{:?}", err);
        }
    }
}
