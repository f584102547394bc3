// ABOUTME: JSON request extraction and shared response shapes for RPC handlers
// ABOUTME: Malformed bodies surface as INVALID_ARGUMENT instead of axum's plain-text rejections

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::AppError;

/// Message returned by the list operations when more pages are requested
pub const PAGE_TOKEN_UNSUPPORTED: &str = "page_token is not supported yet";

/// JSON body of an RPC call. An empty body decodes as `{}`.
#[derive(Debug, Clone)]
pub struct Rpc<T>(pub T);

impl<S, T> FromRequest<S> for Rpc<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::invalid_argument(format!("failed to read request body: {}", e)))?;

        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };

        serde_json::from_slice(body)
            .map(Rpc)
            .map_err(|e| AppError::invalid_argument(format!("invalid request body: {}", e)))
    }
}

/// Response for operations that return nothing
#[derive(Debug, Default, Serialize)]
pub struct Empty {}

/// Rejects a non-empty page token; only the first page is ever served
pub fn reject_page_token(page_token: &str) -> Result<(), AppError> {
    if page_token.is_empty() {
        Ok(())
    } else {
        Err(AppError::unimplemented(PAGE_TOKEN_UNSUPPORTED))
    }
}
