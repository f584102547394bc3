// ABOUTME: Authentication context for RPC handlers
// ABOUTME: Extracts the identity the middleware attached to the request

use axum::{extract::FromRequestParts, http::request::Parts};

use slips_auth::Identity;

use crate::error::AppError;

/// The authenticated caller
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0.user_id
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthenticated("authentication required".to_string()))
    }
}
