// ABOUTME: Error types for credential verification and identity resolution
// ABOUTME: Distinguishes each rejected-claim reason from infrastructure failures

use slips_security::TokenError;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("token type must be 'access'")]
    InvalidTokenType,

    #[error("invalid token issuer")]
    InvalidIssuer,

    #[error("token has expired")]
    Expired,

    #[error("unknown signing key")]
    UnknownKey,

    #[error("no user ID found in token claims")]
    MissingUserId,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("invalid MCP token: {0}")]
    ApiToken(#[source] TokenError),

    #[error("JWKS error: {0}")]
    Jwks(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AuthError {
    /// Failures of our own infrastructure rather than of the presented credential
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::Jwks(_) | AuthError::Http(_) | AuthError::ApiToken(TokenError::Storage(_))
        )
    }
}
