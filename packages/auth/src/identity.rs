// ABOUTME: Resolves the caller's user id from the Authorization header
// ABOUTME: Bearer JWTs and MCP-Token API tokens, with a public allowlist that skips checks

use std::sync::Arc;

use tracing::{debug, warn, Span};
use uuid::Uuid;

use slips_security::TokenStorage;

use crate::detached::DetachedTasks;
use crate::error::{AuthError, AuthResult};
use crate::jwt::JwtVerifier;

/// Scheme name for opaque API tokens
pub const API_TOKEN_SCHEME: &str = "MCP-Token";

/// Operations that establish identity and so cannot require one
pub const PUBLIC_OPERATIONS: &[&str] = &[
    "/auth.v1.AuthService/GetAuthorizationURL",
    "/auth.v1.AuthService/HandleCallback",
    "/auth.v1.AuthService/RefreshToken",
];

pub fn is_public_operation(operation: &str) -> bool {
    PUBLIC_OPERATIONS.contains(&operation)
}

/// How the caller proved who they are
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Jwt,
    ApiToken,
}

/// Resolved caller for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub method: AuthMethod,
}

/// A parsed Authorization header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential<'a> {
    Bearer(&'a str),
    ApiToken(Uuid),
}

/// Split `<scheme> <value>` and select the credential kind. Schemes match case-insensitively.
pub fn parse_authorization(header: Option<&str>) -> AuthResult<Credential<'_>> {
    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(AuthError::Unauthenticated("missing authorization header"))?;

    let (scheme, value) = header
        .split_once(' ')
        .ok_or(AuthError::Unauthenticated("invalid authorization header format"))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::Unauthenticated("invalid authorization header format"));
    }

    if scheme.eq_ignore_ascii_case("bearer") {
        Ok(Credential::Bearer(value))
    } else if scheme.eq_ignore_ascii_case(API_TOKEN_SCHEME) {
        let token = Uuid::parse_str(value)
            .map_err(|_| AuthError::Unauthenticated("invalid MCP token format"))?;
        Ok(Credential::ApiToken(token))
    } else {
        Err(AuthError::Unauthenticated(
            "unsupported authentication scheme (expected 'Bearer' or 'MCP-Token')",
        ))
    }
}

/// Turns request credentials into an [`Identity`]
pub struct IdentityResolver {
    verifier: JwtVerifier,
    tokens: Arc<TokenStorage>,
    detached: DetachedTasks,
    span: Span,
}

impl IdentityResolver {
    pub fn new(
        verifier: JwtVerifier,
        tokens: Arc<TokenStorage>,
        detached: DetachedTasks,
        span: Span,
    ) -> Self {
        Self {
            verifier,
            tokens,
            detached,
            span,
        }
    }

    /// Resolve the caller of `operation`. Public operations resolve to `None` without
    /// looking at the header at all.
    pub async fn resolve(
        &self,
        operation: &str,
        authorization: Option<&str>,
    ) -> AuthResult<Option<Identity>> {
        if is_public_operation(operation) {
            debug!(parent: &self.span, operation, "Public operation, skipping authentication");
            return Ok(None);
        }

        let identity = match parse_authorization(authorization)? {
            Credential::Bearer(token) => self.resolve_jwt(token)?,
            Credential::ApiToken(token) => self.resolve_api_token(token).await?,
        };

        debug!(
            parent: &self.span,
            operation,
            user_id = %identity.user_id,
            method = ?identity.method,
            "Request authenticated"
        );
        Ok(Some(identity))
    }

    fn resolve_jwt(&self, token: &str) -> AuthResult<Identity> {
        let claims = self.verifier.verify(token)?;
        Ok(Identity {
            user_id: claims.user_id()?.to_string(),
            method: AuthMethod::Jwt,
        })
    }

    async fn resolve_api_token(&self, token: Uuid) -> AuthResult<Identity> {
        let validated = self
            .tokens
            .validate_token(&token.to_string())
            .await
            .map_err(AuthError::ApiToken)?;

        let tokens = self.tokens.clone();
        let span = self.span.clone();
        let token_id = validated.token_id;
        self.detached.spawn(async move {
            if let Err(e) = tokens.update_last_used(token_id).await {
                warn!(
                    parent: &span,
                    token_id = %token_id,
                    error = %e,
                    "Failed to update API token last used timestamp"
                );
            }
        });

        Ok(Identity {
            user_id: validated.owner_id,
            method: AuthMethod::ApiToken,
        })
    }
}
