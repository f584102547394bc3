// ABOUTME: Slips authentication library: signed access tokens and per-request identity
// ABOUTME: Verifies JWTs against JWKS keys and resolves Bearer or MCP-Token credentials to a user id

pub mod detached;
pub mod error;
pub mod identity;
pub mod jwt;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export main types
pub use detached::DetachedTasks;
pub use error::{AuthError, AuthResult};
pub use identity::{
    is_public_operation, parse_authorization, AuthMethod, Credential, Identity, IdentityResolver,
    API_TOKEN_SCHEME, PUBLIC_OPERATIONS,
};
pub use jwt::{fetch_jwks, Claims, Jwk, JwkSet, JwtVerifier, KeySet};
