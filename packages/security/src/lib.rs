// ABOUTME: API token and user profile stores for the Slips backend
// ABOUTME: Issues opaque tokens, stores only their hashes, and keeps provider-reported profiles

pub mod api_tokens;
pub mod users;

// Re-export main types for convenience
pub use api_tokens::{
    ApiToken, TokenError, TokenGeneration, TokenResult, TokenStorage, ValidatedToken,
};
pub use users::{NewUser, User, UserStorage};
