// ABOUTME: API token module
// ABOUTME: Token records, error kinds, and the owner-checked token store

mod error;
pub mod storage;
pub mod types;

pub use error::{TokenError, TokenResult};
pub use storage::TokenStorage;
pub use types::{ApiToken, TokenGeneration, ValidatedToken};
