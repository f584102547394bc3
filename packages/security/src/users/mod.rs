// ABOUTME: User profile module
// ABOUTME: Profile records keyed by the identity provider's user id

pub mod storage;
pub mod types;

pub use storage::UserStorage;
pub use types::{NewUser, User};
