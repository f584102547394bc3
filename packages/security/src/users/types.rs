// ABOUTME: Type definitions for user profiles
// ABOUTME: The stored profile and the fields supplied when a user is first seen

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields reported by the identity provider. Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub user_id: String,
    pub username: String,
    pub avatar_url: String,
    pub email: String,
}
