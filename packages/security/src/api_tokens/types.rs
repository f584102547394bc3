// ABOUTME: Type definitions for API token authentication
// ABOUTME: Stored token records, the one-time creation result, and validation output

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// API token record as stored, without the secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiToken {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl ApiToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// Token creation result - includes the plaintext token for display.
/// This is the ONLY time the plaintext token is available.
#[derive(Debug, Clone)]
pub struct TokenGeneration {
    pub token: String,
    pub record: ApiToken,
}

/// Outcome of a successful validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedToken {
    pub token_id: Uuid,
    pub owner_id: String,
}
