// ABOUTME: Storage operations for API tokens
// ABOUTME: Token generation, hashing, validation, and owner-checked management

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn, Span};
use uuid::Uuid;

use slips_core::{validate_token_name, ValidationError};
use slips_storage::parse_uuid;

use crate::api_tokens::error::{TokenError, TokenResult};
use crate::api_tokens::types::{ApiToken, TokenGeneration, ValidatedToken};

const TOKEN_COLUMNS: &str =
    "id, token_hash, owner_id, name, created_at, expires_at, last_used_at, is_active";

pub struct TokenStorage {
    pool: SqlitePool,
    span: Span,
}

impl TokenStorage {
    pub fn new(pool: SqlitePool, span: Span) -> Self {
        Self { pool, span }
    }

    /// Generate a fresh opaque token value
    pub fn generate_token() -> String {
        Uuid::new_v4().to_string()
    }

    /// Hash a token using SHA-256.
    /// This is what gets stored in the database.
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Verify a token against a stored hash using constant-time comparison
    pub fn verify_token_hash(token: &str, stored_hash: &str) -> bool {
        let computed_hash = Self::hash_token(token);
        computed_hash
            .as_bytes()
            .ct_eq(stored_hash.as_bytes())
            .into()
    }

    /// Create a token for `owner_id`. The returned plaintext is never stored.
    pub async fn create_token(
        &self,
        owner_id: &str,
        name: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> TokenResult<TokenGeneration> {
        validate_token_name(name)?;
        let now = Utc::now();
        if expires_at.is_some_and(|expires_at| expires_at <= now) {
            return Err(ValidationError::Invalid(
                "expires_at must be in the future".to_string(),
            )
            .into());
        }

        let id = Uuid::new_v4();
        let token = Self::generate_token();
        let token_hash = Self::hash_token(&token);
        let name = name.trim();

        sqlx::query(
            "INSERT INTO api_tokens (id, token_hash, owner_id, name, created_at, expires_at, last_used_at, is_active)
             VALUES (?, ?, ?, ?, ?, ?, NULL, 1)",
        )
        .bind(id.to_string())
        .bind(&token_hash)
        .bind(owner_id)
        .bind(name)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        info!(parent: &self.span, token_id = %id, owner_id = %owner_id, "API token created");

        Ok(TokenGeneration {
            token,
            record: ApiToken {
                id,
                owner_id: owner_id.to_string(),
                name: name.to_string(),
                created_at: now,
                expires_at,
                last_used_at: None,
                is_active: true,
            },
        })
    }

    /// Resolve a presented token value to its owner.
    ///
    /// Fails with `NotFound` for unknown values, `Inactive` for revoked tokens,
    /// and `Expired` once the expiry has passed.
    pub async fn validate_token(&self, token: &str) -> TokenResult<ValidatedToken> {
        let token_hash = Self::hash_token(token);

        let query = format!("SELECT {} FROM api_tokens WHERE token_hash = ?", TOKEN_COLUMNS);
        let row = sqlx::query(&query)
            .bind(&token_hash)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(TokenError::NotFound)?;

        // Double-check with constant-time comparison
        let stored_hash: String = row.try_get("token_hash")?;
        if !Self::verify_token_hash(token, &stored_hash) {
            return Err(TokenError::NotFound);
        }

        let record = row_to_token(&row)?;
        if !record.is_active {
            debug!(parent: &self.span, token_id = %record.id, "API token is inactive");
            return Err(TokenError::Inactive);
        }
        if record.is_expired_at(Utc::now()) {
            debug!(parent: &self.span, token_id = %record.id, "API token is expired");
            return Err(TokenError::Expired);
        }

        debug!(parent: &self.span, token_id = %record.id, owner_id = %record.owner_id, "API token validated");
        Ok(ValidatedToken {
            token_id: record.id,
            owner_id: record.owner_id,
        })
    }

    /// Update the last_used_at timestamp for a token
    pub async fn update_last_used(&self, token_id: Uuid) -> TokenResult<()> {
        sqlx::query("UPDATE api_tokens SET last_used_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(token_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Get a token the caller owns
    pub async fn get_token(&self, token_id: Uuid, owner_id: &str) -> TokenResult<ApiToken> {
        debug!(parent: &self.span, "Fetching API token: {}", token_id);
        self.fetch_owned(token_id, owner_id, "access").await
    }

    /// List the caller's tokens, newest first
    pub async fn list_tokens(&self, owner_id: &str) -> TokenResult<Vec<ApiToken>> {
        let query = format!(
            "SELECT {} FROM api_tokens WHERE owner_id = ? ORDER BY created_at DESC, id",
            TOKEN_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(parent: &self.span, owner_id = %owner_id, count = rows.len(), "Listed API tokens");
        rows.iter().map(row_to_token).collect()
    }

    /// Deactivate a token. Revoking a revoked token is a no-op.
    pub async fn revoke_token(&self, token_id: Uuid, owner_id: &str) -> TokenResult<()> {
        self.fetch_owned(token_id, owner_id, "revoke").await?;

        sqlx::query("UPDATE api_tokens SET is_active = 0 WHERE id = ? AND owner_id = ?")
            .bind(token_id.to_string())
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        info!(parent: &self.span, token_id = %token_id, owner_id = %owner_id, "API token revoked");
        Ok(())
    }

    /// Permanently delete a token
    pub async fn delete_token(&self, token_id: Uuid, owner_id: &str) -> TokenResult<()> {
        self.fetch_owned(token_id, owner_id, "delete").await?;

        sqlx::query("DELETE FROM api_tokens WHERE id = ? AND owner_id = ?")
            .bind(token_id.to_string())
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        info!(parent: &self.span, token_id = %token_id, owner_id = %owner_id, "API token deleted");
        Ok(())
    }

    /// Load a token and check it belongs to `owner_id`
    async fn fetch_owned(
        &self,
        token_id: Uuid,
        owner_id: &str,
        action: &'static str,
    ) -> TokenResult<ApiToken> {
        let query = format!("SELECT {} FROM api_tokens WHERE id = ?", TOKEN_COLUMNS);
        let row = sqlx::query(&query)
            .bind(token_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(TokenError::NotFound)?;

        let record = row_to_token(&row)?;
        if record.owner_id != owner_id {
            warn!(
                parent: &self.span,
                token_id = %token_id,
                requester = %owner_id,
                action,
                "Unauthorized API token access attempt"
            );
            return Err(TokenError::Unauthorized);
        }
        Ok(record)
    }
}

fn row_to_token(row: &SqliteRow) -> TokenResult<ApiToken> {
    let id: String = row.try_get("id")?;
    Ok(ApiToken {
        id: parse_uuid(&id)?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
        last_used_at: row.try_get("last_used_at")?,
        is_active: row.try_get::<i64, _>("is_active")? != 0,
    })
}
