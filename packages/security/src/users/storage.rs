// ABOUTME: Storage operations for user profiles
// ABOUTME: Upsert that never overwrites known fields, and lookup by user id

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, Span};

use slips_storage::{StorageError, StorageResult};

use crate::users::types::{NewUser, User};

const USER_COLUMNS: &str = "user_id, username, avatar_url, email, created_at, updated_at";

pub struct UserStorage {
    pool: SqlitePool,
    span: Span,
}

impl UserStorage {
    pub fn new(pool: SqlitePool, span: Span) -> Self {
        Self { pool, span }
    }

    /// Insert the profile, or fill in fields that are still unset on an existing one.
    /// Values already stored are kept even when the provider reports new ones.
    pub async fn upsert_user(&self, user: &NewUser) -> StorageResult<User> {
        if user.user_id.trim().is_empty() {
            return Err(StorageError::Database("user_id must not be empty".to_string()));
        }

        let now = Utc::now();
        let query = format!(
            "INSERT INTO users (user_id, username, avatar_url, email, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                 username = COALESCE(users.username, excluded.username),
                 avatar_url = COALESCE(users.avatar_url, excluded.avatar_url),
                 email = COALESCE(users.email, excluded.email),
                 updated_at = excluded.updated_at
             RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(&user.user_id)
            .bind(non_empty(&user.username))
            .bind(non_empty(&user.avatar_url))
            .bind(non_empty(&user.email))
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        info!(parent: &self.span, user_id = %user.user_id, "User profile stored");
        row_to_user(&row)
    }

    /// Fetch the profile for `user_id`; `NotFound` when the user was never stored
    pub async fn get_user(&self, user_id: &str) -> StorageResult<User> {
        debug!(parent: &self.span, "Fetching user profile: {}", user_id);

        let query = format!("SELECT {} FROM users WHERE user_id = ?", USER_COLUMNS);
        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound)?;

        row_to_user(&row)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

fn row_to_user(row: &SqliteRow) -> StorageResult<User> {
    Ok(User {
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        avatar_url: row.try_get("avatar_url")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
