// ABOUTME: Integration tests for the user profile store
// ABOUTME: First-seen inserts, fill-only-if-unset upserts, and missing-user lookups

use pretty_assertions::assert_eq;
use slips_security::{NewUser, UserStorage};
use slips_storage::test_utils::memory_pool;
use slips_storage::StorageError;
use tracing::Span;

async fn setup() -> UserStorage {
    UserStorage::new(memory_pool().await, Span::none())
}

fn reported(user_id: &str, username: &str, avatar_url: &str, email: &str) -> NewUser {
    NewUser {
        user_id: user_id.to_string(),
        username: username.to_string(),
        avatar_url: avatar_url.to_string(),
        email: email.to_string(),
    }
}

#[tokio::test]
async fn test_upsert_then_get() {
    let storage = setup().await;

    let stored = storage
        .upsert_user(&reported("alice", "alice", "https://example.com/a.png", "a@example.com"))
        .await
        .unwrap();
    assert_eq!(stored.username.as_deref(), Some("alice"));

    let fetched = storage.get_user("alice").await.unwrap();
    assert_eq!(fetched, stored);
}

#[tokio::test]
async fn test_upsert_only_fills_unset_fields() {
    let storage = setup().await;

    storage
        .upsert_user(&reported("alice", "alice", "", ""))
        .await
        .unwrap();
    let updated = storage
        .upsert_user(&reported("alice", "renamed", "https://example.com/a.png", "a@example.com"))
        .await
        .unwrap();

    assert_eq!(updated.username.as_deref(), Some("alice"));
    assert_eq!(updated.avatar_url.as_deref(), Some("https://example.com/a.png"));
    assert_eq!(updated.email.as_deref(), Some("a@example.com"));
    assert!(updated.updated_at >= updated.created_at);
}

#[tokio::test]
async fn test_get_unknown_user_is_not_found() {
    let storage = setup().await;

    storage
        .upsert_user(&reported("alice", "alice", "", ""))
        .await
        .unwrap();

    let err = storage.get_user("bob").await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn test_upsert_requires_user_id() {
    let storage = setup().await;

    assert!(storage.upsert_user(&reported("  ", "x", "", "")).await.is_err());
}
