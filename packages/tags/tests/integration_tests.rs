// ABOUTME: Integration tests for tag storage operations
// ABOUTME: Tests owner scoping, get-or-create convergence, and orphan cleanup

use chrono::Utc;
use pretty_assertions::assert_eq;
use slips_storage::test_utils::{file_pool, memory_pool};
use slips_storage::StorageError;
use slips_tags::{Tag, TagCreateInput, TagStorage, TagUpdateInput};
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::Span;
use uuid::Uuid;

fn storage(pool: &SqlitePool) -> TagStorage {
    TagStorage::new(pool.clone(), Span::none())
}

/// Insert a bare task row and link it to the given tags
async fn insert_task_with_tags(pool: &SqlitePool, owner_id: &str, tags: &[&Tag]) -> Uuid {
    let task_id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO tasks (id, owner_id, title, created_at, updated_at) VALUES (?, ?, 'task', ?, ?)",
    )
    .bind(task_id.to_string())
    .bind(owner_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();

    for tag in tags {
        sqlx::query("INSERT INTO task_tags (task_id, tag_id) VALUES (?, ?)")
            .bind(task_id.to_string())
            .bind(tag.id.to_string())
            .execute(pool)
            .await
            .unwrap();
    }
    task_id
}

async fn tag_count(pool: &SqlitePool, owner_id: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM tags WHERE owner_id = ?")
        .bind(owner_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_and_get_tag() {
    let pool = memory_pool().await;
    let storage = storage(&pool);

    let tag = storage
        .create_tag(
            TagCreateInput {
                name: "work".to_string(),
            },
            "alice",
        )
        .await
        .unwrap();

    assert_eq!(tag.name, "work");
    assert_eq!(tag.owner_id, "alice");

    let fetched = storage.get_tag(tag.id, "alice").await.unwrap();
    assert_eq!(fetched.id, tag.id);
    assert_eq!(fetched.name, "work");
}

#[tokio::test]
async fn test_duplicate_name_same_owner_is_already_exists() {
    let pool = memory_pool().await;
    let storage = storage(&pool);

    let input = TagCreateInput {
        name: "work".to_string(),
    };
    storage.create_tag(input.clone(), "alice").await.unwrap();

    let err = storage.create_tag(input, "alice").await.unwrap_err();
    assert!(matches!(err, StorageError::AlreadyExists(_)));
}

#[tokio::test]
async fn test_same_name_different_owners_allowed() {
    let pool = memory_pool().await;
    let storage = storage(&pool);

    let a = storage.get_or_create("work", "alice").await.unwrap();
    let b = storage.get_or_create("work", "bob").await.unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(a.name, b.name);
}

#[tokio::test]
async fn test_cross_owner_get_is_not_found() {
    let pool = memory_pool().await;
    let storage = storage(&pool);

    let tag = storage.get_or_create("secret", "alice").await.unwrap();

    let err = storage.get_tag(tag.id, "bob").await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    let missing = storage.get_tag(Uuid::new_v4(), "alice").await.unwrap_err();
    assert!(matches!(missing, StorageError::NotFound));
}

#[tokio::test]
async fn test_cross_owner_update_and_delete_are_not_found() {
    let pool = memory_pool().await;
    let storage = storage(&pool);

    let tag = storage.get_or_create("mine", "alice").await.unwrap();

    let update = storage
        .update_tag(
            tag.id,
            "bob",
            TagUpdateInput {
                name: "stolen".to_string(),
            },
        )
        .await;
    assert!(matches!(update, Err(StorageError::NotFound)));

    let delete = storage.delete_tag(tag.id, "bob").await;
    assert!(matches!(delete, Err(StorageError::NotFound)));

    assert_eq!(storage.get_tag(tag.id, "alice").await.unwrap().name, "mine");
}

#[tokio::test]
async fn test_update_tag_renames() {
    let pool = memory_pool().await;
    let storage = storage(&pool);

    let tag = storage.get_or_create("old", "alice").await.unwrap();
    let renamed = storage
        .update_tag(
            tag.id,
            "alice",
            TagUpdateInput {
                name: "new".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(renamed.id, tag.id);
    assert_eq!(renamed.name, "new");
    assert!(renamed.updated_at >= tag.updated_at);
    assert!(storage.get_tag_by_name("old", "alice").await.unwrap().is_none());
}

#[tokio::test]
async fn test_rename_into_existing_name_is_already_exists() {
    let pool = memory_pool().await;
    let storage = storage(&pool);

    storage.get_or_create("a", "alice").await.unwrap();
    let b = storage.get_or_create("b", "alice").await.unwrap();

    let err = storage
        .update_tag(
            b.id,
            "alice",
            TagUpdateInput {
                name: "a".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::AlreadyExists(_)));
}

#[tokio::test]
async fn test_list_tags_is_owner_scoped_and_paginated() {
    let pool = memory_pool().await;
    let storage = storage(&pool);

    for name in ["c", "a", "b"] {
        storage.get_or_create(name, "alice").await.unwrap();
    }
    storage.get_or_create("z", "bob").await.unwrap();

    let all = storage.list_tags("alice", 30, 0).await.unwrap();
    let names: Vec<&str> = all.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);

    let page = storage.list_tags("alice", 2, 0).await.unwrap();
    assert_eq!(page.len(), 2);
}

#[tokio::test]
async fn test_get_or_create_returns_existing() {
    let pool = memory_pool().await;
    let storage = storage(&pool);

    let first = storage.get_or_create("work", "alice").await.unwrap();
    let second = storage.get_or_create("work", "alice").await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(tag_count(&pool, "alice").await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_get_or_create_converges_to_one_row() {
    let dir = TempDir::new().unwrap();
    let pool = file_pool(dir.path(), 8).await;
    let storage = Arc::new(storage(&pool));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let storage = storage.clone();
        handles.push(tokio::spawn(async move {
            storage.get_or_create("shared", "alice").await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }

    ids.dedup();
    assert_eq!(ids.len(), 1, "all callers must observe the same tag");
    assert_eq!(tag_count(&pool, "alice").await, 1);
}

#[tokio::test]
async fn test_delete_orphans_removes_only_unreferenced_tags() {
    let pool = memory_pool().await;
    let storage = storage(&pool);

    let used = storage.get_or_create("used", "alice").await.unwrap();
    let orphan = storage.get_or_create("orphan", "alice").await.unwrap();
    let bobs = storage.get_or_create("orphan", "bob").await.unwrap();
    insert_task_with_tags(&pool, "alice", &[&used]).await;

    let removed = storage.delete_orphans("alice").await.unwrap();
    assert_eq!(removed, 1);

    assert!(storage.get_tag(used.id, "alice").await.is_ok());
    assert!(matches!(
        storage.get_tag(orphan.id, "alice").await,
        Err(StorageError::NotFound)
    ));
    // Other owners are untouched
    assert!(storage.get_tag(bobs.id, "bob").await.is_ok());
}

#[tokio::test]
async fn test_delete_orphans_after_last_referencing_task_is_deleted() {
    let pool = memory_pool().await;
    let storage = storage(&pool);

    let shared = storage.get_or_create("shared", "alice").await.unwrap();
    let solo = storage.get_or_create("solo", "alice").await.unwrap();
    let first = insert_task_with_tags(&pool, "alice", &[&shared, &solo]).await;
    insert_task_with_tags(&pool, "alice", &[&shared]).await;

    sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(first.to_string())
        .execute(&pool)
        .await
        .unwrap();

    storage.delete_orphans("alice").await.unwrap();

    assert!(storage.get_tag(shared.id, "alice").await.is_ok());
    assert!(storage.get_tag(solo.id, "alice").await.is_err());
}

#[tokio::test]
async fn test_delete_tag_removes_associations() {
    let pool = memory_pool().await;
    let storage = storage(&pool);

    let tag = storage.get_or_create("work", "alice").await.unwrap();
    insert_task_with_tags(&pool, "alice", &[&tag]).await;

    storage.delete_tag(tag.id, "alice").await.unwrap();

    let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM task_tags")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(links, 0);
}
