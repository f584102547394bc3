// ABOUTME: Tag storage layer using SQLite
// ABOUTME: Owner-scoped CRUD, race-safe get-or-create, and orphan cleanup

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info, Span};
use uuid::Uuid;

use slips_storage::{parse_uuid, StorageError, StorageResult};

use crate::types::{Tag, TagCreateInput, TagUpdateInput};

pub struct TagStorage {
    pool: SqlitePool,
    span: Span,
}

impl TagStorage {
    pub fn new(pool: SqlitePool, span: Span) -> Self {
        Self { pool, span }
    }

    /// List the owner's tags ordered by name
    pub async fn list_tags(
        &self,
        owner_id: &str,
        limit: u32,
        offset: u32,
    ) -> StorageResult<Vec<Tag>> {
        debug!(
            parent: &self.span,
            "Fetching tags (owner: {}, limit: {}, offset: {})", owner_id, limit, offset
        );

        let rows = sqlx::query(
            "SELECT * FROM tags WHERE owner_id = ? ORDER BY name, id LIMIT ? OFFSET ?",
        )
        .bind(owner_id)
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_tag).collect()
    }

    /// Get a single tag. Tags owned by someone else are reported as missing.
    pub async fn get_tag(&self, tag_id: Uuid, owner_id: &str) -> StorageResult<Tag> {
        debug!(parent: &self.span, "Fetching tag: {}", tag_id);

        let row = sqlx::query("SELECT * FROM tags WHERE id = ? AND owner_id = ?")
            .bind(tag_id.to_string())
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        row_to_tag(&row)
    }

    /// Get a tag by name within the owner's tag set
    pub async fn get_tag_by_name(&self, name: &str, owner_id: &str) -> StorageResult<Option<Tag>> {
        debug!(parent: &self.span, "Fetching tag by name: {}", name);

        let mut conn = self.pool.acquire().await?;
        find_by_name(&mut conn, name, owner_id).await
    }

    /// Create a new tag. A duplicate name for the same owner is AlreadyExists.
    pub async fn create_tag(&self, input: TagCreateInput, owner_id: &str) -> StorageResult<Tag> {
        let tag = Tag::new(input.name, owner_id);

        debug!(parent: &self.span, "Creating tag: {} (name: {})", tag.id, tag.name);

        let mut conn = self.pool.acquire().await?;
        insert_tag(&mut conn, &tag).await?;

        info!(parent: &self.span, tag_id = %tag.id, owner_id = %owner_id, "Tag created");
        Ok(tag)
    }

    /// Rename a tag
    pub async fn update_tag(
        &self,
        tag_id: Uuid,
        owner_id: &str,
        input: TagUpdateInput,
    ) -> StorageResult<Tag> {
        debug!(parent: &self.span, "Updating tag: {}", tag_id);

        let result = sqlx::query(
            "UPDATE tags SET name = ?, updated_at = ? WHERE id = ? AND owner_id = ?",
        )
        .bind(&input.name)
        .bind(Utc::now())
        .bind(tag_id.to_string())
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.get_tag(tag_id, owner_id).await
    }

    /// Delete a tag; its task associations go with it
    pub async fn delete_tag(&self, tag_id: Uuid, owner_id: &str) -> StorageResult<()> {
        debug!(parent: &self.span, "Deleting tag: {}", tag_id);

        let result = sqlx::query("DELETE FROM tags WHERE id = ? AND owner_id = ?")
            .bind(tag_id.to_string())
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        info!(parent: &self.span, tag_id = %tag_id, "Tag deleted");
        Ok(())
    }

    /// Look up a tag by (name, owner), creating it when absent
    pub async fn get_or_create(&self, name: &str, owner_id: &str) -> StorageResult<Tag> {
        debug!(parent: &self.span, "Resolving tag: {}", name);

        let mut conn = self.pool.acquire().await?;
        get_or_create_tag(&mut conn, name, owner_id).await
    }

    /// Delete every tag of this owner that no task references. Returns the number removed.
    pub async fn delete_orphans(&self, owner_id: &str) -> StorageResult<u64> {
        debug!(parent: &self.span, "Deleting orphan tags for owner: {}", owner_id);

        let result = sqlx::query(
            r#"
            DELETE FROM tags
            WHERE owner_id = ?
              AND NOT EXISTS (SELECT 1 FROM task_tags tt WHERE tt.tag_id = tags.id)
            "#,
        )
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(
                parent: &self.span,
                owner_id = %owner_id,
                removed = result.rows_affected(),
                "Orphan tags removed"
            );
        }
        Ok(result.rows_affected())
    }
}

/// Get-or-create on an existing connection so callers can run it inside their transaction.
///
/// A uniqueness violation on insert means a concurrent caller created the same
/// (name, owner) first; that row is fetched and returned instead.
pub async fn get_or_create_tag(
    conn: &mut SqliteConnection,
    name: &str,
    owner_id: &str,
) -> StorageResult<Tag> {
    if let Some(tag) = find_by_name(conn, name, owner_id).await? {
        return Ok(tag);
    }

    let tag = Tag::new(name, owner_id);
    match insert_tag(conn, &tag).await {
        Ok(()) => Ok(tag),
        Err(StorageError::AlreadyExists(_)) => {
            debug!("Tag '{}' created concurrently, fetching existing row", name);
            find_by_name(conn, name, owner_id)
                .await?
                .ok_or(StorageError::NotFound)
        }
        Err(e) => Err(e),
    }
}

async fn find_by_name(
    conn: &mut SqliteConnection,
    name: &str,
    owner_id: &str,
) -> StorageResult<Option<Tag>> {
    let row = sqlx::query("SELECT * FROM tags WHERE owner_id = ? AND name = ?")
        .bind(owner_id)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(row_to_tag).transpose()
}

async fn insert_tag(conn: &mut SqliteConnection, tag: &Tag) -> StorageResult<()> {
    sqlx::query(
        r#"
        INSERT INTO tags (id, owner_id, name, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(tag.id.to_string())
    .bind(&tag.owner_id)
    .bind(&tag.name)
    .bind(tag.created_at)
    .bind(tag.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn row_to_tag(row: &SqliteRow) -> StorageResult<Tag> {
    let id: String = row.try_get("id")?;
    Ok(Tag {
        id: parse_uuid(&id)?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
