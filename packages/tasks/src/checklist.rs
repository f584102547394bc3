// ABOUTME: Checklist storage for tasks
// ABOUTME: Ordered items with append, edit, toggle, gap-free delete, and all-or-nothing reorder

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::debug;
use uuid::Uuid;

use slips_storage::{parse_uuid, StorageError};

use crate::error::{TaskError, TaskResult};
use crate::storage::{insert_checklist_item, TaskStorage};
use crate::types::ChecklistItem;

const OWNED_ITEM_CLAUSE: &str = "id = ? AND task_id IN (SELECT id FROM tasks WHERE owner_id = ?)";

impl TaskStorage {
    /// Append an item after the current last position
    pub async fn add_checklist_item(
        &self,
        task_id: Uuid,
        owner_id: &str,
        content: &str,
    ) -> TaskResult<ChecklistItem> {
        debug!("Adding checklist item to task: {}", task_id);

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        touch_task(&mut tx, task_id, owner_id).await?;

        let next_position: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM checklist_items WHERE task_id = ?",
        )
        .bind(task_id.to_string())
        .fetch_one(&mut *tx)
        .await?;

        let item_id = insert_checklist_item(&mut tx, task_id, content, next_position, now).await?;
        let item = fetch_item(&mut tx, item_id).await?;

        tx.commit().await?;
        Ok(item)
    }

    /// Replace an item's text
    pub async fn update_checklist_item_content(
        &self,
        item_id: Uuid,
        owner_id: &str,
        content: &str,
    ) -> TaskResult<ChecklistItem> {
        debug!("Updating checklist item: {}", item_id);

        let query = format!(
            "UPDATE checklist_items SET content = ?, updated_at = ? WHERE {}",
            OWNED_ITEM_CLAUSE
        );
        let result = sqlx::query(&query)
            .bind(content)
            .bind(Utc::now())
            .bind(item_id.to_string())
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound.into());
        }

        let mut conn = self.pool.acquire().await?;
        fetch_item(&mut conn, item_id).await
    }

    /// Mark an item done or not done
    pub async fn set_checklist_item_completed(
        &self,
        item_id: Uuid,
        owner_id: &str,
        completed: bool,
    ) -> TaskResult<ChecklistItem> {
        debug!("Setting checklist item {} completed: {}", item_id, completed);

        let query = format!(
            "UPDATE checklist_items SET completed = ?, updated_at = ? WHERE {}",
            OWNED_ITEM_CLAUSE
        );
        let result = sqlx::query(&query)
            .bind(completed)
            .bind(Utc::now())
            .bind(item_id.to_string())
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound.into());
        }

        let mut conn = self.pool.acquire().await?;
        fetch_item(&mut conn, item_id).await
    }

    /// Delete an item and close the gap it leaves in the ordering
    pub async fn delete_checklist_item(&self, item_id: Uuid, owner_id: &str) -> TaskResult<()> {
        debug!("Deleting checklist item: {}", item_id);

        let mut tx = self.pool.begin().await?;

        let query = format!(
            "DELETE FROM checklist_items WHERE {} RETURNING task_id",
            OWNED_ITEM_CLAUSE
        );
        let task_id: Option<String> = sqlx::query_scalar(&query)
            .bind(item_id.to_string())
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await?;

        let task_id = parse_uuid(&task_id.ok_or(StorageError::NotFound)?)?;

        let remaining = load_checklist(&mut tx, task_id).await?;
        let order: Vec<Uuid> = remaining.iter().map(|item| item.id).collect();
        write_order(&mut tx, task_id, &order).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Reassign the full ordering of a task's checklist.
    ///
    /// `item_ids` must name every current item exactly once; otherwise nothing changes.
    pub async fn reorder_checklist_items(
        &self,
        task_id: Uuid,
        owner_id: &str,
        item_ids: &[Uuid],
    ) -> TaskResult<Vec<ChecklistItem>> {
        debug!("Reordering {} checklist items for task: {}", item_ids.len(), task_id);

        let mut tx = self.pool.begin().await?;

        touch_task(&mut tx, task_id, owner_id).await?;

        let existing: Vec<Uuid> = load_checklist(&mut tx, task_id)
            .await?
            .into_iter()
            .map(|item| item.id)
            .collect();
        validate_checklist_order(&existing, item_ids)?;

        write_order(&mut tx, task_id, item_ids).await?;
        let items = load_checklist(&mut tx, task_id).await?;

        tx.commit().await?;
        Ok(items)
    }
}

/// The requested ordering must be a permutation of the existing item ids
pub fn validate_checklist_order(existing: &[Uuid], requested: &[Uuid]) -> TaskResult<()> {
    if existing.len() != requested.len() {
        return Err(TaskError::InvalidChecklistOrder);
    }

    let mut existing_sorted = existing.to_vec();
    existing_sorted.sort();
    let mut requested_sorted = requested.to_vec();
    requested_sorted.sort();

    if existing_sorted != requested_sorted {
        return Err(TaskError::InvalidChecklistOrder);
    }
    Ok(())
}

pub(crate) async fn load_checklist(
    conn: &mut SqliteConnection,
    task_id: Uuid,
) -> TaskResult<Vec<ChecklistItem>> {
    let rows = sqlx::query(
        "SELECT * FROM checklist_items WHERE task_id = ? ORDER BY sort_order, created_at, id",
    )
    .bind(task_id.to_string())
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(row_to_item).collect()
}

async fn write_order(
    conn: &mut SqliteConnection,
    task_id: Uuid,
    ordered_ids: &[Uuid],
) -> TaskResult<()> {
    let now = Utc::now();
    for (position, item_id) in ordered_ids.iter().enumerate() {
        sqlx::query(
            "UPDATE checklist_items SET sort_order = ?, updated_at = ? WHERE id = ? AND task_id = ? AND sort_order <> ?",
        )
        .bind(position as i64)
        .bind(now)
        .bind(item_id.to_string())
        .bind(task_id.to_string())
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Bump the parent task's updated_at; doubles as the ownership check
async fn touch_task(conn: &mut SqliteConnection, task_id: Uuid, owner_id: &str) -> TaskResult<()> {
    let result = sqlx::query("UPDATE tasks SET updated_at = ? WHERE id = ? AND owner_id = ?")
        .bind(Utc::now())
        .bind(task_id.to_string())
        .bind(owner_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::NotFound.into());
    }
    Ok(())
}

async fn fetch_item(conn: &mut SqliteConnection, item_id: Uuid) -> TaskResult<ChecklistItem> {
    let row = sqlx::query("SELECT * FROM checklist_items WHERE id = ?")
        .bind(item_id.to_string())
        .fetch_one(&mut *conn)
        .await?;

    row_to_item(&row)
}

fn row_to_item(row: &SqliteRow) -> TaskResult<ChecklistItem> {
    let id: String = row.try_get("id")?;
    let task_id: String = row.try_get("task_id")?;
    Ok(ChecklistItem {
        id: parse_uuid(&id)?,
        task_id: parse_uuid(&task_id)?,
        content: row.try_get("content")?,
        completed: row.try_get("completed")?,
        sort_order: row.try_get("sort_order")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
