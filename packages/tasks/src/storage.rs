// ABOUTME: Task storage layer using SQLite
// ABOUTME: Owner-scoped task rows, tag associations, archive state, and filtered listing

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use slips_storage::{parse_uuid, parse_uuids, StorageError};
use slips_tags::get_or_create_tag;

use crate::error::{TaskError, TaskResult};
use crate::types::{
    StartDate, StartDateChange, StartDateKind, Task, TaskCreateInput, TaskListQuery,
    TaskUpdateInput,
};

pub struct TaskStorage {
    pub(crate) pool: SqlitePool,
}

impl TaskStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a task with its tags and seed checklist in one transaction.
    ///
    /// Tag names must already be normalized; each is resolved with get-or-create.
    pub async fn create_task(&self, owner_id: &str, input: &TaskCreateInput) -> TaskResult<Task> {
        let task_id = Uuid::new_v4();
        let now = Utc::now();
        let start_date = StartDate::from_date(input.start_date);

        debug!("Creating task: {} (owner: {})", task_id, owner_id);

        let mut tx = self.pool.begin().await?;

        // First statement writes so SQLite takes the write lock up front
        sqlx::query(
            r#"
            INSERT INTO tasks (id, owner_id, title, notes, start_date_kind, start_date,
                               archived_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?)
            "#,
        )
        .bind(task_id.to_string())
        .bind(owner_id)
        .bind(&input.title)
        .bind(&input.notes)
        .bind(start_date.kind())
        .bind(start_date.date())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        attach_tags(&mut tx, task_id, owner_id, &input.tag_names).await?;

        for (position, content) in input.checklist_items.iter().enumerate() {
            insert_checklist_item(&mut tx, task_id, content, position as i64, now).await?;
        }

        tx.commit().await?;

        self.get_task(task_id, owner_id).await
    }

    /// Fetch a task with its tags and checklist. Other owners' tasks are NotFound.
    pub async fn get_task(&self, task_id: Uuid, owner_id: &str) -> TaskResult<Task> {
        debug!("Fetching task: {}", task_id);

        let mut conn = self.pool.acquire().await?;
        fetch_task(&mut conn, task_id, owner_id).await
    }

    /// Apply an update: title, notes, full tag replacement, and an optional start-date change
    pub async fn update_task(
        &self,
        task_id: Uuid,
        owner_id: &str,
        input: &TaskUpdateInput,
    ) -> TaskResult<Task> {
        debug!("Updating task: {}", task_id);

        let mut tx = self.pool.begin().await?;

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE tasks SET title = ");
        query.push_bind(&input.title);
        query.push(", notes = ");
        query.push_bind(&input.notes);
        query.push(", updated_at = ");
        query.push_bind(Utc::now());

        if input.start_date != StartDateChange::Unchanged {
            let start_date = input.start_date.apply(StartDate::Inbox);
            query.push(", start_date_kind = ");
            query.push_bind(start_date.kind());
            query.push(", start_date = ");
            query.push_bind(start_date.date());
        }

        query.push(" WHERE id = ");
        query.push_bind(task_id.to_string());
        query.push(" AND owner_id = ");
        query.push_bind(owner_id);

        let result = query.build().execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound.into());
        }

        sqlx::query("DELETE FROM task_tags WHERE task_id = ?")
            .bind(task_id.to_string())
            .execute(&mut *tx)
            .await?;
        attach_tags(&mut tx, task_id, owner_id, &input.tag_names).await?;

        tx.commit().await?;

        self.get_task(task_id, owner_id).await
    }

    /// Delete a task; tag links and checklist items cascade
    pub async fn delete_task(&self, task_id: Uuid, owner_id: &str) -> TaskResult<()> {
        debug!("Deleting task: {}", task_id);

        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND owner_id = ?")
            .bind(task_id.to_string())
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound.into());
        }
        Ok(())
    }

    /// List the owner's tasks, newest first
    pub async fn list_tasks(&self, owner_id: &str, params: &TaskListQuery) -> TaskResult<Vec<Task>> {
        debug!(
            "Fetching tasks (owner: {}, filter: {:?}, tags: {}, limit: {}, offset: {})",
            owner_id,
            params.archive_filter,
            params.tag_ids.len(),
            params.limit,
            params.offset
        );

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT t.* FROM tasks t WHERE t.owner_id = ");
        query.push_bind(owner_id);

        if let Some(condition) = params.archive_filter.sql_condition() {
            query.push(" AND ");
            query.push(condition);
        }

        if !params.tag_ids.is_empty() {
            query.push(
                " AND EXISTS (SELECT 1 FROM task_tags tt WHERE tt.task_id = t.id AND tt.tag_id IN (",
            );
            let mut ids = query.separated(", ");
            for tag_id in &params.tag_ids {
                ids.push_bind(tag_id.to_string());
            }
            ids.push_unseparated("))");
        }

        query.push(" ORDER BY t.created_at DESC, t.id LIMIT ");
        query.push_bind(i64::from(params.limit));
        query.push(" OFFSET ");
        query.push_bind(i64::from(params.offset));

        let mut conn = self.pool.acquire().await?;
        let rows = query.build().fetch_all(&mut *conn).await?;

        let mut tasks = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut task = row_to_task(row)?;
            load_relations(&mut conn, &mut task).await?;
            tasks.push(task);
        }
        Ok(tasks)
    }

    /// Set the archived timestamp. Archiving an archived task returns it unchanged.
    pub async fn archive_task(&self, task_id: Uuid, owner_id: &str) -> TaskResult<Task> {
        debug!("Archiving task: {}", task_id);

        let now = Utc::now();
        sqlx::query(
            "UPDATE tasks SET archived_at = ?, updated_at = ? WHERE id = ? AND owner_id = ? AND archived_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(task_id.to_string())
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        self.get_task(task_id, owner_id).await
    }

    /// Clear the archived timestamp. Unarchiving an active task returns it unchanged.
    pub async fn unarchive_task(&self, task_id: Uuid, owner_id: &str) -> TaskResult<Task> {
        debug!("Unarchiving task: {}", task_id);

        sqlx::query(
            "UPDATE tasks SET archived_at = NULL, updated_at = ? WHERE id = ? AND owner_id = ? AND archived_at IS NOT NULL",
        )
        .bind(Utc::now())
        .bind(task_id.to_string())
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        self.get_task(task_id, owner_id).await
    }
}

/// Resolve tag names to ids (creating tags as needed) and link them to the task
async fn attach_tags(
    conn: &mut SqliteConnection,
    task_id: Uuid,
    owner_id: &str,
    tag_names: &[String],
) -> TaskResult<()> {
    for name in tag_names {
        let tag = get_or_create_tag(conn, name, owner_id).await?;
        sqlx::query("INSERT OR IGNORE INTO task_tags (task_id, tag_id) VALUES (?, ?)")
            .bind(task_id.to_string())
            .bind(tag.id.to_string())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub(crate) async fn insert_checklist_item(
    conn: &mut SqliteConnection,
    task_id: Uuid,
    content: &str,
    sort_order: i64,
    now: DateTime<Utc>,
) -> TaskResult<Uuid> {
    let item_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO checklist_items (id, task_id, content, completed, sort_order, created_at, updated_at)
        VALUES (?, ?, ?, 0, ?, ?, ?)
        "#,
    )
    .bind(item_id.to_string())
    .bind(task_id.to_string())
    .bind(content)
    .bind(sort_order)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(item_id)
}

pub(crate) async fn fetch_task(
    conn: &mut SqliteConnection,
    task_id: Uuid,
    owner_id: &str,
) -> TaskResult<Task> {
    let row = sqlx::query("SELECT t.* FROM tasks t WHERE t.id = ? AND t.owner_id = ?")
        .bind(task_id.to_string())
        .bind(owner_id)
        .fetch_one(&mut *conn)
        .await?;

    let mut task = row_to_task(&row)?;
    load_relations(conn, &mut task).await?;
    Ok(task)
}

async fn load_relations(conn: &mut SqliteConnection, task: &mut Task) -> TaskResult<()> {
    let tag_ids: Vec<String> =
        sqlx::query_scalar("SELECT tag_id FROM task_tags WHERE task_id = ? ORDER BY rowid")
            .bind(task.id.to_string())
            .fetch_all(&mut *conn)
            .await?;
    task.tag_ids = parse_uuids(&tag_ids)?;
    task.checklist_items = crate::checklist::load_checklist(conn, task.id).await?;
    Ok(())
}

fn row_to_task(row: &SqliteRow) -> TaskResult<Task> {
    let id: String = row.try_get("id")?;
    let kind: StartDateKind = row.try_get("start_date_kind")?;
    let date: Option<NaiveDate> = row.try_get("start_date")?;

    let start_date = StartDate::from_parts(kind, date).map_err(|e| {
        TaskError::Storage(StorageError::Corrupt(format!("task {}: {}", id, e)))
    })?;

    Ok(Task {
        id: parse_uuid(&id)?,
        owner_id: row.try_get("owner_id")?,
        title: row.try_get("title")?,
        notes: row.try_get("notes")?,
        start_date,
        archived_at: row.try_get("archived_at")?,
        tag_ids: Vec::new(),
        checklist_items: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
