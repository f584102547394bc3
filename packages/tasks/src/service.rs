// ABOUTME: Task engine enforcing validation, ownership, and post-commit tag cleanup
// ABOUTME: Every operation is scoped to the caller's resolved user id

use std::sync::Arc;

use tracing::{error, info, warn, Span};
use uuid::Uuid;

use slips_core::{
    normalize_tag_names, validate_checklist_content, validate_notes, validate_title,
    ValidationError, MAX_CHECKLIST_SEED_ITEMS, MAX_TAGS_PER_TASK,
};
use slips_tags::TagStorage;

use crate::error::{TaskError, TaskResult};
use crate::storage::TaskStorage;
use crate::types::{ChecklistItem, Task, TaskCreateInput, TaskListQuery, TaskUpdateInput};

pub struct TaskService {
    storage: TaskStorage,
    tags: Arc<TagStorage>,
    span: Span,
}

impl TaskService {
    pub fn new(storage: TaskStorage, tags: Arc<TagStorage>, span: Span) -> Self {
        Self {
            storage,
            tags,
            span,
        }
    }

    pub async fn create_task(&self, owner_id: &str, input: TaskCreateInput) -> TaskResult<Task> {
        validate_title(&input.title)?;
        validate_notes(&input.notes)?;
        let tag_names = normalize_tag_names(&input.tag_names, MAX_TAGS_PER_TASK)?;

        if input.checklist_items.len() > MAX_CHECKLIST_SEED_ITEMS {
            return Err(ValidationError::TooMany {
                field: "checklist items",
                max: MAX_CHECKLIST_SEED_ITEMS,
            }
            .into());
        }
        for content in &input.checklist_items {
            validate_checklist_content(content)?;
        }

        let input = TaskCreateInput { tag_names, ..input };
        let task = self
            .storage
            .create_task(owner_id, &input)
            .await
            .inspect_err(|e| log_failure(&self.span, e, "Failed to create task"))?;

        info!(parent: &self.span, task_id = %task.id, owner_id = %owner_id, "Task created");
        Ok(task)
    }

    pub async fn get_task(&self, task_id: Uuid, owner_id: &str) -> TaskResult<Task> {
        self.storage.get_task(task_id, owner_id).await
    }

    /// Replace title, notes, and tags; apply the start-date change only when one is given.
    /// Orphaned tags are cleaned up afterwards without affecting the result.
    pub async fn update_task(
        &self,
        task_id: Uuid,
        owner_id: &str,
        input: TaskUpdateInput,
    ) -> TaskResult<Task> {
        validate_title(&input.title)?;
        validate_notes(&input.notes)?;
        let tag_names = normalize_tag_names(&input.tag_names, MAX_TAGS_PER_TASK)?;

        let input = TaskUpdateInput { tag_names, ..input };
        let task = self
            .storage
            .update_task(task_id, owner_id, &input)
            .await
            .inspect_err(|e| log_failure(&self.span, e, "Failed to update task"))?;

        self.cleanup_orphan_tags(owner_id).await;

        info!(parent: &self.span, task_id = %task.id, "Task updated");
        Ok(task)
    }

    pub async fn delete_task(&self, task_id: Uuid, owner_id: &str) -> TaskResult<()> {
        self.storage
            .delete_task(task_id, owner_id)
            .await
            .inspect_err(|e| log_failure(&self.span, e, "Failed to delete task"))?;

        self.cleanup_orphan_tags(owner_id).await;

        info!(parent: &self.span, task_id = %task_id, "Task deleted");
        Ok(())
    }

    pub async fn list_tasks(&self, owner_id: &str, query: &TaskListQuery) -> TaskResult<Vec<Task>> {
        self.storage
            .list_tasks(owner_id, query)
            .await
            .inspect_err(|e| log_failure(&self.span, e, "Failed to list tasks"))
    }

    pub async fn archive_task(&self, task_id: Uuid, owner_id: &str) -> TaskResult<Task> {
        let task = self.storage.archive_task(task_id, owner_id).await?;
        info!(parent: &self.span, task_id = %task_id, "Task archived");
        Ok(task)
    }

    pub async fn unarchive_task(&self, task_id: Uuid, owner_id: &str) -> TaskResult<Task> {
        let task = self.storage.unarchive_task(task_id, owner_id).await?;
        info!(parent: &self.span, task_id = %task_id, "Task unarchived");
        Ok(task)
    }

    pub async fn add_checklist_item(
        &self,
        task_id: Uuid,
        owner_id: &str,
        content: &str,
    ) -> TaskResult<ChecklistItem> {
        validate_checklist_content(content)?;
        self.storage
            .add_checklist_item(task_id, owner_id, content)
            .await
    }

    pub async fn update_checklist_item(
        &self,
        item_id: Uuid,
        owner_id: &str,
        content: &str,
    ) -> TaskResult<ChecklistItem> {
        validate_checklist_content(content)?;
        self.storage
            .update_checklist_item_content(item_id, owner_id, content)
            .await
    }

    pub async fn set_checklist_item_completed(
        &self,
        item_id: Uuid,
        owner_id: &str,
        completed: bool,
    ) -> TaskResult<ChecklistItem> {
        self.storage
            .set_checklist_item_completed(item_id, owner_id, completed)
            .await
    }

    pub async fn delete_checklist_item(&self, item_id: Uuid, owner_id: &str) -> TaskResult<()> {
        self.storage.delete_checklist_item(item_id, owner_id).await
    }

    /// All-or-nothing reorder; an empty list is rejected before storage is touched
    pub async fn reorder_checklist_items(
        &self,
        task_id: Uuid,
        owner_id: &str,
        item_ids: &[Uuid],
    ) -> TaskResult<Vec<ChecklistItem>> {
        if item_ids.is_empty() {
            return Err(ValidationError::Empty { field: "item_ids" }.into());
        }

        self.storage
            .reorder_checklist_items(task_id, owner_id, item_ids)
            .await
            .inspect_err(|e| {
                if matches!(e, TaskError::InvalidChecklistOrder) {
                    warn!(parent: &self.span, task_id = %task_id, "Rejected stale checklist order");
                }
            })
    }

    /// Post-commit hook: failures are logged and never reach the caller
    async fn cleanup_orphan_tags(&self, owner_id: &str) {
        if let Err(e) = self.tags.delete_orphans(owner_id).await {
            warn!(
                parent: &self.span,
                owner_id = %owner_id,
                error = %e,
                "Failed to clean up orphan tags"
            );
        }
    }
}

fn log_failure(span: &Span, err: &TaskError, message: &'static str) {
    if err.is_not_found() {
        return;
    }
    error!(parent: span, error = %err, "{}", message);
}
