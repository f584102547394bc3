// ABOUTME: RPC handlers for task.v1.TaskService
// ABOUTME: Parses wire requests into task engine inputs and wraps results in response messages

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use slips_core::{clamp_page_size, parse_id, parse_start_date};
use slips_tasks::{
    ArchiveFilter, ChecklistItem, StartDateChange, Task, TaskCreateInput, TaskListQuery,
    TaskUpdateInput,
};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::rpc::{reject_page_token, Empty, Rpc};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task: Task,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksResponse {
    pub tasks: Vec<Task>,
    pub next_page_token: String,
}

#[derive(Debug, Serialize)]
pub struct ChecklistItemResponse {
    pub item: ChecklistItem,
}

#[derive(Debug, Serialize)]
pub struct ChecklistItemsResponse {
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TaskIdRequest {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTaskRequest {
    pub title: String,
    pub notes: String,
    pub tag_names: Vec<String>,
    pub start_date: Option<String>,
    pub checklist_items: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateTaskRequest {
    pub id: String,
    pub title: String,
    pub notes: String,
    pub tag_names: Vec<String>,
    /// Absent leaves the start date alone, "" clears it
    pub start_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListTasksRequest {
    pub filter_tag_ids: Vec<String>,
    pub page_size: i64,
    pub page_token: String,
    pub include_archived: Option<bool>,
    pub archived_only: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddChecklistItemRequest {
    pub task_id: String,
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateChecklistItemRequest {
    pub item_id: String,
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetChecklistItemCompletedRequest {
    pub item_id: String,
    pub completed: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteChecklistItemRequest {
    pub item_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReorderChecklistItemsRequest {
    pub task_id: String,
    pub item_ids: Vec<String>,
}

/// Map the optional wire field onto the three-way update semantics
fn start_date_change(value: Option<&str>) -> Result<StartDateChange, AppError> {
    match value {
        None => Ok(StartDateChange::Unchanged),
        Some(raw) => Ok(match parse_start_date(raw)? {
            None => StartDateChange::Clear,
            Some(date) => StartDateChange::Set(date),
        }),
    }
}

fn task_id(raw: &str) -> Result<Uuid, AppError> {
    Ok(parse_id(raw, "task")?)
}

fn item_id(raw: &str) -> Result<Uuid, AppError> {
    Ok(parse_id(raw, "checklist item")?)
}

pub async fn create_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<CreateTaskRequest>,
) -> Result<Json<TaskResponse>, AppError> {
    let start_date = parse_start_date(request.start_date.as_deref().unwrap_or_default())?;

    let input = TaskCreateInput {
        title: request.title,
        notes: request.notes,
        tag_names: request.tag_names,
        start_date,
        checklist_items: request.checklist_items,
    };

    let task = state.tasks.create_task(user.id(), input).await?;
    Ok(Json(TaskResponse { task }))
}

pub async fn get_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<TaskIdRequest>,
) -> Result<Json<TaskResponse>, AppError> {
    let id = task_id(&request.id)?;
    let task = state.tasks.get_task(id, user.id()).await?;
    Ok(Json(TaskResponse { task }))
}

pub async fn update_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, AppError> {
    let id = task_id(&request.id)?;
    let start_date = start_date_change(request.start_date.as_deref())?;

    let input = TaskUpdateInput {
        title: request.title,
        notes: request.notes,
        tag_names: request.tag_names,
        start_date,
    };

    let task = state.tasks.update_task(id, user.id(), input).await?;
    Ok(Json(TaskResponse { task }))
}

pub async fn delete_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<TaskIdRequest>,
) -> Result<Json<Empty>, AppError> {
    let id = task_id(&request.id)?;
    state.tasks.delete_task(id, user.id()).await?;
    Ok(Json(Empty {}))
}

/// First page only; pagination tokens are rejected as unimplemented
pub async fn list_tasks(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<ListTasksRequest>,
) -> Result<Json<ListTasksResponse>, AppError> {
    reject_page_token(&request.page_token)?;

    let tag_ids = request
        .filter_tag_ids
        .iter()
        .map(|raw| parse_id(raw, "tag"))
        .collect::<Result<Vec<_>, _>>()?;

    let query = TaskListQuery {
        tag_ids,
        archive_filter: ArchiveFilter::from_flags(
            request.include_archived.unwrap_or(false),
            request.archived_only.unwrap_or(false),
        ),
        limit: clamp_page_size(request.page_size),
        offset: 0,
    };

    info!(
        user_id = %user.id(),
        limit = query.limit,
        filter = ?query.archive_filter,
        "Listing tasks"
    );

    let tasks = state.tasks.list_tasks(user.id(), &query).await?;
    Ok(Json(ListTasksResponse {
        tasks,
        next_page_token: String::new(),
    }))
}

pub async fn archive_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<TaskIdRequest>,
) -> Result<Json<TaskResponse>, AppError> {
    let id = task_id(&request.id)?;
    let task = state.tasks.archive_task(id, user.id()).await?;
    Ok(Json(TaskResponse { task }))
}

pub async fn unarchive_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<TaskIdRequest>,
) -> Result<Json<TaskResponse>, AppError> {
    let id = task_id(&request.id)?;
    let task = state.tasks.unarchive_task(id, user.id()).await?;
    Ok(Json(TaskResponse { task }))
}

pub async fn add_checklist_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<AddChecklistItemRequest>,
) -> Result<Json<ChecklistItemResponse>, AppError> {
    let id = task_id(&request.task_id)?;
    let item = state
        .tasks
        .add_checklist_item(id, user.id(), &request.content)
        .await?;
    Ok(Json(ChecklistItemResponse { item }))
}

pub async fn update_checklist_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<UpdateChecklistItemRequest>,
) -> Result<Json<ChecklistItemResponse>, AppError> {
    let id = item_id(&request.item_id)?;
    let item = state
        .tasks
        .update_checklist_item(id, user.id(), &request.content)
        .await?;
    Ok(Json(ChecklistItemResponse { item }))
}

pub async fn set_checklist_item_completed(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<SetChecklistItemCompletedRequest>,
) -> Result<Json<ChecklistItemResponse>, AppError> {
    let id = item_id(&request.item_id)?;
    let item = state
        .tasks
        .set_checklist_item_completed(id, user.id(), request.completed)
        .await?;
    Ok(Json(ChecklistItemResponse { item }))
}

pub async fn delete_checklist_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<DeleteChecklistItemRequest>,
) -> Result<Json<Empty>, AppError> {
    let id = item_id(&request.item_id)?;
    state.tasks.delete_checklist_item(id, user.id()).await?;
    Ok(Json(Empty {}))
}

pub async fn reorder_checklist_items(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<ReorderChecklistItemsRequest>,
) -> Result<Json<ChecklistItemsResponse>, AppError> {
    let id = task_id(&request.task_id)?;
    let item_ids = request
        .item_ids
        .iter()
        .map(|raw| parse_id(raw, "checklist item"))
        .collect::<Result<Vec<_>, _>>()?;

    let items = state
        .tasks
        .reorder_checklist_items(id, user.id(), &item_ids)
        .await?;
    Ok(Json(ChecklistItemsResponse { items }))
}
