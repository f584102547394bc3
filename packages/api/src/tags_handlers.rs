// ABOUTME: RPC handlers for tag.v1.TagService
// ABOUTME: Normalizes tag names at the boundary before they reach tag storage

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use slips_core::{clamp_page_size, normalize_tag_name, parse_id};
use slips_tags::{Tag, TagCreateInput, TagUpdateInput};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::rpc::{reject_page_token, Empty, Rpc};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub tag: Tag,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTagsResponse {
    pub tags: Vec<Tag>,
    pub next_page_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateTagRequest {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TagIdRequest {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateTagRequest {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListTagsRequest {
    pub page_size: i64,
    pub page_token: String,
}

pub async fn create_tag(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<CreateTagRequest>,
) -> Result<Json<TagResponse>, AppError> {
    let name = normalize_tag_name(&request.name)?;
    let tag = state
        .tags
        .create_tag(TagCreateInput { name }, user.id())
        .await?;
    Ok(Json(TagResponse { tag }))
}

pub async fn get_tag(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<TagIdRequest>,
) -> Result<Json<TagResponse>, AppError> {
    let id = parse_id(&request.id, "tag")?;
    let tag = state.tags.get_tag(id, user.id()).await?;
    Ok(Json(TagResponse { tag }))
}

pub async fn update_tag(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<UpdateTagRequest>,
) -> Result<Json<TagResponse>, AppError> {
    let id = parse_id(&request.id, "tag")?;
    let name = normalize_tag_name(&request.name)?;
    let tag = state
        .tags
        .update_tag(id, user.id(), TagUpdateInput { name })
        .await?;
    Ok(Json(TagResponse { tag }))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<TagIdRequest>,
) -> Result<Json<Empty>, AppError> {
    let id = parse_id(&request.id, "tag")?;
    state.tags.delete_tag(id, user.id()).await?;
    Ok(Json(Empty {}))
}

pub async fn list_tags(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<ListTagsRequest>,
) -> Result<Json<ListTagsResponse>, AppError> {
    reject_page_token(&request.page_token)?;

    let tags = state
        .tags
        .list_tags(user.id(), clamp_page_size(request.page_size), 0)
        .await?;
    Ok(Json(ListTagsResponse {
        tags,
        next_page_token: String::new(),
    }))
}
