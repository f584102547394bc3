// ABOUTME: RPC handlers for mcptoken.v1.MCPTokenService
// ABOUTME: Token management for the authenticated user; the secret is only returned on create

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use slips_core::parse_id;
use slips_security::ApiToken;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::rpc::{Empty, Rpc};
use crate::state::AppState;

/// Freshly created token including its plaintext value
#[derive(Debug, Serialize)]
pub struct CreatedToken {
    #[serde(flatten)]
    pub record: ApiToken,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct CreateTokenResponse {
    pub token: CreatedToken,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: ApiToken,
}

#[derive(Debug, Serialize)]
pub struct ListTokensResponse {
    pub tokens: Vec<ApiToken>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTokenRequest {
    pub name: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenIdRequest {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTokensRequest {}

fn token_id(raw: &str) -> Result<Uuid, AppError> {
    Ok(parse_id(raw, "token")?)
}

pub async fn create_token(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<CreateTokenRequest>,
) -> Result<Json<CreateTokenResponse>, AppError> {
    let generated = state
        .tokens
        .create_token(user.id(), &request.name, request.expires_at)
        .await?;

    info!(user_id = %user.id(), token_id = %generated.record.id, "Issued MCP token");

    Ok(Json(CreateTokenResponse {
        token: CreatedToken {
            record: generated.record,
            token: generated.token,
        },
    }))
}

pub async fn get_token(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<TokenIdRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let id = token_id(&request.id)?;
    let token = state.tokens.get_token(id, user.id()).await?;
    Ok(Json(TokenResponse { token }))
}

pub async fn list_tokens(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(_request): Rpc<ListTokensRequest>,
) -> Result<Json<ListTokensResponse>, AppError> {
    let tokens = state.tokens.list_tokens(user.id()).await?;
    Ok(Json(ListTokensResponse { tokens }))
}

pub async fn revoke_token(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<TokenIdRequest>,
) -> Result<Json<Empty>, AppError> {
    let id = token_id(&request.id)?;
    state.tokens.revoke_token(id, user.id()).await?;
    Ok(Json(Empty {}))
}

pub async fn delete_token(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(request): Rpc<TokenIdRequest>,
) -> Result<Json<Empty>, AppError> {
    let id = token_id(&request.id)?;
    state.tokens.delete_token(id, user.id()).await?;
    Ok(Json(Empty {}))
}
