// ABOUTME: auth.v1.AuthService operations and the health check
// ABOUTME: Sign-in is served by the identity provider; the caller's stored profile is served here

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use slips_security::User;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::rpc::Rpc;
use crate::state::AppState;

const DELEGATED: &str = "authentication is handled by the identity provider";

pub async fn get_authorization_url() -> Result<Json<Value>, AppError> {
    Err(AppError::unimplemented(DELEGATED))
}

pub async fn handle_callback() -> Result<Json<Value>, AppError> {
    Err(AppError::unimplemented(DELEGATED))
}

pub async fn refresh_token() -> Result<Json<Value>, AppError> {
    Err(AppError::unimplemented(DELEGATED))
}

#[derive(Debug, Default, Deserialize)]
pub struct GetUserProfileRequest {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            avatar_url: user.avatar_url,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileResponse {
    pub user_info: UserInfo,
}

/// The caller's profile as last reported by the identity provider
pub async fn get_user_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Rpc(_request): Rpc<GetUserProfileRequest>,
) -> Result<Json<UserProfileResponse>, AppError> {
    debug!("Fetching profile for user: {}", user.id());

    let profile = state.users.get_user(user.id()).await?;
    Ok(Json(UserProfileResponse {
        user_info: profile.into(),
    }))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().timestamp(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "slips"
    }))
}
