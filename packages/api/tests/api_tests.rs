// ABOUTME: End-to-end tests for the RPC router
// ABOUTME: Drives the full middleware stack with oneshot requests against an in-memory database

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use slips_api::{create_router, AppState};
use slips_auth::test_utils::{access_claims, sign_token, test_verifier};
use slips_auth::DetachedTasks;
use slips_security::NewUser;
use slips_storage::test_utils::memory_pool;

async fn app_with_state() -> (Router, AppState) {
    let pool = memory_pool().await;
    let state = AppState::new(pool, test_verifier(), DetachedTasks::new());
    (create_router(state.clone(), Duration::from_secs(30)), state)
}

async fn app() -> Router {
    app_with_state().await.0
}

fn bearer(user_id: &str) -> String {
    format!("Bearer {}", sign_token(&access_claims(user_id)))
}

async fn call(app: &Router, path: &str, auth: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        request = request.header(header::AUTHORIZATION, auth);
    }
    let request = request.body(Body::from(body.to_string())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_health_needs_no_credentials() {
    let app = app().await;
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_credentials_are_rejected() {
    let app = app().await;

    let (status, body) = call(&app, "/task.v1.TaskService/ListTasks", None, json!({})).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
    assert_eq!(body["error"]["message"], "missing authorization header");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn test_refresh_token_is_rejected_as_credential() {
    let app = app().await;
    let refresh = slips_auth::Claims {
        typ: Some("refresh".to_string()),
        ..access_claims("alice")
    };
    let auth = format!("Bearer {}", sign_token(&refresh));

    let (status, body) = call(&app, "/tag.v1.TagService/ListTags", Some(&auth), json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_public_auth_operations_skip_identity() {
    let app = app().await;

    for method in ["GetAuthorizationURL", "HandleCallback", "RefreshToken"] {
        let path = format!("/auth.v1.AuthService/{}", method);
        let (status, body) = call(&app, &path, None, json!({})).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED, "{}", path);
        assert_eq!(body["error"]["code"], "UNIMPLEMENTED");
    }
}

#[tokio::test]
async fn test_start_date_round_trip_over_the_wire() {
    let app = app().await;
    let auth = bearer("alice");

    let (status, body) = call(
        &app,
        "/task.v1.TaskService/CreateTask",
        Some(&auth),
        json!({ "title": "Buy milk", "tagNames": ["errands", " errands "] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let task = &body["task"];
    assert_eq!(task["startDateKind"], "inbox");
    assert!(task.get("startDate").is_none());
    assert_eq!(task["ownerId"], "alice");
    assert_eq!(task["tagIds"].as_array().unwrap().len(), 1);
    let id = task["id"].as_str().unwrap().to_string();

    let update = |start_date: Option<&str>| {
        let mut body = json!({ "id": id, "title": "Buy milk", "tagNames": ["errands"] });
        if let Some(date) = start_date {
            body["startDate"] = json!(date);
        }
        body
    };

    let (_, body) = call(
        &app,
        "/task.v1.TaskService/UpdateTask",
        Some(&auth),
        update(Some("2025-06-01")),
    )
    .await;
    assert_eq!(body["task"]["startDateKind"], "scheduled");
    assert_eq!(body["task"]["startDate"], "2025-06-01");

    let (_, body) = call(&app, "/task.v1.TaskService/UpdateTask", Some(&auth), update(None)).await;
    assert_eq!(body["task"]["startDateKind"], "scheduled");
    assert_eq!(body["task"]["startDate"], "2025-06-01");

    let (_, body) = call(
        &app,
        "/task.v1.TaskService/UpdateTask",
        Some(&auth),
        update(Some("")),
    )
    .await;
    assert_eq!(body["task"]["startDateKind"], "inbox");
    assert!(body["task"].get("startDate").is_none());
}

#[tokio::test]
async fn test_invalid_input_is_invalid_argument() {
    let app = app().await;
    let auth = bearer("alice");

    let cases = [
        ("/task.v1.TaskService/CreateTask", json!({ "title": "   " })),
        (
            "/task.v1.TaskService/CreateTask",
            json!({ "title": "ok", "startDate": "tomorrow" }),
        ),
        ("/task.v1.TaskService/GetTask", json!({ "id": "not-a-uuid" })),
        (
            "/task.v1.TaskService/ListTasks",
            json!({ "filterTagIds": ["nope"] }),
        ),
        ("/tag.v1.TagService/CreateTag", json!({ "name": "bad\u{0007}name" })),
    ];

    for (path, body) in cases {
        let (status, response) = call(&app, path, Some(&auth), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", path);
        assert_eq!(response["error"]["code"], "INVALID_ARGUMENT");
    }
}

#[tokio::test]
async fn test_page_token_is_unimplemented() {
    let app = app().await;
    let auth = bearer("alice");

    for path in ["/task.v1.TaskService/ListTasks", "/tag.v1.TagService/ListTags"] {
        let (status, body) = call(&app, path, Some(&auth), json!({ "pageToken": "next" })).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body["error"]["message"], "page_token is not supported yet");
    }

    let (status, body) = call(
        &app,
        "/task.v1.TaskService/ListTasks",
        Some(&auth),
        json!({ "pageSize": 500 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nextPageToken"], "");
}

#[tokio::test]
async fn test_other_owners_tasks_are_not_found() {
    let app = app().await;

    let (_, body) = call(
        &app,
        "/task.v1.TaskService/CreateTask",
        Some(&bearer("alice")),
        json!({ "title": "private" }),
    )
    .await;
    let id = body["task"]["id"].clone();

    let (status, body) = call(
        &app,
        "/task.v1.TaskService/GetTask",
        Some(&bearer("bob")),
        json!({ "id": id }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_archive_filters_over_the_wire() {
    let app = app().await;
    let auth = bearer("alice");

    let (_, body) = call(
        &app,
        "/task.v1.TaskService/CreateTask",
        Some(&auth),
        json!({ "title": "old" }),
    )
    .await;
    let id = body["task"]["id"].clone();
    call(&app, "/task.v1.TaskService/CreateTask", Some(&auth), json!({ "title": "new" })).await;
    let (status, body) = call(
        &app,
        "/task.v1.TaskService/ArchiveTask",
        Some(&auth),
        json!({ "id": id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["task"]["archivedAt"].is_string());

    let count = |body: &Value| body["tasks"].as_array().unwrap().len();

    let (_, body) = call(&app, "/task.v1.TaskService/ListTasks", Some(&auth), json!({})).await;
    assert_eq!(count(&body), 1);

    let (_, body) = call(
        &app,
        "/task.v1.TaskService/ListTasks",
        Some(&auth),
        json!({ "includeArchived": true }),
    )
    .await;
    assert_eq!(count(&body), 2);

    let (_, body) = call(
        &app,
        "/task.v1.TaskService/ListTasks",
        Some(&auth),
        json!({ "includeArchived": true, "archivedOnly": true }),
    )
    .await;
    assert_eq!(count(&body), 1);
    assert_eq!(body["tasks"][0]["title"], "old");
}

#[tokio::test]
async fn test_checklist_reorder_over_the_wire() {
    let app = app().await;
    let auth = bearer("alice");

    let (_, body) = call(
        &app,
        "/task.v1.TaskService/CreateTask",
        Some(&auth),
        json!({ "title": "pack", "checklistItems": ["socks", "shirt"] }),
    )
    .await;
    let task_id = body["task"]["id"].clone();
    let items = body["task"]["checklistItems"].as_array().unwrap().clone();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["sortOrder"], 0);

    let (status, body) = call(
        &app,
        "/task.v1.TaskService/ReorderChecklistItems",
        Some(&auth),
        json!({ "taskId": task_id, "itemIds": [items[0]["id"]] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");

    let (status, body) = call(
        &app,
        "/task.v1.TaskService/ReorderChecklistItems",
        Some(&auth),
        json!({ "taskId": task_id, "itemIds": [items[1]["id"], items[0]["id"]] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["content"], "shirt");
    assert_eq!(body["items"][1]["content"], "socks");

    let (status, body) = call(
        &app,
        "/task.v1.TaskService/SetChecklistItemCompleted",
        Some(&auth),
        json!({ "itemId": items[0]["id"], "completed": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["completed"], true);
}

#[tokio::test]
async fn test_duplicate_tag_is_already_exists() {
    let app = app().await;
    let auth = bearer("alice");

    let (status, body) = call(
        &app,
        "/tag.v1.TagService/CreateTag",
        Some(&auth),
        json!({ "name": "  work  " }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tag"]["name"], "work");

    let (status, body) = call(
        &app,
        "/tag.v1.TagService/CreateTag",
        Some(&auth),
        json!({ "name": "work" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_EXISTS");

    // Same name under another owner is fine
    let (status, _) = call(
        &app,
        "/tag.v1.TagService/CreateTag",
        Some(&bearer("bob")),
        json!({ "name": "work" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_api_token_lifecycle() {
    let app = app().await;
    let alice = bearer("alice");

    let (status, body) = call(
        &app,
        "/mcptoken.v1.MCPTokenService/CreateMCPToken",
        Some(&alice),
        json!({ "name": "laptop" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let secret = body["token"]["token"].as_str().unwrap().to_string();
    let token_id = body["token"]["id"].clone();
    assert_eq!(body["token"]["isActive"], true);

    // The secret authenticates as its owner
    let mcp = format!("MCP-Token {}", secret);
    let (status, body) = call(
        &app,
        "/task.v1.TaskService/CreateTask",
        Some(&mcp),
        json!({ "title": "from agent" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["ownerId"], "alice");

    // Later reads never expose the secret
    let (_, body) = call(
        &app,
        "/mcptoken.v1.MCPTokenService/GetMCPToken",
        Some(&alice),
        json!({ "id": token_id }),
    )
    .await;
    assert_eq!(body["token"]["name"], "laptop");
    assert!(body["token"].get("token").is_none());

    let (_, body) = call(
        &app,
        "/mcptoken.v1.MCPTokenService/ListMCPTokens",
        Some(&alice),
        json!({}),
    )
    .await;
    assert_eq!(body["tokens"].as_array().unwrap().len(), 1);

    // Another user may not revoke it
    let (status, body) = call(
        &app,
        "/mcptoken.v1.MCPTokenService/RevokeMCPToken",
        Some(&bearer("bob")),
        json!({ "id": token_id }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, body) = call(
        &app,
        "/mcptoken.v1.MCPTokenService/RevokeMCPToken",
        Some(&alice),
        json!({ "id": token_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, body) = call(&app, "/tag.v1.TagService/ListTags", Some(&mcp), json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_token_with_past_expiry_is_invalid_argument() {
    let app = app().await;

    let (status, body) = call(
        &app,
        "/mcptoken.v1.MCPTokenService/CreateMCPToken",
        Some(&bearer("alice")),
        json!({ "name": "stale", "expiresAt": "2000-01-01T00:00:00Z" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_user_profile_requires_stored_user() {
    let (app, state) = app_with_state().await;
    let path = "/auth.v1.AuthService/GetUserProfile";

    let (status, body) = call(&app, path, None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

    let (status, body) = call(&app, path, Some(&bearer("alice")), json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    state
        .users
        .upsert_user(&NewUser {
            user_id: "alice".to_string(),
            username: "alice".to_string(),
            avatar_url: "https://example.com/alice.png".to_string(),
            email: "alice@example.com".to_string(),
        })
        .await
        .unwrap();

    let (status, body) = call(&app, path, Some(&bearer("alice")), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "userInfo": {
                "userId": "alice",
                "username": "alice",
                "avatarUrl": "https://example.com/alice.png"
            }
        })
    );

    // Another caller never sees alice's profile
    let (status, _) = call(&app, path, Some(&bearer("bob")), json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
