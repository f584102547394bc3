// ABOUTME: RPC-over-HTTP API layer for Slips providing routing and middleware
// ABOUTME: Integration layer that depends on all domain packages

use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    http::{header, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod auth;
pub mod auth_handlers;
pub mod error;
pub mod middleware;
pub mod rpc;
pub mod state;
pub mod tags_handlers;
pub mod tasks_handlers;
pub mod tokens_handlers;

pub use error::AppError;
pub use state::AppState;

/// Routes for task.v1.TaskService
fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/task.v1.TaskService/CreateTask", post(tasks_handlers::create_task))
        .route("/task.v1.TaskService/GetTask", post(tasks_handlers::get_task))
        .route("/task.v1.TaskService/UpdateTask", post(tasks_handlers::update_task))
        .route("/task.v1.TaskService/DeleteTask", post(tasks_handlers::delete_task))
        .route("/task.v1.TaskService/ListTasks", post(tasks_handlers::list_tasks))
        .route("/task.v1.TaskService/ArchiveTask", post(tasks_handlers::archive_task))
        .route(
            "/task.v1.TaskService/UnarchiveTask",
            post(tasks_handlers::unarchive_task),
        )
        .route(
            "/task.v1.TaskService/AddChecklistItem",
            post(tasks_handlers::add_checklist_item),
        )
        .route(
            "/task.v1.TaskService/UpdateChecklistItem",
            post(tasks_handlers::update_checklist_item),
        )
        .route(
            "/task.v1.TaskService/SetChecklistItemCompleted",
            post(tasks_handlers::set_checklist_item_completed),
        )
        .route(
            "/task.v1.TaskService/DeleteChecklistItem",
            post(tasks_handlers::delete_checklist_item),
        )
        .route(
            "/task.v1.TaskService/ReorderChecklistItems",
            post(tasks_handlers::reorder_checklist_items),
        )
}

/// Routes for tag.v1.TagService
fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/tag.v1.TagService/CreateTag", post(tags_handlers::create_tag))
        .route("/tag.v1.TagService/GetTag", post(tags_handlers::get_tag))
        .route("/tag.v1.TagService/UpdateTag", post(tags_handlers::update_tag))
        .route("/tag.v1.TagService/DeleteTag", post(tags_handlers::delete_tag))
        .route("/tag.v1.TagService/ListTags", post(tags_handlers::list_tags))
}

/// Routes for mcptoken.v1.MCPTokenService
fn token_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/mcptoken.v1.MCPTokenService/CreateMCPToken",
            post(tokens_handlers::create_token),
        )
        .route(
            "/mcptoken.v1.MCPTokenService/GetMCPToken",
            post(tokens_handlers::get_token),
        )
        .route(
            "/mcptoken.v1.MCPTokenService/ListMCPTokens",
            post(tokens_handlers::list_tokens),
        )
        .route(
            "/mcptoken.v1.MCPTokenService/RevokeMCPToken",
            post(tokens_handlers::revoke_token),
        )
        .route(
            "/mcptoken.v1.MCPTokenService/DeleteMCPToken",
            post(tokens_handlers::delete_token),
        )
}

/// Routes for auth.v1.AuthService; all but GetUserProfile are public
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/auth.v1.AuthService/GetAuthorizationURL",
            post(auth_handlers::get_authorization_url),
        )
        .route(
            "/auth.v1.AuthService/HandleCallback",
            post(auth_handlers::handle_callback),
        )
        .route(
            "/auth.v1.AuthService/RefreshToken",
            post(auth_handlers::refresh_token),
        )
        .route(
            "/auth.v1.AuthService/GetUserProfile",
            post(auth_handlers::get_user_profile),
        )
}

/// Build the full application router.
///
/// Every RPC route passes through identity resolution; `/health` does not.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let rpc = Router::new()
        .merge(task_routes())
        .merge(tag_routes())
        .merge(token_routes())
        .merge(auth_routes())
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::identity_middleware,
        ))
        .with_state(state);

    let router = Router::new()
        .route("/health", get(auth_handlers::health_check))
        .merge(rpc);
    with_middleware(router, request_timeout)
}

/// Wrap `router` in the shared middleware stack.
/// A request that outlives `request_timeout` gets a DEADLINE_EXCEEDED error body.
fn with_middleware(router: Router, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(middleware::create_panic_handler())
            .layer(HandleErrorLayer::new(middleware::handle_timeout))
            .layer(TimeoutLayer::new(request_timeout))
            .layer(cors),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_slow_request_gets_error_envelope() {
        let router = Router::new().route(
            "/slow",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "done"
            }),
        );
        let app = with_middleware(router, Duration::from_millis(20));

        let request = Request::builder()
            .method("POST")
            .uri("/slow")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "DEADLINE_EXCEEDED");
        assert!(body["request_id"].is_string());
    }
}
