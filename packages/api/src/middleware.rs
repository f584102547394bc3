// ABOUTME: Request middleware: identity resolution, panic recovery, and deadline handling
// ABOUTME: Every RPC passes through the resolver; panics and timeouts keep the JSON error shape

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    BoxError, Json,
};
use serde_json::json;
use tower::timeout::error::Elapsed;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Resolve the caller and attach the [`slips_auth::Identity`] to the request.
/// Public operations pass through without one.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let operation = request.uri().path().to_string();
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let identity = state
        .resolver
        .resolve(&operation, authorization.as_deref())
        .await?;
    if let Some(identity) = identity {
        request.extensions_mut().insert(identity);
    }

    Ok(next.run(request).await)
}

/// Turn a failure from the timeout layer into an error response
pub async fn handle_timeout(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        warn!("Request exceeded its deadline");
        AppError::DeadlineExceeded
    } else {
        AppError::Internal(anyhow::anyhow!("unhandled middleware error: {}", err))
    }
}

/// Create a panic handler that returns consistent error responses
pub fn create_panic_handler(
) -> CatchPanicLayer<fn(Box<dyn std::any::Any + Send + 'static>) -> Response> {
    CatchPanicLayer::custom(handle_panic)
}

fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let request_id = Uuid::new_v4().to_string();

    let panic_message = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic occurred"
    };

    error!(
        request_id = %request_id,
        panic_message = %panic_message,
        "Server panic occurred"
    );

    let body = json!({
        "success": false,
        "error": {
            "code": "INTERNAL",
            "message": "An internal server error occurred"
        },
        "request_id": request_id
    });

    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
