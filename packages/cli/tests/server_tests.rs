// ABOUTME: Startup tests for signing-key loading
// ABOUTME: Serves JWKS documents locally and checks which ones the server accepts

use std::collections::HashMap;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use slips_auth::test_utils::{access_claims, sign_token, test_jwks};
use slips_cli::{server::load_verifier, Config};

async fn serve_jwks(body: Value) -> String {
    let app = Router::new().route(
        "/jwks.json",
        get(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/jwks.json", addr)
}

fn config(jwks_url: &str) -> Config {
    let vars = HashMap::from([("SLIPS_JWKS_URL".to_string(), jwks_url.to_string())]);
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

#[tokio::test]
async fn test_load_verifier_accepts_provider_keys() {
    let url = serve_jwks(serde_json::to_value(test_jwks()).unwrap()).await;

    let verifier = load_verifier(&config(&url)).await.unwrap();
    let claims = verifier.verify(&sign_token(&access_claims("alice"))).unwrap();
    assert_eq!(claims.user_id().unwrap(), "alice");
}

#[tokio::test]
async fn test_load_verifier_rejects_empty_key_set() {
    let url = serve_jwks(json!({ "keys": [] })).await;

    let err = load_verifier(&config(&url)).await.unwrap_err();
    assert!(err.to_string().contains("no usable RSA signing keys"));
}

#[tokio::test]
async fn test_load_verifier_fails_when_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/jwks.json", listener.local_addr().unwrap());
    drop(listener);

    assert!(load_verifier(&config(&url)).await.is_err());
}
