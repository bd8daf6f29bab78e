//! Shared helpers for the router integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use serde_json::Value;
use tempfile::NamedTempFile;
use tower::ServiceExt;
use webhook_dispatcher::web::sign_payload;
use webhook_dispatcher::{create_router, AppState, Config};
use wiremock::MockServer;

pub const PUSH_BODY: &str = r#"{"ref":"refs/heads/main","commits":[],"repository":{"name":"widgets","full_name":"acme/widgets","owner":{"login":"acme"}}}"#;

pub const GHOST_BODY: &str = r#"{"ref":"refs/heads/main","repository":{"name":"town","full_name":"ghost/town","owner":{"login":"ghost"}}}"#;

/// Write `content` to a temporary route file with the given suffix.
pub fn route_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

pub fn app(route_file: &Path, secret: Option<&str>) -> axum::Router {
    let mut config = Config::with_route_file(route_file);
    config.webhook_secret = secret.map(str::to_string);
    config.forward_timeout_ms = 5_000;
    create_router(AppState::new(config).unwrap())
}

/// Build a `POST /` request, signing the body when a secret is given.
pub fn webhook_request(event: Option<&str>, body: &str, secret: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .header("x-github-delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958");

    if let Some(event) = event {
        builder = builder.header("x-github-event", event);
    }

    if let Some(secret) = secret {
        builder = builder.header("x-hub-signature-256", sign_payload(secret, body.as_bytes()).unwrap());
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(app: axum::Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// Wait until the mock server has seen `count` requests, or time out.
pub async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<wiremock::Request> {
    for _ in 0..100 {
        let received = server.received_requests().await.unwrap_or_default();
        if received.len() >= count {
            return received;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    server.received_requests().await.unwrap_or_default()
}

/// Give a detached forward time to happen, then return what arrived.
pub async fn settle(server: &MockServer) -> Vec<wiremock::Request> {
    tokio::time::sleep(Duration::from_millis(200)).await;
    server.received_requests().await.unwrap_or_default()
}
