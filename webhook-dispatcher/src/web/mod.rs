//! Web server module for handling inbound webhooks.
//!
//! This module provides the HTTP surface:
//! - `POST /` receives GitHub webhooks
//! - `GET /routes` lists the configured routes
//! - `GET /openapi.json` serves the API description
//! - `/health` answers liveness probes

pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    github_webhook, health, list_routes, openapi, AppState, HealthResponse, RoutesQuery,
    WebhookResponse,
};
pub use signature::{
    is_signature_verification_enabled, sign_payload, verify_github_signature, SignatureError,
};

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(github_webhook))
        .route("/routes", get(list_routes))
        .route("/openapi.json", get(openapi))
        .route("/health", get(health).post(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
