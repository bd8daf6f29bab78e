//! HTTP endpoint handlers.
//!
//! The webhook handler answers as soon as the dispatch decision is made;
//! forwarding to the downstream target continues in the background.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::dispatch::dispatch;
use crate::forward::Forwarder;
use crate::routes::load_route_table;
use crate::Config;

/// OpenAPI description served at `/openapi.json`.
const OPENAPI_YAML: &str = include_str!("../../openapi.yaml");

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub forwarder: Forwarder,
}

impl AppState {
    pub fn new(config: Config) -> reqwest::Result<Self> {
        let forwarder = Forwarder::new(config.forward_timeout(), config.debug)?;

        Ok(Self {
            config: Arc::new(config),
            forwarder,
        })
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "alive" })
}

// =============================================================================
// GitHub Webhook
// =============================================================================

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// GitHub webhook endpoint.
///
/// This endpoint:
/// 1. Verifies the HMAC signature (if a secret is configured)
/// 2. Resolves the route for the repository and filters by event type
/// 3. Starts forwarding the raw payload and returns 200 OK
pub async fn github_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match dispatch(&state, &headers, body).await {
        Ok(outcome) => {
            info!(outcome = outcome.label(), "webhook_handled");
            (
                StatusCode::OK,
                Json(WebhookResponse {
                    status: outcome.label(),
                    message: None,
                }),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

// =============================================================================
// Route Listing
// =============================================================================

/// Query parameters for the route listing.
#[derive(Debug, Default, Deserialize)]
pub struct RoutesQuery {
    pub format: Option<String>,
}

/// List every configured route.
///
/// `?format=json` returns a JSON array; anything else a plain-text listing
/// with one `owner[/repo] -> target` line per route.
pub async fn list_routes(
    State(state): State<AppState>,
    Query(query): Query<RoutesQuery>,
) -> Response {
    let table = match load_route_table(&state.config.route_file).await {
        Ok(table) => table,
        Err(e) => {
            error!(error = %e, "route_listing_failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error listing routes").into_response();
        }
    };

    let listings = table.listings();
    info!(route_count = listings.len(), "route_listing");

    if query.format.as_deref() == Some("json") {
        return Json(listings).into_response();
    }

    let body = listings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");

    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

// =============================================================================
// OpenAPI
// =============================================================================

/// Serve the bundled OpenAPI description as JSON.
pub async fn openapi() -> Response {
    match serde_yaml::from_str::<Value>(OPENAPI_YAML) {
        Ok(spec) => Json(spec).into_response(),
        Err(e) => {
            error!(error = %e, "openapi_parse_failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error generating OpenAPI document").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_openapi_is_valid() {
        let spec: Value = serde_yaml::from_str(OPENAPI_YAML).unwrap();

        assert!(spec["openapi"].as_str().unwrap().starts_with("3."));
        for path in ["/", "/routes", "/openapi.json", "/health"] {
            assert!(spec["paths"].get(path).is_some(), "{path}");
        }
    }

    #[test]
    fn test_webhook_response_omits_empty_message() {
        let json = serde_json::to_string(&WebhookResponse {
            status: "forwarded",
            message: None,
        })
        .unwrap();

        assert_eq!(json, r#"{"status":"forwarded"}"#);
    }
}
