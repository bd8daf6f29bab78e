//! Per-request webhook dispatch.
//!
//! ## Processing Flow
//!
//! ```text
//! verify signature → extract event → load routes → resolve → filter → forward
//! ```
//!
//! Every stage can end the request early. Unrouted and filtered events still
//! answer 200 so GitHub does not disable the hook or retry.

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::routes::{is_event_allowed, load_route_table, resolve, RouteFileError};
use crate::web::signature::{
    is_signature_verification_enabled, verify_github_signature, SignatureError, SIGNATURE_HEADER,
};
use crate::web::{AppState, WebhookResponse};

/// Header carrying the event type.
pub const EVENT_HEADER: &str = "X-GitHub-Event";

/// Header carrying GitHub's unique delivery id, used for log correlation only.
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

/// Reasons a webhook is rejected or cannot be processed.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("X-GitHub-Event header missing")]
    MissingEventType,

    #[error("request body is not valid JSON: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    #[error("payload missing repository.owner.login or repository.name")]
    MissingRepository,

    #[error(transparent)]
    RouteFile(#[from] RouteFileError),
}

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Signature(_) | Self::SignatureMismatch => StatusCode::UNAUTHORIZED,
            Self::MissingEventType | Self::InvalidPayload(_) | Self::MissingRepository => {
                StatusCode::BAD_REQUEST
            }
            Self::RouteFile(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (label, message) = match &self {
            Self::Signature(_) | Self::SignatureMismatch => ("unauthorized", None),
            Self::MissingEventType | Self::InvalidPayload(_) | Self::MissingRepository => {
                ("bad_request", Some(self.to_string()))
            }
            Self::RouteFile(e) => {
                // Parser and filesystem details stay in the log.
                error!(error = %e, "webhook_dispatch_failed");
                ("error", None)
            }
        };

        (
            status,
            Json(WebhookResponse {
                status: label,
                message,
            }),
        )
            .into_response()
    }
}

/// What happened to an accepted webhook.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// No route for the repository or its owner.
    NoRoute,
    /// A route matched but does not accept this event type.
    Filtered { target: String },
    /// The payload is being delivered on a detached task.
    Forwarded {
        target: String,
        delivery: JoinHandle<bool>,
    },
}

impl DispatchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoRoute => "no_route",
            Self::Filtered { .. } => "filtered",
            Self::Forwarded { .. } => "forwarded",
        }
    }
}

/// A webhook after authentication, reduced to what routing needs.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub event_type: String,
    pub owner_login: String,
    pub repo_name: String,
    pub raw_body: Bytes,
}

impl InboundEvent {
    /// Extract the event type header and repository identity.
    pub fn from_request(headers: &HeaderMap, body: Bytes) -> Result<Self, DispatchError> {
        let event_type = header_str(headers, EVENT_HEADER)
            .filter(|v| !v.is_empty())
            .ok_or(DispatchError::MissingEventType)?
            .to_string();

        let payload: Value = serde_json::from_slice(&body).map_err(DispatchError::InvalidPayload)?;

        let repository = payload.get("repository");
        let owner_login = repository
            .and_then(|r| r.get("owner"))
            .and_then(|o| o.get("login"))
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty());
        let repo_name = repository
            .and_then(|r| r.get("name"))
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty());

        let (owner_login, repo_name) = match (owner_login, repo_name) {
            (Some(owner), Some(repo)) => (owner.to_string(), repo.to_string()),
            _ => return Err(DispatchError::MissingRepository),
        };

        let action = payload.get("action").and_then(Value::as_str);
        let git_ref = payload.get("ref").and_then(Value::as_str);
        let pull_request = payload
            .get("pull_request")
            .and_then(|p| p.get("number"))
            .and_then(Value::as_u64);

        info!(
            event_type = %event_type,
            repository = %format!("{}/{}", owner_login, repo_name),
            action,
            git_ref,
            pull_request,
            "webhook_event_received"
        );

        Ok(Self {
            event_type,
            owner_login,
            repo_name,
            raw_body: body,
        })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Check the request signature when a secret is configured.
fn authenticate(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), DispatchError> {
    let secret = match &state.config.webhook_secret {
        Some(secret) if is_signature_verification_enabled(&state.config.webhook_secret) => secret,
        _ => return Ok(()),
    };

    // A header that is not valid UTF-8 cannot carry a `sha256=` prefix.
    let signature = headers
        .get(SIGNATURE_HEADER)
        .map(|v| v.to_str().unwrap_or_default());

    match verify_github_signature(secret, body, signature) {
        Ok(true) => Ok(()),
        Ok(false) => Err(DispatchError::SignatureMismatch),
        Err(e) => Err(e.into()),
    }
}

/// Run one webhook through the pipeline.
pub async fn dispatch(
    state: &AppState,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<DispatchOutcome, DispatchError> {
    let delivery_id = header_str(headers, DELIVERY_HEADER).unwrap_or("unknown");

    if let Err(e) = authenticate(state, headers, &body) {
        warn!(delivery_id = %delivery_id, error = %e, "webhook_authentication_failed");
        return Err(e);
    }

    let event = InboundEvent::from_request(headers, body).map_err(|e| {
        warn!(delivery_id = %delivery_id, error = %e, "webhook_invalid_request");
        e
    })?;

    let table = load_route_table(&state.config.route_file).await?;

    let Some(route) = resolve(&table, &event.owner_login, &event.repo_name) else {
        info!(
            delivery_id = %delivery_id,
            owner = %event.owner_login,
            repo = %event.repo_name,
            "webhook_no_route"
        );
        return Ok(DispatchOutcome::NoRoute);
    };

    if !is_event_allowed(&event.event_type, route) {
        info!(
            delivery_id = %delivery_id,
            event_type = %event.event_type,
            owner = %event.owner_login,
            repo = %event.repo_name,
            allowed_events = ?route.events,
            "webhook_event_filtered"
        );
        return Ok(DispatchOutcome::Filtered {
            target: route.target.clone(),
        });
    }

    info!(
        delivery_id = %delivery_id,
        event_type = %event.event_type,
        target_url = %route.target,
        "webhook_forwarding"
    );

    let delivery = state.forwarder.forward(&route.target, event.raw_body);

    Ok(DispatchOutcome::Forwarded {
        target: route.target.clone(),
        delivery,
    })
}
