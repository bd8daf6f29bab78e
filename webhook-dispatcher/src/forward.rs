//! Outbound forwarding of webhook payloads.
//!
//! Each accepted webhook produces exactly one POST to its target. The request
//! runs on a detached task so the inbound response never waits on it; the
//! outcome is only logged.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use url::Url;

/// Shared HTTP client for forwarding payloads.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct Forwarder {
    client: Client,
    timeout: Duration,
    debug: bool,
}

impl Forwarder {
    /// Create a forwarder with the given per-request timeout.
    pub fn new(timeout: Duration, debug: bool) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("webhook-dispatcher/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            timeout,
            debug,
        })
    }

    /// Launch the forward on a detached task.
    ///
    /// Dropping the returned handle does not cancel the delivery.
    pub fn forward(&self, target: &str, body: Bytes) -> JoinHandle<bool> {
        let forwarder = self.clone();
        let target = target.to_string();

        tokio::spawn(async move { forwarder.send(&target, body).await })
    }

    /// POST `body` to `target` once and return whether it was accepted (2xx).
    pub async fn send(&self, target: &str, body: Bytes) -> bool {
        let url = match Url::parse(target) {
            Ok(url) => url,
            Err(e) => {
                error!(target_url = %target, error = %e, "forward_invalid_target");
                return false;
            }
        };

        let body_length = body.len();
        info!(target_url = %url, body_length = body_length, "forward_starting");

        let request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        match request.send().await {
            Ok(resp) => {
                let status = resp.status();
                let is_success = status.is_success();

                info!(
                    target_url = %url,
                    status_code = status.as_u16(),
                    is_success = is_success,
                    "forward_complete"
                );

                if self.debug {
                    match resp.text().await {
                        Ok(text) => debug!(
                            target_url = %url,
                            status_code = status.as_u16(),
                            response_length = text.len(),
                            response_body = %text,
                            "forward_response"
                        ),
                        Err(e) => debug!(target_url = %url, error = %e, "forward_response_unreadable"),
                    }
                }

                is_success
            }
            Err(e) => {
                if e.is_timeout() {
                    error!(
                        target_url = %url,
                        timeout_seconds = self.timeout.as_secs_f64(),
                        error = %e,
                        "forward_timeout"
                    );
                } else if e.is_connect() {
                    error!(target_url = %url, error = %e, "forward_connect_error");
                } else {
                    error!(target_url = %url, error = %e, "forward_error");
                }
                false
            }
        }
    }
}
