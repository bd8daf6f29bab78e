//! GitHub webhook dispatcher.
//!
//! Receives GitHub webhooks, authenticates them against a shared secret,
//! resolves a downstream target from a route file keyed by owner and
//! repository, filters by event type, and forwards the raw payload.
//!
//! ## Architecture
//!
//! ```text
//! GitHub → POST / → verify → resolve → filter → Forwarder → downstream service
//!                              ↑
//!                  route file (TOML / JSON / YAML, re-read per request)
//! ```

pub mod config;
pub mod dispatch;
pub mod forward;
pub mod routes;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use dispatch::{dispatch, DispatchError, DispatchOutcome, InboundEvent};
pub use forward::Forwarder;
pub use routes::{Route, RouteTable};
pub use web::{create_router, AppState};
