//! Route table module.
//!
//! This module provides:
//! - Route table types shared by every route file format
//! - Loading of TOML, JSON and YAML route files
//! - Owner/repository resolution and event filtering
//!
//! ## Resolution
//!
//! ```text
//! route file → load_route_table() → resolve(owner, repo) → is_event_allowed(event)
//! ```

pub mod filter;
pub mod loader;
pub mod resolver;
pub mod types;

pub use filter::is_event_allowed;
pub use loader::{load_route_table, parse_route_table, RouteFileError, RouteFormat};
pub use resolver::resolve;
pub use types::{OwnerEntry, Route, RouteListing, RouteTable};
