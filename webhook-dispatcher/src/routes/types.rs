//! In-memory route table types.
//!
//! Every route file format is parsed into a `serde_json::Value` first and then
//! normalized here, so the resolver only ever sees one shape.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Key carrying the destination URL at owner or repository level.
pub const TARGET_KEY: &str = "target";

/// Key carrying the optional event allow-list.
pub const EVENTS_KEY: &str = "events";

/// Where to forward events, and optionally which event types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Destination URL
    pub target: String,
    /// Allowed event types. `None` allows every event type.
    pub events: Option<Vec<String>>,
}

impl Route {
    /// Route forwarding every event type to `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            events: None,
        }
    }

    /// Route restricted to the listed event types.
    pub fn with_events<I, S>(target: impl Into<String>, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: target.into(),
            events: Some(events.into_iter().map(Into::into).collect()),
        }
    }

    /// Build a route from a `{target, events?}` mapping.
    ///
    /// Returns `None` when `target` is missing, not a string, or empty.
    fn from_map(map: &Map<String, Value>) -> Option<Self> {
        let target = map
            .get(TARGET_KEY)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())?;

        Some(Self {
            target: target.to_string(),
            events: map.get(EVENTS_KEY).and_then(event_list),
        })
    }
}

/// Any list restricts a route. Only its string items can match an event.
fn event_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

/// Routes configured for a single owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerEntry {
    /// Owner-level default route
    pub route: Option<Route>,
    /// Repository-level routes, each fully overriding `route`
    pub repos: BTreeMap<String, Route>,
}

impl OwnerEntry {
    fn from_map(owner: &str, map: &Map<String, Value>) -> Self {
        let mut repos = BTreeMap::new();

        for (key, value) in map {
            if key == TARGET_KEY || key == EVENTS_KEY {
                continue;
            }

            match value.as_object().and_then(Route::from_map) {
                Some(route) => {
                    repos.insert(key.clone(), route);
                }
                None => {
                    debug!(owner = %owner, repo = %key, "route_entry_without_target_skipped");
                }
            }
        }

        Self {
            route: Route::from_map(map),
            repos,
        }
    }
}

/// Owner login to owner entry mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    owners: BTreeMap<String, OwnerEntry>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a parsed route document.
    ///
    /// `Null` becomes an empty table; any other non-mapping value is rejected
    /// with `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = match value {
            Value::Null => return Some(Self::new()),
            Value::Object(map) => map,
            _ => return None,
        };

        let mut owners = BTreeMap::new();
        for (owner, entry) in map {
            match entry.as_object() {
                Some(entry) => {
                    owners.insert(owner.clone(), OwnerEntry::from_map(owner, entry));
                }
                None => {
                    debug!(owner = %owner, "route_owner_not_a_mapping_skipped");
                }
            }
        }

        Some(Self { owners })
    }

    /// Set the owner-level route.
    pub fn insert_owner(&mut self, owner: impl Into<String>, route: Route) {
        self.owners.entry(owner.into()).or_default().route = Some(route);
    }

    /// Set a repository-level route.
    pub fn insert_repo(&mut self, owner: impl Into<String>, repo: impl Into<String>, route: Route) {
        self.owners
            .entry(owner.into())
            .or_default()
            .repos
            .insert(repo.into(), route);
    }

    pub fn owner(&self, owner: &str) -> Option<&OwnerEntry> {
        self.owners.get(owner)
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Flatten into one listing per configured route.
    ///
    /// Owners are sorted; within an owner the owner route comes first,
    /// followed by its repositories in name order.
    pub fn listings(&self) -> Vec<RouteListing> {
        let mut listings = Vec::new();

        for (owner, entry) in &self.owners {
            if let Some(route) = &entry.route {
                listings.push(RouteListing {
                    owner: owner.clone(),
                    repo: None,
                    target: route.target.clone(),
                });
            }

            for (repo, route) in &entry.repos {
                listings.push(RouteListing {
                    owner: owner.clone(),
                    repo: Some(repo.clone()),
                    target: route.target.clone(),
                });
            }
        }

        listings
    }
}

/// One row of the `GET /routes` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteListing {
    pub owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    pub target: String,
}

impl std::fmt::Display for RouteListing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.repo {
            Some(repo) => write!(f, "{}/{} -> {}", self.owner, repo, self.target),
            None => write!(f, "{} -> {}", self.owner, self.target),
        }
    }
}
