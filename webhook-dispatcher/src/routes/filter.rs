//! Event type filtering.

use super::types::Route;

/// Whether `event_type` may be forwarded under `route`.
///
/// Routes without an `events` list forward everything; an empty list
/// forwards nothing.
pub fn is_event_allowed(event_type: &str, route: &Route) -> bool {
    match &route.events {
        None => true,
        Some(events) => events.iter().any(|e| e == event_type),
    }
}
