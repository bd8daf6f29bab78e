//! Route resolution by owner and repository.

use tracing::info;

use super::types::{Route, RouteTable};

/// Find the route for `owner/repo`.
///
/// A repository route wins over the owner route. Names are matched exactly,
/// case-sensitive.
pub fn resolve<'a>(table: &'a RouteTable, owner: &str, repo: &str) -> Option<&'a Route> {
    let entry = table.owner(owner)?;

    if let Some(route) = entry.repos.get(repo) {
        info!(owner = %owner, repo = %repo, target_url = %route.target, "route_repo_match");
        return Some(route);
    }

    if let Some(route) = &entry.route {
        info!(owner = %owner, repo = %repo, target_url = %route.target, "route_owner_match");
        return Some(route);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        let mut table = RouteTable::new();
        table.insert_owner("acme", Route::new("https://sink.example/acme"));
        table.insert_repo("acme", "widgets", Route::with_events("https://sink.example/a", ["release"]));
        table.insert_repo("solo", "only", Route::new("https://sink.example/solo"));
        table
    }

    #[test]
    fn test_repo_route_takes_precedence() {
        let table = table();

        let route = resolve(&table, "acme", "widgets").unwrap();

        assert_eq!(route.target, "https://sink.example/a");
        assert_eq!(route.events, Some(vec!["release".to_string()]));
    }

    #[test]
    fn test_owner_route_fallback() {
        let table = table();

        let route = resolve(&table, "acme", "gadgets").unwrap();

        assert_eq!(route, &Route::new("https://sink.example/acme"));
    }

    #[test]
    fn test_no_owner_route_and_no_repo_match() {
        let table = table();
        assert!(resolve(&table, "solo", "other").is_none());
    }

    #[test]
    fn test_unknown_owner() {
        let table = table();
        assert!(resolve(&table, "ghost", "town").is_none());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let table = table();
        assert!(resolve(&table, "Acme", "widgets").is_none());
        assert_eq!(resolve(&table, "acme", "Widgets").unwrap().target, "https://sink.example/acme");
    }
}
