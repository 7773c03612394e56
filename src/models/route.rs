//! Hash-based routing.
//!
//! URL format: `#/path?query` (e.g. `#/clients/42?tab=notes`).

use navstack_core::RouteKey;

use crate::utils::dom;

/// The current hash location, split into path and query string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    /// Always starts with `/`.
    pub path: String,
    /// Empty or starts with `?`.
    pub search: String,
}

impl Location {
    /// Parse a URL hash (with or without the leading `#`).
    pub fn from_hash(hash: &str) -> Self {
        let raw = hash.trim_start_matches('#');
        let (path, search) = match raw.split_once('?') {
            Some((path, query)) if !query.is_empty() => (path, format!("?{}", query)),
            Some((path, _)) => (path, String::new()),
            None => (raw, String::new()),
        };
        let path = format!("/{}", path.trim_matches('/'));
        Self { path, search }
    }

    pub fn to_hash(&self) -> String {
        format!("#{}{}", self.path, self.search)
    }

    /// Key under which the scroll offset of this location is stored.
    pub fn route_key(&self) -> RouteKey {
        RouteKey::new(&self.path, &self.search)
    }

    /// Get current location from browser URL.
    pub fn current() -> Self {
        let hash = dom::window()
            .and_then(|w| w.location().hash().ok())
            .unwrap_or_default();
        Self::from_hash(&hash)
    }

    /// Navigate here, adding a history entry.
    pub fn push(&self) {
        if let Some(window) = dom::window() {
            let _ = window.location().set_hash(&self.to_hash());
        }
    }

    /// Navigate here, replacing the current history entry.
    pub fn replace(&self) {
        if let Some(window) = dom::window() {
            let _ = window.location().replace(&self.to_hash());
        }
    }
}

/// Screens of the application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppRoute {
    /// `#/` and `#/clients`
    Clients,
    /// `#/clients/{id}`
    Client(u32),
    /// `#/settings`
    Settings,
    NotFound,
}

impl AppRoute {
    pub fn from_path(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] | ["clients"] => Self::Clients,
            ["clients", id] => id.parse().map_or(Self::NotFound, Self::Client),
            ["settings"] => Self::Settings,
            _ => Self::NotFound,
        }
    }

    pub fn to_path(&self) -> String {
        match self {
            Self::Clients => "/clients".to_string(),
            Self::Client(id) => format!("/clients/{}", id),
            Self::Settings => "/settings".to_string(),
            Self::NotFound => "/".to_string(),
        }
    }

    pub fn location(&self) -> Location {
        Location {
            path: self.to_path(),
            search: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_parsing() {
        assert_eq!(Location::from_hash("").path, "/");
        assert_eq!(Location::from_hash("#").path, "/");
        assert_eq!(Location::from_hash("#/clients/").path, "/clients");

        let loc = Location::from_hash("#/clients?status=active");
        assert_eq!(loc.path, "/clients");
        assert_eq!(loc.search, "?status=active");
        assert_eq!(loc.to_hash(), "#/clients?status=active");
        assert_eq!(loc.route_key().as_str(), "/clients?status=active");

        assert_eq!(Location::from_hash("#/clients?").search, "");
    }

    #[test]
    fn test_route_parsing() {
        assert_eq!(AppRoute::from_path("/"), AppRoute::Clients);
        assert_eq!(AppRoute::from_path("/clients"), AppRoute::Clients);
        assert_eq!(AppRoute::from_path("/clients/42"), AppRoute::Client(42));
        assert_eq!(AppRoute::from_path("/clients/abc"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/settings"), AppRoute::Settings);
        assert_eq!(AppRoute::from_path("/reports/q3"), AppRoute::NotFound);
    }

    #[test]
    fn test_route_round_trip_paths() {
        for route in [AppRoute::Clients, AppRoute::Client(7), AppRoute::Settings] {
            assert_eq!(AppRoute::from_path(&route.to_path()), route);
        }
    }
}
