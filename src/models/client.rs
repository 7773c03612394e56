//! Demo business data shown by the screens.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientStatus {
    #[default]
    Active,
    Prospect,
    Dormant,
}

impl ClientStatus {
    pub const ALL: [ClientStatus; 3] = [Self::Active, Self::Prospect, Self::Dormant];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Prospect => "Prospect",
            Self::Dormant => "Dormant",
        }
    }

    /// Query-string value (`?status=...`).
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Prospect => "prospect",
            Self::Dormant => "dormant",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.slug() == slug)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Client {
    pub id: u32,
    pub name: String,
    pub company: String,
    pub status: ClientStatus,
    pub notes: String,
}

const FIRST_NAMES: &[&str] = &[
    "Ada", "Bruno", "Chiara", "Dmitri", "Elif", "Farah", "Goran", "Hana", "Ivo", "Jun",
];
const COMPANIES: &[&str] = &[
    "Northwind", "Blue Harbor", "Kestrel Labs", "Orchard & Co", "Pinecrest", "Vantage Tools",
    "Tidewater",
];

/// Deterministic demo clients, ids starting at 1.
pub fn demo_clients(count: u32) -> Vec<Client> {
    (1..=count)
        .map(|id| {
            let i = id as usize;
            Client {
                id,
                name: format!("{} {}", FIRST_NAMES[i % FIRST_NAMES.len()], id),
                company: COMPANIES[(i * 3) % COMPANIES.len()].to_string(),
                status: ClientStatus::ALL[i % ClientStatus::ALL.len()],
                notes: String::new(),
            }
        })
        .collect()
}

/// Status filter carried in the query string, e.g. `?status=prospect`.
pub fn status_filter(search: &str) -> Option<ClientStatus> {
    search
        .trim_start_matches('?')
        .split('&')
        .find_map(|pair| pair.strip_prefix("status="))
        .and_then(ClientStatus::from_slug)
}

const TOUCHPOINTS: &[&str] = &["Call", "Email", "Site visit", "Quote sent", "Invoice"];

/// Deterministic activity history for a client, newest first.
pub fn activity_log(client_id: u32, entries: u32) -> Vec<String> {
    (0..entries)
        .map(|n| {
            let kind = TOUCHPOINTS[((client_id + n) as usize) % TOUCHPOINTS.len()];
            format!("{} · week {}", kind, entries - n)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_clients_are_deterministic() {
        let a = demo_clients(12);
        assert_eq!(a.len(), 12);
        assert_eq!(a[0].id, 1);
        assert_eq!(a, demo_clients(12));
    }

    #[test]
    fn test_status_filter() {
        assert_eq!(status_filter(""), None);
        assert_eq!(status_filter("?status=prospect"), Some(ClientStatus::Prospect));
        assert_eq!(status_filter("?page=2&status=dormant"), Some(ClientStatus::Dormant));
        assert_eq!(status_filter("?status=unknown"), None);
    }

    #[test]
    fn test_activity_log() {
        let log = activity_log(3, 4);
        assert_eq!(log.len(), 4);
        assert!(log[0].ends_with("week 4"));
        assert!(log[3].ends_with("week 1"));
        assert_ne!(activity_log(3, 4), activity_log(4, 4));
    }
}
