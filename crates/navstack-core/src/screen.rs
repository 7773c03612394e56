//! Screen stack registry and screen-adapter helpers.
//!
//! Screens push themselves when they mount and leave when they unmount. The
//! last entry is the active candidate; it is only active if its path also
//! matches the router's current path.

use serde::Serialize;

use crate::error::{NavError, Result};

/// Maximum accepted identifier length.
pub const MAX_SCREEN_ID_LEN: usize = 128;

/// One mounted navigable screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenEntry {
    pub id: String,
    pub path: String,
    pub mounted_at: f64,
}

// ============================================================================
// ScreenStack
// ============================================================================

/// Mount-ordered list of screens.
#[derive(Debug, Default, Clone)]
pub struct ScreenStack {
    entries: Vec<ScreenEntry>,
}

impl ScreenStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a screen. Re-pushing an existing id moves it to the top with
    /// the new path.
    pub fn push(&mut self, id: impl Into<String>, path: impl Into<String>, now_ms: f64) {
        let id = id.into();
        self.entries.retain(|e| e.id != id);
        self.entries.push(ScreenEntry {
            id,
            path: path.into(),
            mounted_at: now_ms,
        });
    }

    /// Removes a screen by id, wherever it sits.
    pub fn remove(&mut self, id: &str) -> Option<ScreenEntry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index))
    }

    /// Updates the path of a mounted screen (same component, new route).
    pub fn update_path(&mut self, id: &str, path: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.path = path.into();
                true
            }
            None => false,
        }
    }

    pub fn top(&self) -> Option<&ScreenEntry> {
        self.entries.last()
    }

    /// True if `id` is on top and its path is the router's current path.
    pub fn is_active(&self, id: &str, router_path: &str) -> bool {
        self.top()
            .is_some_and(|top| top.id == id && top.path == router_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ScreenEntry] {
        &self.entries
    }
}

// ============================================================================
// Identifiers
// ============================================================================

/// Hands out `screen-N` identifiers for screens that do not bring their own.
#[derive(Debug, Default, Clone)]
pub struct ScreenIdAllocator {
    next: u64,
}

impl ScreenIdAllocator {
    pub fn next_id(&mut self) -> String {
        self.next += 1;
        format!("screen-{}", self.next)
    }
}

/// Checks that a screen identifier is non-empty and uses `[A-Za-z0-9_:.-]`.
pub fn validate_screen_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(NavError::MissingIdentifier("screen"));
    }
    let well_formed = id.len() <= MAX_SCREEN_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-'));
    if well_formed {
        Ok(())
    } else {
        Err(NavError::InvalidIdentifier(id.to_string()))
    }
}

/// Validates the context a screen adapter is about to use for restoration.
pub fn validate_screen_context(id: &str, container_attached: bool) -> Result<()> {
    validate_screen_id(id)?;
    if !container_attached {
        return Err(NavError::DetachedContainer(id.to_string()));
    }
    Ok(())
}

// ============================================================================
// Activation
// ============================================================================

/// An activation edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Activated,
    Deactivated,
}

/// Turns a level signal (`is_active`) into edges.
///
/// The first observation only fires if the screen starts active.
#[derive(Debug, Default, Clone)]
pub struct ActivationTracker {
    last: Option<bool>,
}

impl ActivationTracker {
    pub fn observe(&mut self, is_active: bool) -> Option<Activation> {
        let previous = self.last.replace(is_active);
        match (previous, is_active) {
            (Some(prev), now) if prev == now => None,
            (None, false) => None,
            (_, true) => Some(Activation::Activated),
            (_, false) => Some(Activation::Deactivated),
        }
    }

    pub fn is_active(&self) -> bool {
        self.last.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_active() {
        let mut stack = ScreenStack::new();
        stack.push("clients", "/clients", 1.0);
        stack.push("client-detail", "/clients/42", 2.0);

        assert_eq!(stack.len(), 2);
        assert!(stack.is_active("client-detail", "/clients/42"));
        assert!(!stack.is_active("clients", "/clients"));
        // Top entry exists but the router is elsewhere.
        assert!(!stack.is_active("client-detail", "/reports"));
    }

    #[test]
    fn test_repush_moves_to_top() {
        let mut stack = ScreenStack::new();
        stack.push("a", "/a", 1.0);
        stack.push("b", "/b", 2.0);
        stack.push("a", "/a?tab=2", 3.0);

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.top().map(|e| e.id.as_str()), Some("a"));
        assert_eq!(stack.top().map(|e| e.path.as_str()), Some("/a?tab=2"));
    }

    #[test]
    fn test_remove_and_update_path() {
        let mut stack = ScreenStack::new();
        stack.push("a", "/a", 1.0);
        stack.push("b", "/b", 2.0);

        assert!(stack.update_path("a", "/a2"));
        assert!(!stack.update_path("zzz", "/x"));
        assert_eq!(stack.remove("b").map(|e| e.path), Some("/b".to_string()));
        assert!(stack.remove("b").is_none());
        assert!(stack.is_active("a", "/a2"));
    }

    #[test]
    fn test_allocator() {
        let mut ids = ScreenIdAllocator::default();
        assert_eq!(ids.next_id(), "screen-1");
        assert_eq!(ids.next_id(), "screen-2");
    }

    #[test]
    fn test_validate_screen_id() {
        assert!(validate_screen_id("client-detail:42").is_ok());
        assert_eq!(
            validate_screen_id(""),
            Err(NavError::MissingIdentifier("screen"))
        );
        assert!(matches!(
            validate_screen_id("has space"),
            Err(NavError::InvalidIdentifier(_))
        ));
        assert!(validate_screen_id(&"x".repeat(MAX_SCREEN_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_screen_context() {
        assert!(validate_screen_context("clients", true).is_ok());
        assert_eq!(
            validate_screen_context("clients", false),
            Err(NavError::DetachedContainer("clients".to_string()))
        );
    }

    #[test]
    fn test_activation_edges() {
        let mut tracker = ActivationTracker::default();
        assert_eq!(tracker.observe(false), None);
        assert_eq!(tracker.observe(true), Some(Activation::Activated));
        assert_eq!(tracker.observe(true), None);
        assert_eq!(tracker.observe(false), Some(Activation::Deactivated));
        assert_eq!(tracker.observe(false), None);
        assert!(!tracker.is_active());
    }

    #[test]
    fn test_activation_starting_active() {
        let mut tracker = ActivationTracker::default();
        assert_eq!(tracker.observe(true), Some(Activation::Activated));
        assert!(tracker.is_active());
    }
}
