//! Overlay stack registry.
//!
//! Dialogs, sheets and drawers register here while they are open. Order of
//! registration among currently open entries defines which one is topmost,
//! and only the topmost overlay may be closed through [`OverlayStack::request_close`].
//!
//! Close handlers are returned instead of invoked so the caller can release
//! its borrow on the registry before running user code.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{NavError, Result};

/// Callback that asks an overlay to close itself.
pub type CloseHandler = Arc<dyn Fn() + Send + Sync>;

// ============================================================================
// OverlayKind
// ============================================================================

/// Presentation variant of an overlay. All kinds share one registration
/// contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    #[default]
    Dialog,
    Sheet,
    Drawer,
}

impl OverlayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dialog => "dialog",
            Self::Sheet => "sheet",
            Self::Drawer => "drawer",
        }
    }

    /// ARIA role for the overlay shell.
    pub fn aria_role(&self) -> &'static str {
        match self {
            Self::Dialog => "alertdialog",
            Self::Sheet | Self::Drawer => "dialog",
        }
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Registration
// ============================================================================

/// A report from an overlay about its open state.
#[derive(Clone)]
pub struct OverlayRegistration {
    id: String,
    kind: OverlayKind,
    instance: u64,
    is_open: bool,
    direct: bool,
    on_close: Option<CloseHandler>,
}

impl OverlayRegistration {
    /// An overlay reporting itself open.
    pub fn open(
        id: impl Into<String>,
        kind: OverlayKind,
        on_close: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            instance: 0,
            is_open: true,
            direct: false,
            on_close: Some(Arc::new(on_close)),
        }
    }

    /// An overlay reporting itself closed.
    pub fn closed(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: OverlayKind::default(),
            instance: 0,
            is_open: false,
            direct: false,
            on_close: None,
        }
    }

    /// Tags the report with the mount instance that produced it.
    pub fn instance(mut self, instance: u64) -> Self {
        self.instance = instance;
        self
    }

    /// Marks an overlay that has no close-signal consumer of its own.
    /// Close requests that reach it while topmost run its handler directly.
    pub fn direct(mut self) -> Self {
        self.direct = true;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// One registered overlay.
#[derive(Clone)]
pub struct ModalEntry {
    pub id: String,
    pub kind: OverlayKind,
    pub instance: u64,
    pub is_open: bool,
    pub direct: bool,
    pub registered_at: f64,
    on_close: CloseHandler,
}

impl ModalEntry {
    pub fn close_handler(&self) -> CloseHandler {
        Arc::clone(&self.on_close)
    }
}

impl fmt::Debug for ModalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalEntry")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("instance", &self.instance)
            .field("is_open", &self.is_open)
            .field("direct", &self.direct)
            .field("registered_at", &self.registered_at)
            .finish_non_exhaustive()
    }
}

/// What a call to [`OverlayStack::register`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Inserted,
    /// Same instance re-reported open; position unchanged.
    Updated,
    Removed,
    /// Close report for an id that is not registered (or owned by another instance).
    Ignored,
    /// Another instance already held this id open. Overwritten, last write wins.
    Duplicate { previous_instance: u64 },
}

// ============================================================================
// OverlayStack
// ============================================================================

/// Ordered registry of open overlays, bottom first.
#[derive(Default)]
pub struct OverlayStack {
    entries: Vec<ModalEntry>,
    duplicates: Vec<String>,
}

impl OverlayStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts, updates or removes the entry described by `registration`.
    ///
    /// Only an empty id is an error. Duplicate ids are tolerated and queued
    /// for the guardrail (see [`OverlayStack::take_duplicates`]).
    pub fn register(
        &mut self,
        registration: OverlayRegistration,
        now_ms: f64,
    ) -> Result<RegisterOutcome> {
        if registration.id.trim().is_empty() {
            return Err(NavError::MissingIdentifier("overlay"));
        }

        let position = self.position(&registration.id);

        if !registration.is_open {
            return Ok(match position {
                Some(i) if self.entries[i].instance == registration.instance => {
                    self.entries.remove(i);
                    RegisterOutcome::Removed
                }
                _ => RegisterOutcome::Ignored,
            });
        }

        let on_close = match registration.on_close {
            Some(handler) => handler,
            None => return Err(NavError::MissingIdentifier("overlay close handler")),
        };

        match position {
            Some(i) if self.entries[i].instance == registration.instance => {
                let entry = &mut self.entries[i];
                entry.kind = registration.kind;
                entry.direct = registration.direct;
                entry.on_close = on_close;
                Ok(RegisterOutcome::Updated)
            }
            Some(i) => {
                let previous = self.entries.remove(i);
                tracing::warn!(
                    id = %registration.id,
                    previous_instance = previous.instance,
                    instance = registration.instance,
                    "duplicate overlay id registered while still open"
                );
                self.duplicates.push(registration.id.clone());
                self.entries.push(ModalEntry {
                    id: registration.id,
                    kind: registration.kind,
                    instance: registration.instance,
                    is_open: true,
                    direct: registration.direct,
                    registered_at: now_ms,
                    on_close,
                });
                Ok(RegisterOutcome::Duplicate {
                    previous_instance: previous.instance,
                })
            }
            None => {
                self.entries.push(ModalEntry {
                    id: registration.id,
                    kind: registration.kind,
                    instance: registration.instance,
                    is_open: true,
                    direct: registration.direct,
                    registered_at: now_ms,
                    on_close,
                });
                Ok(RegisterOutcome::Inserted)
            }
        }
    }

    /// Removes `id` if it is still owned by `instance`. Used on unmount.
    pub fn unregister(&mut self, id: &str, instance: u64) -> bool {
        match self.position(id) {
            Some(i) if self.entries[i].instance == instance => {
                self.entries.remove(i);
                true
            }
            _ => false,
        }
    }

    /// The most recently registered entry that is still open.
    pub fn topmost(&self) -> Option<&ModalEntry> {
        self.entries.iter().rev().find(|e| e.is_open)
    }

    pub fn is_topmost(&self, id: &str) -> bool {
        self.topmost().is_some_and(|e| e.id == id)
    }

    /// Returns the close handler of `id` if, and only if, it is topmost.
    pub fn request_close(&self, id: &str) -> Option<CloseHandler> {
        self.topmost()
            .filter(|e| e.id == id)
            .map(ModalEntry::close_handler)
    }

    /// Drains every entry and returns their handlers, topmost first.
    pub fn close_all(&mut self) -> Vec<CloseHandler> {
        self.entries
            .drain(..)
            .rev()
            .map(|e| e.on_close)
            .collect()
    }

    pub fn count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_open).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&ModalEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Registered ids, bottom to top.
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }

    /// Ids that were registered twice while open since the last call.
    pub fn take_duplicates(&mut self) -> Vec<String> {
        std::mem::take(&mut self.duplicates)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }
}

impl fmt::Debug for OverlayStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayStack")
            .field("ids", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn open(id: &str) -> OverlayRegistration {
        OverlayRegistration::open(id, OverlayKind::Dialog, || {})
    }

    fn counting(id: &str, hits: &Arc<AtomicUsize>) -> OverlayRegistration {
        let hits = Arc::clone(hits);
        OverlayRegistration::open(id, OverlayKind::Sheet, move || {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_empty_id_is_rejected() {
        let mut stack = OverlayStack::new();
        assert_eq!(
            stack.register(open("  "), 0.0),
            Err(NavError::MissingIdentifier("overlay"))
        );
    }

    #[test]
    fn test_topmost_follows_registration_order() {
        let mut stack = OverlayStack::new();
        stack.register(open("a"), 1.0).unwrap();
        stack.register(open("b"), 2.0).unwrap();

        assert!(stack.is_topmost("b"));
        assert!(!stack.is_topmost("a"));
        assert_eq!(stack.ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_closed_report_removes_entry() {
        let mut stack = OverlayStack::new();
        stack.register(open("a"), 1.0).unwrap();
        assert_eq!(
            stack.register(OverlayRegistration::closed("a"), 2.0),
            Ok(RegisterOutcome::Removed)
        );
        assert_eq!(stack.count(), 0);
        assert_eq!(
            stack.register(OverlayRegistration::closed("a"), 3.0),
            Ok(RegisterOutcome::Ignored)
        );
    }

    #[test]
    fn test_update_keeps_position() {
        let mut stack = OverlayStack::new();
        stack.register(open("a"), 1.0).unwrap();
        stack.register(open("b"), 2.0).unwrap();
        assert_eq!(stack.register(open("a"), 3.0), Ok(RegisterOutcome::Updated));
        assert!(stack.is_topmost("b"));
        assert_eq!(stack.get("a").map(|e| e.registered_at), Some(1.0));
    }

    #[test]
    fn test_reopen_moves_to_top() {
        let mut stack = OverlayStack::new();
        stack.register(open("a"), 1.0).unwrap();
        stack.register(open("b"), 2.0).unwrap();
        stack.register(OverlayRegistration::closed("a"), 3.0).unwrap();
        stack.register(open("a"), 4.0).unwrap();
        assert!(stack.is_topmost("a"));
    }

    #[test]
    fn test_duplicate_overwrites_and_is_reported() {
        let mut stack = OverlayStack::new();
        stack.register(open("a").instance(1), 1.0).unwrap();
        stack.register(open("b").instance(2), 2.0).unwrap();

        let outcome = stack.register(open("a").instance(3), 3.0).unwrap();
        assert_eq!(outcome, RegisterOutcome::Duplicate { previous_instance: 1 });
        assert_eq!(stack.count(), 2);
        assert!(stack.is_topmost("a"));
        assert_eq!(stack.take_duplicates(), vec!["a".to_string()]);
        assert!(stack.take_duplicates().is_empty());

        // The stale instance cannot remove the entry it lost.
        assert_eq!(
            stack.register(OverlayRegistration::closed("a").instance(1), 4.0),
            Ok(RegisterOutcome::Ignored)
        );
        assert!(!stack.unregister("a", 1));
        assert!(stack.unregister("a", 3));
    }

    #[test]
    fn test_request_close_only_for_topmost() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut stack = OverlayStack::new();
        stack.register(counting("a", &hits), 1.0).unwrap();
        stack.register(counting("b", &hits), 2.0).unwrap();

        assert!(stack.request_close("a").is_none());
        assert!(stack.request_close("missing").is_none());

        let handler = stack.request_close("b").expect("b is topmost");
        handler();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        // Removal happens when the overlay reports itself closed.
        assert_eq!(stack.count(), 2);
    }

    #[test]
    fn test_close_all_drains_top_to_bottom() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut stack = OverlayStack::new();
        for id in ["a", "b", "c"] {
            let order = Arc::clone(&order);
            let name = id.to_string();
            stack
                .register(
                    OverlayRegistration::open(id, OverlayKind::Drawer, move || {
                        order.lock().unwrap().push(name.clone());
                    }),
                    0.0,
                )
                .unwrap();
        }

        for handler in stack.close_all() {
            handler();
        }
        assert_eq!(stack.count(), 0);
        assert_eq!(*order.lock().unwrap(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_exactly_one_topmost_across_sequences() {
        let ids = ["a", "b", "c", "d"];
        let mut stack = OverlayStack::new();
        let mut seed: u32 = 7;

        for step in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let id = ids[(seed >> 16) as usize % ids.len()];
            if (seed >> 8) % 3 == 0 {
                stack.register(OverlayRegistration::closed(id), step as f64).unwrap();
            } else {
                stack.register(open(id), step as f64).unwrap();
            }

            let topmost = ids.iter().filter(|id| stack.is_topmost(id)).count();
            assert_eq!(topmost, usize::from(stack.count() > 0));
        }
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(OverlayKind::Sheet.to_string(), "sheet");
        assert_eq!(OverlayKind::Dialog.aria_role(), "alertdialog");
        assert_eq!(OverlayKind::default(), OverlayKind::Dialog);
    }
}
