//! The per-application navigation state object.
//!
//! [`Navigator`] owns the overlay and screen registries, the close
//! coordinator, the scroll store, the guardrail and the debug sink. It is
//! created once per application instance and injected through context; every
//! mutation goes through the methods below.
//!
//! Methods that would run user code (close handlers) return the handlers
//! instead. The caller invokes them after releasing its borrow of the
//! navigator, so a handler that calls back into the navigator cannot
//! re-enter it mid-mutation.

use std::sync::Arc;

use serde_json::json;

use crate::close::{
    CloseConsumer, CloseCoordinator, CloseSignal, CloseState, CloseTrigger, PopOutcome,
};
use crate::config::NavConfig;
use crate::debug::{DebugEntry, DebugSink, LogCategory};
use crate::error::Result;
use crate::guardrail::{
    CloseCandidate, Guardrail, GuardrailReport, GuardrailSnapshot, GuardrailTrigger, Recovery,
};
use crate::overlay::{
    CloseHandler, OverlayKind, OverlayRegistration, OverlayStack, RegisterOutcome,
};
use crate::platform::{Clock, HistoryPort, ScrollPersistence};
use crate::screen::{ScreenEntry, ScreenIdAllocator, ScreenStack, validate_screen_id};
use crate::scroll::{PreserveFlag, PreserveOptions, RouteKey, ScrollStore};

/// Environment observations a guardrail pass needs besides the registries.
#[derive(Debug, Clone, Default)]
pub struct GuardrailEnv {
    pub router_path: Option<String>,
    pub scroll_locked: bool,
    pub close_candidates: Vec<CloseCandidate>,
}

/// A guardrail report plus the work the caller still has to do.
pub struct GuardrailOutcome {
    pub report: GuardrailReport,
    /// Handlers of overlays drained by a `CloseAll` recovery, topmost first.
    pub close_handlers: Vec<CloseHandler>,
    /// Path to replace-navigate to.
    pub force_sync: Option<String>,
    pub clear_scroll_lock: bool,
}

pub struct Navigator {
    config: NavConfig,
    clock: Arc<dyn Clock + Send + Sync>,
    overlays: OverlayStack,
    screens: ScreenStack,
    screen_ids: ScreenIdAllocator,
    coordinator: CloseCoordinator,
    scroll: ScrollStore,
    guardrail: Guardrail,
    sink: DebugSink,
    next_instance: u64,
}

impl Navigator {
    pub fn new(
        config: NavConfig,
        clock: Arc<dyn Clock + Send + Sync>,
        persistence: Box<dyn ScrollPersistence + Send + Sync>,
    ) -> Self {
        Self {
            overlays: OverlayStack::new(),
            screens: ScreenStack::new(),
            screen_ids: ScreenIdAllocator::default(),
            coordinator: CloseCoordinator::new(),
            scroll: ScrollStore::new(config.scroll_retention_ms, persistence),
            guardrail: Guardrail::new(&config),
            sink: DebugSink::new(config.debug_log_capacity, config.debug_enabled),
            next_instance: 0,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    // ------------------------------------------------------------------------
    // Overlays
    // ------------------------------------------------------------------------

    /// A fresh mount-instance token for an overlay component.
    pub fn next_instance(&mut self) -> u64 {
        self.next_instance += 1;
        self.next_instance
    }

    /// Registers an open overlay that has no close-signal consumer.
    ///
    /// Back and Escape reach it through [`Navigator::take_direct_close`].
    pub fn open_overlay(
        &mut self,
        id: impl Into<String>,
        kind: OverlayKind,
        on_close: impl Fn() + Send + Sync + 'static,
    ) -> Result<RegisterOutcome> {
        self.report_overlay(OverlayRegistration::open(id, kind, on_close).direct())
    }

    /// Applies an overlay's open/closed report.
    pub fn report_overlay(&mut self, registration: OverlayRegistration) -> Result<RegisterOutcome> {
        let id = registration.id().to_string();
        let outcome = self.overlays.register(registration, self.clock.now_ms())?;
        self.log(
            LogCategory::Overlay,
            "register",
            Some(json!({
                "id": id,
                "outcome": format!("{:?}", outcome),
                "count": self.overlays.count(),
            })),
        );
        Ok(outcome)
    }

    /// Removes an overlay on unmount, if `instance` still owns it.
    pub fn unregister_overlay(&mut self, id: &str, instance: u64) -> bool {
        let removed = self.overlays.unregister(id, instance);
        if removed {
            self.log(LogCategory::Overlay, "unregister", Some(json!({ "id": id })));
        }
        removed
    }

    /// The close handler of `id` if it is topmost, `None` otherwise.
    pub fn request_close(&mut self, id: &str) -> Option<CloseHandler> {
        let handler = self.overlays.request_close(id);
        self.log(
            LogCategory::Overlay,
            if handler.is_some() { "close" } else { "close_rejected" },
            Some(json!({ "id": id, "topmost": self.overlays.topmost().map(|e| e.id.clone()) })),
        );
        handler
    }

    pub fn is_topmost(&self, id: &str) -> bool {
        self.overlays.is_topmost(id)
    }

    pub fn topmost_overlay(&self) -> Option<&str> {
        self.overlays.topmost().map(|e| e.id.as_str())
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.count()
    }

    pub fn overlay_ids(&self) -> Vec<&str> {
        self.overlays.ids()
    }

    // ------------------------------------------------------------------------
    // Close coordinator
    // ------------------------------------------------------------------------

    pub fn trigger_close(&mut self, trigger: CloseTrigger) -> CloseSignal {
        let signal = self.coordinator.trigger_close(trigger);
        self.log(
            LogCategory::Close,
            "trigger",
            Some(json!({ "trigger": trigger, "close_id": signal.close_id })),
        );
        signal
    }

    pub fn reset_close(&mut self) {
        self.coordinator.reset_close();
        self.log(LogCategory::Close, "reset", None);
    }

    pub fn close_signal(&self) -> CloseSignal {
        self.coordinator.signal()
    }

    pub fn close_state(&self) -> CloseState {
        self.coordinator.state()
    }

    /// Decides whether the overlay `id` owning `consumer` handles the current
    /// signal. When it does, the signal is reset and its handler returned.
    pub fn consume_close(&mut self, consumer: &mut CloseConsumer, id: &str) -> Option<CloseHandler> {
        let signal = self.coordinator.signal();
        if !consumer.should_act(signal, self.overlays.is_topmost(id)) {
            return None;
        }
        let handler = self.overlays.request_close(id)?;
        self.coordinator.reset_close();
        self.log(
            LogCategory::Close,
            "consumed",
            Some(json!({ "id": id, "close_id": signal.close_id })),
        );
        Some(handler)
    }

    /// Consumes a pending close signal on behalf of a topmost overlay
    /// registered with [`OverlayRegistration::direct`].
    pub fn take_direct_close(&mut self) -> Option<CloseHandler> {
        let signal = self.coordinator.signal();
        if !signal.should_close {
            return None;
        }
        let entry = self.overlays.topmost().filter(|e| e.direct)?;
        let (id, handler) = (entry.id.clone(), entry.close_handler());
        self.coordinator.reset_close();
        self.log(
            LogCategory::Close,
            "consumed",
            Some(json!({ "id": id, "close_id": signal.close_id, "direct": true })),
        );
        Some(handler)
    }

    /// Arms back-action interception.
    pub fn arm_history(&mut self, history: &mut dyn HistoryPort) {
        if !self.coordinator.is_armed() {
            self.coordinator.arm(history);
            self.log(LogCategory::History, "arm", None);
        }
    }

    pub fn disarm_history(&mut self) {
        self.coordinator.disarm();
    }

    pub fn is_history_armed(&self) -> bool {
        self.coordinator.is_armed()
    }

    /// Handles a history pop notification.
    pub fn handle_pop(&mut self, history: &mut dyn HistoryPort) -> PopOutcome {
        let overlays_open = self.overlays.count() > 0;
        let outcome = self.coordinator.handle_pop(history, overlays_open);
        self.log(
            LogCategory::History,
            "pop",
            Some(json!({ "outcome": format!("{:?}", outcome), "overlays": self.overlays.count() })),
        );
        outcome
    }

    /// Re-arms interception once a route change settled.
    pub fn route_settled(&mut self, history: &mut dyn HistoryPort) {
        self.arm_history(history);
    }

    pub fn synthetic_pushes(&self) -> u64 {
        self.coordinator.synthetic_pushes()
    }

    // ------------------------------------------------------------------------
    // Screens
    // ------------------------------------------------------------------------

    /// Pushes a screen, generating an id when none is given.
    pub fn mount_screen(&mut self, id: Option<String>, path: &str) -> Result<String> {
        let id = match id {
            Some(id) => {
                validate_screen_id(&id)?;
                id
            }
            None => self.screen_ids.next_id(),
        };
        self.screens.push(id.clone(), path, self.clock.now_ms());
        self.log(
            LogCategory::Screen,
            "mount",
            Some(json!({ "id": id, "path": path, "depth": self.screens.len() })),
        );
        Ok(id)
    }

    pub fn unmount_screen(&mut self, id: &str) -> Option<ScreenEntry> {
        let removed = self.screens.remove(id);
        self.log(
            LogCategory::Screen,
            "unmount",
            Some(json!({ "id": id, "depth": self.screens.len() })),
        );
        removed
    }

    pub fn update_screen_path(&mut self, id: &str, path: &str) -> bool {
        self.screens.update_path(id, path)
    }

    pub fn is_screen_active(&self, id: &str, router_path: &str) -> bool {
        self.screens.is_active(id, router_path)
    }

    pub fn screen(&self, id: &str) -> Option<&ScreenEntry> {
        self.screens.entries().iter().find(|e| e.id == id)
    }

    pub fn top_screen(&self) -> Option<&ScreenEntry> {
        self.screens.top()
    }

    pub fn screen_count(&self) -> usize {
        self.screens.len()
    }

    // ------------------------------------------------------------------------
    // Scroll
    // ------------------------------------------------------------------------

    /// Saves a scroll offset. Skipped while a preservation scope runs, since
    /// the viewport then holds a transient offset.
    pub fn save_scroll(&mut self, key: RouteKey, position: f64, item_id: Option<String>) -> bool {
        if self.scroll.is_preserving() {
            self.log(
                LogCategory::Scroll,
                "save_skipped",
                Some(json!({ "key": key.as_str() })),
            );
            return false;
        }
        self.log(
            LogCategory::Scroll,
            "save",
            Some(json!({ "key": key.as_str(), "position": position })),
        );
        let now = self.clock.now_ms();
        self.scroll.save(key, position, item_id, now);
        true
    }

    pub fn restore_scroll(&mut self, key: &RouteKey) -> Option<f64> {
        let position = self.scroll.restore(key);
        self.log(
            LogCategory::Scroll,
            "restore",
            Some(json!({ "key": key.as_str(), "position": position })),
        );
        position
    }

    pub fn discard_scroll(&mut self, key: &RouteKey) -> bool {
        self.scroll.discard(key).is_some()
    }

    /// Purges scroll records past the retention window.
    pub fn cleanup_scroll(&mut self) -> usize {
        let purged = self.scroll.cleanup(self.clock.now_ms());
        if purged > 0 {
            self.log(LogCategory::Scroll, "cleanup", Some(json!({ "purged": purged })));
        }
        purged
    }

    pub fn is_preserving_scroll(&self) -> bool {
        self.scroll.is_preserving()
    }

    pub fn preserve_flag(&self) -> PreserveFlag {
        self.scroll.preserve_flag()
    }

    pub fn preserve_options(&self, duration_ms: u32) -> PreserveOptions {
        PreserveOptions::from_config(&self.config, duration_ms)
    }

    // ------------------------------------------------------------------------
    // Guardrail
    // ------------------------------------------------------------------------

    /// Runs one guardrail pass and applies the registry-side recoveries.
    ///
    /// `CloseAll` drains the overlay registry before returning, so the
    /// overlay count is already zero when the handlers run.
    pub fn run_guardrail(&mut self, trigger: GuardrailTrigger, env: GuardrailEnv) -> GuardrailOutcome {
        let snapshot = GuardrailSnapshot {
            router_path: env.router_path,
            screen_top_path: self.screens.top().map(|e| e.path.clone()),
            screen_count: self.screens.len(),
            overlay_count: self.overlays.count(),
            duplicate_overlays: self.overlays.take_duplicates(),
            scroll_locked: env.scroll_locked,
            close_candidates: env.close_candidates,
        };
        let report = self.guardrail.validate(trigger, &snapshot);

        let mut outcome = GuardrailOutcome {
            close_handlers: Vec::new(),
            force_sync: None,
            clear_scroll_lock: false,
            report,
        };
        for recovery in &outcome.report.recoveries {
            match recovery {
                Recovery::CloseAll => {
                    outcome.close_handlers = self.overlays.close_all();
                    self.coordinator.reset_close();
                }
                Recovery::ForceSync { path } => {
                    // The router is already on `path`, so no route change will
                    // follow to correct the screen record.
                    if let Some(top) = self.screens.top().map(|e| e.id.clone()) {
                        self.screens.update_path(&top, path.as_str());
                        self.log(
                            LogCategory::Screen,
                            "force_sync",
                            Some(json!({ "id": top, "path": path })),
                        );
                    }
                    outcome.force_sync = Some(path.clone());
                }
                Recovery::ClearScrollLock => outcome.clear_scroll_lock = true,
            }
        }

        if !outcome.report.is_clean() {
            let details = serde_json::to_value(&outcome.report).ok();
            self.log(LogCategory::Guardrail, "violations", details);
        }
        outcome
    }

    /// Whether close-button candidates are worth collecting at all.
    pub fn dom_audit_enabled(&self) -> bool {
        self.guardrail.audit_enabled()
    }

    pub fn reset_guardrail(&mut self) {
        self.guardrail.reset();
    }

    pub fn guardrail_attempts(&self) -> u32 {
        self.guardrail.attempts()
    }

    // ------------------------------------------------------------------------
    // Debug sink
    // ------------------------------------------------------------------------

    pub fn log(&mut self, category: LogCategory, action: &str, details: Option<serde_json::Value>) {
        let now = self.clock.now_ms();
        self.sink.log(now, category, action, details);
    }

    pub fn logs(&self) -> Vec<DebugEntry> {
        self.sink.logs()
    }

    pub fn clear_logs(&mut self) {
        self.sink.clear_logs();
    }

    pub fn toggle_category(&mut self, category: LogCategory, enabled: bool) {
        self.sink.toggle_category(category, enabled);
    }

    pub fn is_category_enabled(&self, category: LogCategory) -> bool {
        self.sink.is_category_enabled(category)
    }

    pub fn export_logs(&self) -> String {
        self.sink.export_json()
    }
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("overlays", &self.overlays)
            .field("screens", &self.screens.len())
            .field("close", &self.coordinator.state())
            .field("scroll", &self.scroll)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::platform::{ManualClock, NoPersistence};

    fn navigator() -> (Navigator, ManualClock) {
        let clock = ManualClock::at(1_000.0);
        let config = NavConfig {
            debug_enabled: true,
            ..NavConfig::default()
        };
        let nav = Navigator::new(config, Arc::new(clock.clone()), Box::new(NoPersistence));
        (nav, clock)
    }

    #[test]
    fn test_mount_screen_generates_and_validates_ids() {
        let (mut nav, _) = navigator();
        assert_eq!(nav.mount_screen(None, "/clients").unwrap(), "screen-1");
        assert_eq!(
            nav.mount_screen(Some("client-detail".into()), "/clients/42").unwrap(),
            "client-detail"
        );
        assert!(nav.mount_screen(Some("bad id".into()), "/x").is_err());
        assert_eq!(nav.screen_count(), 2);
        assert!(nav.is_screen_active("client-detail", "/clients/42"));

        nav.unmount_screen("client-detail");
        assert!(nav.is_screen_active("screen-1", "/clients"));
    }

    #[test]
    fn test_consume_close_resets_signal() {
        let (mut nav, _) = navigator();
        let closed = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&closed);
        nav.open_overlay("details-sheet", OverlayKind::Sheet, move || {
            hits.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        let mut consumer = CloseConsumer::starting_at(nav.close_signal());
        nav.trigger_close(CloseTrigger::Escape);
        let handler = nav.consume_close(&mut consumer, "details-sheet").unwrap();
        handler();

        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert_eq!(nav.close_state(), CloseState::Idle);
        assert!(nav.consume_close(&mut consumer, "details-sheet").is_none());
    }

    #[test]
    fn test_save_is_skipped_while_preserving() {
        let (mut nav, _) = navigator();
        let key = RouteKey::from("/clients");
        let flag = nav.preserve_flag();
        {
            let _guard = flag.acquire();
            assert!(!nav.save_scroll(key.clone(), 300.0, None));
        }
        assert!(nav.save_scroll(key.clone(), 300.0, None));
        assert_eq!(nav.restore_scroll(&key), Some(300.0));
    }

    #[test]
    fn test_cleanup_uses_clock() {
        let (mut nav, clock) = navigator();
        nav.save_scroll(RouteKey::from("/a"), 10.0, None);
        clock.advance(nav.config().scroll_retention_ms + 1.0);
        assert_eq!(nav.cleanup_scroll(), 1);
    }

    #[test]
    fn test_guardrail_force_sync_and_scroll_lock() {
        let (mut nav, _) = navigator();
        nav.mount_screen(Some("clients".into()), "/clients").unwrap();

        let outcome = nav.run_guardrail(
            GuardrailTrigger::RouteChange,
            GuardrailEnv {
                router_path: Some("/reports".into()),
                scroll_locked: true,
                close_candidates: Vec::new(),
            },
        );
        assert_eq!(outcome.force_sync.as_deref(), Some("/reports"));
        assert!(outcome.clear_scroll_lock);
        assert_eq!(nav.guardrail_attempts(), 2);
    }

    #[test]
    fn test_force_sync_heals_screen_path_without_route_change() {
        let (mut nav, _) = navigator();
        nav.mount_screen(Some("clients".into()), "/clients").unwrap();
        let env = || GuardrailEnv {
            router_path: Some("/reports".into()),
            scroll_locked: false,
            close_candidates: Vec::new(),
        };

        let outcome = nav.run_guardrail(GuardrailTrigger::Interval, env());
        assert_eq!(outcome.force_sync.as_deref(), Some("/reports"));
        assert_eq!(nav.top_screen().map(|e| e.path.as_str()), Some("/reports"));

        // Nothing navigated in between; the next audit finds no mismatch.
        let outcome = nav.run_guardrail(GuardrailTrigger::Interval, env());
        assert!(outcome.force_sync.is_none());
        assert!(outcome.report.is_clean());
        assert_eq!(nav.guardrail_attempts(), 1);
    }

    #[test]
    fn test_close_button_goes_through_coordinator() {
        let (mut nav, _) = navigator();
        let closed = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&closed);
        nav.report_overlay(
            OverlayRegistration::open("editor", OverlayKind::Dialog, move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
            .instance(7),
        )
        .unwrap();
        let mut consumer = CloseConsumer::starting_at(nav.close_signal());

        let signal = nav.trigger_close(CloseTrigger::Button);
        assert!(signal.should_close);
        assert!(nav.take_direct_close().is_none());

        let handler = nav.consume_close(&mut consumer, "editor").unwrap();
        handler();
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert!(!nav.close_signal().should_close);
        assert_eq!(nav.close_state(), CloseState::Idle);
        assert!(
            nav.logs()
                .iter()
                .any(|e| e.action == "trigger" && e.details.as_ref().is_some_and(|d| d["trigger"] == "button"))
        );
    }

    #[test]
    fn test_escape_closes_overlay_opened_without_consumer() {
        let (mut nav, _) = navigator();
        let closed = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&closed);
        nav.open_overlay("quick-note", OverlayKind::Sheet, move || {
            hits.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        assert!(nav.take_direct_close().is_none());
        nav.trigger_close(CloseTrigger::Escape);
        let handler = nav.take_direct_close().unwrap();
        handler();

        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert_eq!(nav.close_state(), CloseState::Idle);
        assert!(nav.take_direct_close().is_none());
    }

    #[test]
    fn test_direct_close_leaves_consumer_overlay_on_top_alone() {
        let (mut nav, _) = navigator();
        nav.open_overlay("quick-note", OverlayKind::Sheet, || {}).unwrap();
        nav.report_overlay(OverlayRegistration::open("confirm", OverlayKind::Dialog, || {}).instance(3))
            .unwrap();

        nav.trigger_close(CloseTrigger::Escape);
        assert!(nav.take_direct_close().is_none());
        assert!(nav.close_signal().should_close);
    }

    #[test]
    fn test_audit_disabled_when_heuristics_do_not_compile() {
        let clock = ManualClock::at(0.0);
        let mut config = NavConfig {
            dom_audit_enabled: true,
            ..NavConfig::default()
        };
        assert!(Navigator::new(config.clone(), Arc::new(clock.clone()), Box::new(NoPersistence)).dom_audit_enabled());

        config.close_buttons.text_pattern = "(unclosed".to_string();
        let nav = Navigator::new(config, Arc::new(clock), Box::new(NoPersistence));
        assert!(!nav.dom_audit_enabled());
    }

    #[test]
    fn test_debug_sink_records_transitions() {
        let (mut nav, _) = navigator();
        nav.open_overlay("a", OverlayKind::Dialog, || {}).unwrap();
        nav.trigger_close(CloseTrigger::Button);

        let logs = nav.logs();
        assert!(logs.iter().any(|e| e.category == LogCategory::Overlay));
        assert!(logs.iter().any(|e| e.action == "trigger"));

        nav.toggle_category(LogCategory::Close, false);
        nav.reset_close();
        assert!(!nav.logs().iter().any(|e| e.action == "reset"));

        nav.clear_logs();
        assert!(nav.logs().is_empty());
        assert_eq!(nav.export_logs(), "[]");
    }
}
