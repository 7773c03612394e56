//! Root application module.
//!
//! Contains the App component, the navigation context shared by every
//! screen and overlay, and the demo business state.

use std::future::Future;

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use navstack_core::{
    CloseConsumer, CloseSignal, CloseTrigger, DebugEntry, GuardrailEnv, GuardrailTrigger,
    HistoryPort, LogCategory, Navigator, OverlayKind, OverlayRegistration, PopOutcome,
    RegisterOutcome, RouteKey, RouterPort, ScrollSurface, preserve_during_action,
};

use crate::components::{AppRouter, NavProvider};
use crate::config::{DEMO_CLIENT_COUNT, SETTLE_DELAY_MS};
use crate::models::{Client, Location, demo_clients};
use crate::platform::{BrowserClock, BrowserHistory, HashRouter, WindowSurface};
use crate::utils::dom;

// ============================================================================
// NavContext
// ============================================================================

/// Navigation state shared through Leptos context.
///
/// Wraps the single [`Navigator`] of the application and mirrors the parts
/// views react to into signals. Close handlers returned by the navigator are
/// invoked only after its borrow is released, so a handler may call back
/// into the context.
///
/// `Copy` because every field is an arena handle.
#[derive(Clone, Copy)]
pub struct NavContext {
    navigator: StoredValue<Navigator>,
    /// Mirror of the coordinator's close signal.
    pub close_signal: RwSignal<CloseSignal>,
    /// Bumped whenever the overlay registry changes.
    pub overlay_revision: RwSignal<u64>,
    /// Bumped whenever the screen registry changes.
    pub screen_revision: RwSignal<u64>,
    /// Current hash location.
    pub location: RwSignal<Location>,
    /// Set while a guardrail recovery closes every overlay.
    force_closing: StoredValue<bool>,
}

impl NavContext {
    pub fn new(navigator: Navigator) -> Self {
        let close_signal = RwSignal::new(navigator.close_signal());
        Self {
            navigator: StoredValue::new(navigator),
            close_signal,
            overlay_revision: RwSignal::new(0),
            screen_revision: RwSignal::new(0),
            location: RwSignal::new(Location::current()),
            force_closing: StoredValue::new(false),
        }
    }

    /// Reads the navigator. `None` once the owning scope was disposed.
    pub fn read<R>(&self, f: impl FnOnce(&Navigator) -> R) -> Option<R> {
        self.navigator.try_with_value(f)
    }

    /// Mutates the navigator. `None` once the owning scope was disposed.
    pub fn write<R>(&self, f: impl FnOnce(&mut Navigator) -> R) -> Option<R> {
        self.navigator.try_update_value(f)
    }

    fn sync_close_signal(&self) {
        if let Some(signal) = self.read(Navigator::close_signal) {
            self.close_signal.set(signal);
        }
    }

    fn touch_overlays(&self) {
        self.overlay_revision.update(|n| *n += 1);
    }

    fn touch_screens(&self) {
        self.screen_revision.update(|n| *n += 1);
    }

    // ------------------------------------------------------------------------
    // Overlays
    // ------------------------------------------------------------------------

    pub fn next_overlay_instance(&self) -> u64 {
        self.write(Navigator::next_instance).unwrap_or_default()
    }

    /// Applies an overlay's open/closed report.
    pub fn report_overlay(&self, registration: OverlayRegistration) -> Option<RegisterOutcome> {
        match self.write(|nav| nav.report_overlay(registration))? {
            Ok(outcome) => {
                if outcome != RegisterOutcome::Ignored {
                    self.touch_overlays();
                }
                Some(outcome)
            }
            Err(e) => {
                tracing::error!(error = %e, "overlay registration rejected");
                None
            }
        }
    }

    /// Registers an open overlay outside of the [`Overlay`](crate::components::Overlay)
    /// shell.
    ///
    /// Back and Escape run `on_close` directly while it is topmost. Report the
    /// close with [`OverlayRegistration::closed`].
    pub fn open_overlay(
        &self,
        id: &str,
        kind: OverlayKind,
        on_close: impl Fn() + Send + Sync + 'static,
    ) -> Option<RegisterOutcome> {
        self.report_overlay(OverlayRegistration::open(id, kind, on_close).direct())
    }

    pub fn unregister_overlay(&self, id: &str, instance: u64) {
        if self.write(|nav| nav.unregister_overlay(id, instance)) == Some(true) {
            self.touch_overlays();
        }
    }

    /// Reactive.
    pub fn is_topmost(&self, id: &str) -> bool {
        self.overlay_revision.track();
        self.read(|nav| nav.is_topmost(id)).unwrap_or(false)
    }

    /// Reactive.
    pub fn overlay_count(&self) -> usize {
        self.overlay_revision.track();
        self.read(Navigator::overlay_count).unwrap_or(0)
    }

    // ------------------------------------------------------------------------
    // Close coordinator
    // ------------------------------------------------------------------------

    pub fn trigger_close(&self, trigger: CloseTrigger) {
        self.write(|nav| nav.trigger_close(trigger));
        self.dispatch_close();
    }

    /// Publishes the close signal, first running the handler of a topmost
    /// overlay that has no consumer to pick it up.
    fn dispatch_close(&self) {
        let handler = self.write(Navigator::take_direct_close).flatten();
        self.sync_close_signal();
        if let Some(handler) = handler {
            handler();
        }
    }

    pub fn reset_close(&self) {
        self.write(Navigator::reset_close);
        self.sync_close_signal();
    }

    /// Lets the overlay `id` consume the current close signal.
    pub fn consume_close(&self, consumer: StoredValue<CloseConsumer>, id: &str) -> bool {
        let handler = consumer
            .try_update_value(|consumer| self.write(|nav| nav.consume_close(consumer, id)))
            .flatten()
            .flatten();
        match handler {
            Some(handler) => {
                self.sync_close_signal();
                handler();
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------------

    /// Handles a `popstate` notification.
    pub fn handle_pop(&self) {
        let mut history = BrowserHistory;
        let Some(outcome) = self.write(|nav| nav.handle_pop(&mut history)) else {
            return;
        };
        match outcome {
            PopOutcome::CloseRequested(_) => self.dispatch_close(),
            PopOutcome::RouteChanged => self.settle_history(),
            PopOutcome::Navigate | PopOutcome::SkippedSynthetic => {}
        }
    }

    /// Puts a synthetic entry on top of the current real one.
    pub fn settle_history(&self) {
        let mut history = BrowserHistory;
        if history.at_synthetic_entry() {
            return;
        }
        self.write(|nav| {
            nav.disarm_history();
            nav.route_settled(&mut history);
        });
    }

    /// Navigates to `location`.
    ///
    /// While armed the browser sits on the synthetic entry, which is replaced
    /// so that it never ends up between two real entries.
    pub fn navigate(&self, location: Location) {
        if location == self.location.get_untracked() {
            return;
        }
        let armed = self
            .write(|nav| {
                let armed = nav.is_history_armed();
                nav.disarm_history();
                armed
            })
            .unwrap_or(false);
        if armed && BrowserHistory.at_synthetic_entry() {
            location.replace();
        } else {
            location.push();
        }
    }

    /// Applies a settled hash change.
    pub fn on_location_changed(&self) {
        let previous = self.location.get_untracked();
        let current = Location::current();
        if previous != current {
            self.save_scroll_position(previous.route_key(), None);
            self.location.set(current);
        }
        self.settle_history();
        self.schedule_guardrail(GuardrailTrigger::RouteChange);
    }

    // ------------------------------------------------------------------------
    // Screens
    // ------------------------------------------------------------------------

    /// Registers a screen. An invalid id degrades to a generated one.
    pub fn mount_screen(&self, id: Option<String>, path: &str) -> Option<String> {
        let id = self.write(|nav| match nav.mount_screen(id, path) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(error = %e, path, "invalid screen id, generating one");
                nav.mount_screen(None, path).ok()
            }
        })??;
        self.touch_screens();
        Some(id)
    }

    pub fn unmount_screen(&self, id: &str) {
        if self.write(|nav| nav.unmount_screen(id)).flatten().is_some() {
            self.touch_screens();
        }
    }

    pub fn update_screen_path(&self, id: &str, path: &str) {
        if self.write(|nav| nav.update_screen_path(id, path)) == Some(true) {
            self.touch_screens();
        }
    }

    /// Reactive.
    pub fn is_screen_active(&self, id: &str) -> bool {
        self.screen_revision.track();
        let location = self.location.get();
        self.read(|nav| nav.is_screen_active(id, &location.path))
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------------
    // Scroll
    // ------------------------------------------------------------------------

    /// Saves the window offset under `route_key`.
    pub fn save_scroll_position(&self, route_key: RouteKey, item_id: Option<String>) -> bool {
        let position = WindowSurface.offset();
        self.write(|nav| nav.save_scroll(route_key, position, item_id))
            .unwrap_or(false)
    }

    /// Scrolls the window to the offset saved under `route_key`, if any.
    pub fn restore_scroll_position(&self, route_key: &RouteKey) -> Option<f64> {
        let position = self.write(|nav| nav.restore_scroll(route_key)).flatten()?;
        WindowSurface.set_offset(position);
        Some(position)
    }

    /// Runs `action` while keeping the window offset pinned for `duration_ms`.
    pub async fn preserve_scroll_during_action<F, Fut, R>(&self, duration_ms: u32, action: F) -> R
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        let scope = self.read(|nav| (nav.preserve_flag(), nav.preserve_options(duration_ms)));
        match scope {
            Some((flag, options)) => {
                preserve_during_action(&WindowSurface, &BrowserClock, &flag, &options, action)
                    .await
            }
            None => action().await,
        }
    }

    pub fn cleanup_scroll(&self) {
        self.write(Navigator::cleanup_scroll);
    }

    // ------------------------------------------------------------------------
    // Guardrail
    // ------------------------------------------------------------------------

    /// Runs a guardrail pass once the views reacting to the current change
    /// have rendered.
    pub fn schedule_guardrail(&self, trigger: GuardrailTrigger) {
        let ctx = *self;
        Timeout::new(SETTLE_DELAY_MS, move || ctx.run_guardrail(trigger)).forget();
    }

    /// Runs one guardrail pass and applies its recoveries.
    pub fn run_guardrail(&self, trigger: GuardrailTrigger) {
        let heuristics = self
            .read(|nav| {
                nav.dom_audit_enabled()
                    .then(|| nav.config().close_buttons.clone())
            })
            .flatten();
        let env = GuardrailEnv {
            router_path: HashRouter.current_path(),
            scroll_locked: dom::is_scroll_locked(),
            close_candidates: heuristics
                .map(|h| dom::collect_close_candidates(&h))
                .unwrap_or_default(),
        };
        let Some(outcome) = self.write(|nav| nav.run_guardrail(trigger, env)) else {
            return;
        };

        if !outcome.close_handlers.is_empty() {
            self.sync_close_signal();
            self.touch_overlays();
            self.force_closing.set_value(true);
            for handler in &outcome.close_handlers {
                handler();
            }
            self.force_closing.set_value(false);
        }
        if let Some(path) = outcome.force_sync {
            tracing::info!(%path, "screen record synced to router");
            if HashRouter.current_path().as_deref() != Some(path.as_str()) {
                HashRouter.replace(&path);
                self.location.set(Location::current());
            }
            self.touch_screens();
            self.settle_history();
        }
        if outcome.clear_scroll_lock {
            dom::set_scroll_lock(false);
        }
    }

    /// True while overlays are being closed by a recovery. Close handlers
    /// must not veto such a close.
    pub fn is_force_closing(&self) -> bool {
        self.force_closing.try_get_value().unwrap_or(false)
    }

    pub fn reset_guardrail(&self) {
        self.write(Navigator::reset_guardrail);
    }

    // ------------------------------------------------------------------------
    // Debug sink
    // ------------------------------------------------------------------------

    pub fn log(&self, category: LogCategory, action: &str, details: Option<serde_json::Value>) {
        self.write(|nav| nav.log(category, action, details));
    }

    pub fn logs(&self) -> Vec<DebugEntry> {
        self.read(Navigator::logs).unwrap_or_default()
    }

    pub fn clear_logs(&self) {
        self.write(Navigator::clear_logs);
    }

    pub fn toggle_category(&self, category: LogCategory, enabled: bool) {
        self.write(|nav| nav.toggle_category(category, enabled));
    }

    pub fn debug_enabled(&self) -> bool {
        self.read(|nav| nav.config().debug_enabled).unwrap_or(false)
    }
}

/// Returns the navigation context. Panics outside of [`NavProvider`].
pub fn use_nav() -> NavContext {
    use_context::<NavContext>().expect("NavContext must be provided (wrap the app in NavProvider)")
}

// ============================================================================
// Demo state
// ============================================================================

/// Business records edited by the demo screens.
#[derive(Clone, Copy)]
pub struct AppState {
    pub clients: RwSignal<Vec<Client>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            clients: RwSignal::new(demo_clients(DEMO_CLIENT_COUNT)),
        }
    }

    pub fn client(&self, id: u32) -> Option<Client> {
        self.clients
            .with(|clients| clients.iter().find(|c| c.id == id).cloned())
    }

    pub fn upsert(&self, client: Client) {
        self.clients.update(|clients| {
            match clients.iter_mut().find(|c| c.id == client.id) {
                Some(existing) => *existing = client,
                None => clients.push(client),
            }
        });
    }

    pub fn next_id(&self) -> u32 {
        self.clients
            .with(|clients| clients.iter().map(|c| c.id).max().unwrap_or(0) + 1)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Root application component with error boundary.
#[component]
pub fn App() -> impl IntoView {
    provide_context(AppState::new());

    view! {
        <ErrorBoundary
            fallback=|errors| view! {
                <div style="
                    display: flex;
                    flex-direction: column;
                    align-items: center;
                    justify-content: center;
                    height: 100vh;
                    padding: 2rem;
                    background: #f6f7f9;
                    color: #1f2430;
                    font-family: system-ui, sans-serif;
                ">
                    <div style="max-width: 600px; text-align: center;">
                        <h1 style="color: #c0392b; margin-bottom: 1rem;">
                            "Something went wrong"
                        </h1>
                        <p style="color: #5f6b7a; margin-bottom: 2rem;">
                            "An unexpected error occurred. Please try reloading the page."
                        </p>
                        <details style="
                            text-align: left;
                            background: #ffffff;
                            padding: 1rem;
                            border-radius: 4px;
                            margin-bottom: 1rem;
                        ">
                            <summary style="cursor: pointer; color: #5f6b7a;">
                                "Error details"
                            </summary>
                            <ul style="margin: 1rem 0 0 0; padding-left: 1.5rem; color: #c0392b;">
                                {move || errors.get()
                                    .into_iter()
                                    .map(|(_, e)| view! { <li>{e.to_string()}</li> })
                                    .collect::<Vec<_>>()
                                }
                            </ul>
                        </details>
                        <button
                            on:click=move |_| {
                                if let Some(window) = web_sys::window() {
                                    let _ = window.location().reload();
                                }
                            }
                            style="
                                background: #2d6cdf;
                                color: white;
                                border: none;
                                padding: 0.75rem 2rem;
                                border-radius: 4px;
                                cursor: pointer;
                            "
                        >
                            "Reload Page"
                        </button>
                    </div>
                </div>
            }
        >
            <NavProvider>
                <AppRouter />
            </NavProvider>
        </ErrorBoundary>
    }
}
