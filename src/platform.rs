//! Browser implementations of the navigation core's host ports.

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use gloo_timers::future::TimeoutFuture;
use navstack_core::{
    Clock, HistoryPort, Result, RouterPort, ScrollPersistence, ScrollRecord, ScrollSurface, Timers,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

use crate::config::SCROLL_STORAGE_KEY;
use crate::models::Location;
use crate::utils::{dom, storage};

// =============================================================================
// Clock and timers
// =============================================================================

/// Wall clock. Scroll records outlive a page load, so `performance.now()`
/// would not do.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

impl Timers for BrowserClock {
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        TimeoutFuture::new(ms).boxed_local()
    }
}

// =============================================================================
// History
// =============================================================================

/// State object attached to synthetic history entries.
#[derive(Serialize, Deserialize)]
struct SentinelState {
    #[serde(rename = "navstackSentinel")]
    sentinel: bool,
}

/// `window.history`, marking synthetic entries through their state object.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserHistory;

impl HistoryPort for BrowserHistory {
    fn push_synthetic(&mut self) {
        let Some(history) = dom::window().and_then(|w| w.history().ok()) else {
            return;
        };
        let state = serde_wasm_bindgen::to_value(&SentinelState { sentinel: true })
            .unwrap_or(JsValue::NULL);
        if history.push_state(&state, "").is_err() {
            tracing::warn!("failed to push synthetic history entry");
        }
    }

    fn go_back(&mut self) {
        if let Some(history) = dom::window().and_then(|w| w.history().ok()) {
            let _ = history.back();
        }
    }

    fn at_synthetic_entry(&self) -> bool {
        dom::window()
            .and_then(|w| w.history().ok())
            .and_then(|h| h.state().ok())
            .filter(|state| state.is_object())
            .and_then(|state| serde_wasm_bindgen::from_value::<SentinelState>(state).ok())
            .is_some_and(|state| state.sentinel)
    }
}

// =============================================================================
// Router
// =============================================================================

/// The hash router seen from the guardrail.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashRouter;

impl RouterPort for HashRouter {
    fn current_path(&self) -> Option<String> {
        Some(Location::current().path)
    }

    fn replace(&mut self, path: &str) {
        Location::from_hash(path).replace();
    }
}

// =============================================================================
// Scroll
// =============================================================================

/// The document viewport.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowSurface;

impl ScrollSurface for WindowSurface {
    fn offset(&self) -> f64 {
        dom::window_scroll_y()
    }

    fn set_offset(&self, offset: f64) {
        dom::scroll_window_to(offset);
    }
}

/// Scroll records mirrored to sessionStorage.
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionPersistence;

impl SessionPersistence {
    /// `None` when sessionStorage is unreachable, so callers can fall back
    /// to memory only.
    pub fn available() -> Option<Self> {
        dom::session_storage().map(|_| Self)
    }
}

impl ScrollPersistence for SessionPersistence {
    fn load(&self) -> Result<Vec<ScrollRecord>> {
        Ok(storage::get(SCROLL_STORAGE_KEY)?.unwrap_or_default())
    }

    fn store(&self, records: &[ScrollRecord]) -> Result<()> {
        storage::set(SCROLL_STORAGE_KEY, &records)
    }
}
