//! Navigation provider.
//!
//! Creates the application's [`Navigator`], provides it as [`NavContext`]
//! and wires the browser events it depends on:
//!
//! - `popstate` → back-action interception
//! - `hashchange` → location updates and a route-change audit
//! - `keydown` (Escape) → close request for the topmost overlay
//! - `visibilitychange`, `online` → audits after the page comes back
//! - `MutationObserver` on `<body>` → debounced audit after DOM bursts
//! - intervals for the periodic audit and scroll record cleanup

use std::sync::Arc;

use leptos::prelude::*;
use navstack_core::{GuardrailTrigger, Navigator, NoPersistence, ScrollPersistence};

use crate::app::NavContext;
use crate::config;
use crate::platform::{BrowserClock, SessionPersistence};
use crate::utils::dom;

#[component]
pub fn NavProvider(children: Children) -> impl IntoView {
    let config = config::nav_config();
    let guardrail_interval_ms = config.guardrail_interval_ms;
    let cleanup_interval_ms = config.scroll_cleanup_interval_ms;
    let debounce_ms = config.dom_scan_debounce_ms;

    let persistence: Box<dyn ScrollPersistence + Send + Sync> =
        match SessionPersistence::available() {
            Some(persistence) => Box::new(persistence),
            None => {
                tracing::warn!("sessionStorage unavailable, scroll positions kept in memory");
                Box::new(NoPersistence)
            }
        };
    let ctx = NavContext::new(Navigator::new(config, Arc::new(BrowserClock), persistence));
    provide_context(ctx);

    ctx.settle_history();

    // The page scroll lock follows the overlay count.
    Effect::new(move |_| {
        dom::set_scroll_lock(ctx.overlay_count() > 0);
    });

    #[cfg(target_arch = "wasm32")]
    {
        listeners::install(ctx, debounce_ms);
        listeners::every(guardrail_interval_ms, move || {
            ctx.run_guardrail(GuardrailTrigger::Interval)
        });
        listeners::every(cleanup_interval_ms, move || ctx.cleanup_scroll());
    }
    #[cfg(not(target_arch = "wasm32"))]
    let _ = (debounce_ms, guardrail_interval_ms, cleanup_interval_ms);

    ctx.schedule_guardrail(GuardrailTrigger::Mount);

    children()
}

#[cfg(target_arch = "wasm32")]
mod listeners {
    use std::cell::RefCell;
    use std::rc::Rc;

    use gloo_timers::callback::{Interval, Timeout};
    use navstack_core::{CloseTrigger, Debouncer, GuardrailTrigger, Navigator};
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::Closure;
    use web_sys::{
        Event, EventTarget, KeyboardEvent, MutationObserver, MutationObserverInit,
        VisibilityState,
    };

    use crate::app::NavContext;
    use crate::utils::dom;

    pub fn install(ctx: NavContext, debounce_ms: u32) {
        let (Some(window), Some(document)) = (dom::window(), dom::document()) else {
            tracing::warn!("no window, navigation listeners not installed");
            return;
        };

        listen(&window, "popstate", move |_| ctx.handle_pop());
        listen(&window, "hashchange", move |_| ctx.on_location_changed());
        listen(&window, "online", move |_| {
            ctx.run_guardrail(GuardrailTrigger::ConnectivityRegained)
        });

        listen(&document, "keydown", move |event| {
            let is_escape = event
                .dyn_ref::<KeyboardEvent>()
                .is_some_and(|e| e.key() == "Escape");
            if is_escape && ctx.read(Navigator::overlay_count).unwrap_or(0) > 0 {
                ctx.trigger_close(CloseTrigger::Escape);
            }
        });

        let visible_document = document.clone();
        listen(&document, "visibilitychange", move |_| {
            if visible_document.visibility_state() == VisibilityState::Visible {
                ctx.run_guardrail(GuardrailTrigger::VisibilityRegained);
            }
        });

        observe_mutations(ctx, debounce_ms);
    }

    /// Runs `f` every `ms` for the lifetime of the app.
    pub fn every(ms: u32, f: impl FnMut() + 'static) {
        Interval::new(ms, f).forget();
    }

    fn listen(target: &EventTarget, event: &str, handler: impl FnMut(Event) + 'static) {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        if target
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .is_err()
        {
            tracing::warn!(event, "failed to add event listener");
        }
        // Keep the closure alive for the lifetime of the app
        closure.forget();
    }

    fn observe_mutations(ctx: NavContext, debounce_ms: u32) {
        let Some(body) = dom::body() else { return };
        let debouncer = Rc::new(RefCell::new(Debouncer::new(debounce_ms)));

        let callback = Closure::<dyn FnMut()>::new(move || {
            debouncer.borrow_mut().record(js_sys::Date::now());
            let debouncer = Rc::clone(&debouncer);
            Timeout::new(debounce_ms, move || {
                if debouncer.borrow_mut().take_ready(js_sys::Date::now()) {
                    ctx.run_guardrail(GuardrailTrigger::DomMutation);
                }
            })
            .forget();
        });

        let observer = match MutationObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(_) => {
                tracing::warn!("MutationObserver unavailable, DOM audits limited to intervals");
                return;
            }
        };
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        if observer.observe_with_options(&body, &options).is_err() {
            tracing::warn!("failed to observe document body");
        }
        callback.forget();
    }
}
