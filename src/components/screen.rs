//! Screen adapter.
//!
//! Wraps a routed screen: registers it with the screen registry, tracks
//! whether it is the active screen, restores its scroll offset once the
//! browser is idle and saves it again when the screen goes away.

use leptos::html;
use leptos::prelude::*;
use navstack_core::{Activation, ActivationTracker, LogCategory, validate_screen_context};
use serde_json::json;

use crate::app::{NavContext, use_nav};
use crate::models::{AppRoute, Location};
use crate::utils::dom;

/// What a screen's descendants can ask about the screen they render in.
#[derive(Clone)]
pub struct ScreenContext {
    pub screen_id: String,
    /// Top of the screen stack and matching the router's path.
    pub is_active: Signal<bool>,
    pub container_ref: NodeRef<html::Div>,
}

/// Returns the enclosing screen. Panics outside of a [`ScreenAdapter`].
pub fn use_screen_context() -> ScreenContext {
    use_context::<ScreenContext>()
        .expect("use_screen_context must be called inside a ScreenAdapter")
}

#[component]
pub fn ScreenAdapter(
    /// Stable id; generated when omitted.
    #[prop(optional, into)]
    screen_id: Option<String>,
    #[prop(optional, into)] on_activate: Option<Callback<()>>,
    #[prop(optional, into)] on_deactivate: Option<Callback<()>>,
    #[prop(optional, into)] class: Option<String>,
    children: Children,
) -> impl IntoView {
    let ctx = use_nav();
    let container_ref = NodeRef::<html::Div>::new();
    let mounted_at = ctx.location.get_untracked();

    let Some(id) = ctx.mount_screen(screen_id, &mounted_at.path) else {
        return view! { <div class=class>{children()}</div> }.into_any();
    };

    let active_id = id.clone();
    let is_active = Signal::derive(move || ctx.is_screen_active(&active_id));

    let tracker = StoredValue::new(ActivationTracker::default());
    Effect::new(move |_| {
        let active = is_active.get();
        match tracker.try_update_value(|t| t.observe(active)).flatten() {
            Some(Activation::Activated) => {
                if let Some(cb) = on_activate {
                    cb.run(());
                }
            }
            Some(Activation::Deactivated) => {
                if let Some(cb) = on_deactivate {
                    cb.run(());
                }
            }
            None => {}
        }
    });

    // The screen stays mounted when the location changes within its route
    // (new query string, alias path) and follows it.
    let route = AppRoute::from_path(&mounted_at.path);
    let follow_id = id.clone();
    Effect::new(move |previous: Option<Location>| {
        let location = ctx.location.get();
        let moved = previous.is_some_and(|p| p != location);
        if moved && AppRoute::from_path(&location.path) == route {
            ctx.update_screen_path(&follow_id, &location.path);
            schedule_restore(ctx, follow_id.clone(), container_ref, location.clone());
        }
        location
    });

    schedule_restore(ctx, id.clone(), container_ref, mounted_at);

    let cleanup_id = id.clone();
    on_cleanup(move || {
        // After a route change the offset was already saved under the
        // previous key; only an in-place unmount saves here.
        let location = ctx.location.get_untracked();
        let in_place = ctx
            .read(|nav| nav.screen(&cleanup_id).is_some_and(|s| s.path == location.path))
            .unwrap_or(false);
        if in_place {
            ctx.save_scroll_position(location.route_key(), None);
        }
        ctx.unmount_screen(&cleanup_id);
    });

    provide_context(ScreenContext {
        screen_id: id.clone(),
        is_active,
        container_ref,
    });

    view! {
        <div
            node_ref=container_ref
            class=class
            data-screen-id=id
            data-active=move || is_active.get().to_string()
        >
            {children()}
        </div>
    }
    .into_any()
}

/// Restores the offset saved for `location` once the browser is idle.
fn schedule_restore(
    ctx: NavContext,
    id: String,
    container_ref: NodeRef<html::Div>,
    location: Location,
) {
    let timeout_ms = ctx
        .read(|nav| nav.config().restore_idle_timeout_ms)
        .unwrap_or_default();

    dom::request_idle(timeout_ms, move || {
        let attached = container_ref
            .get_untracked()
            .is_some_and(|el| el.is_connected());
        if let Err(e) = validate_screen_context(&id, attached) {
            tracing::warn!(error = %e, "screen not restorable");
            return;
        }
        let key = location.route_key();
        let restored = ctx.restore_scroll_position(&key);
        ctx.log(
            LogCategory::Screen,
            "restore",
            Some(json!({ "id": id, "key": key.as_str(), "position": restored })),
        );
    });
}
