//! Overlay surfaces: dialogs, sheets and drawers.
//!
//! Every overlay goes through [`use_overlay`], which keeps the registry in
//! step with the overlay's open state and lets it consume close requests
//! while it is topmost. [`Overlay`] is the shared shell for all kinds and
//! [`OverlayCloseButton`] the one dismiss control the close-button audit
//! accepts.

use leptos::prelude::*;
use leptos_icons::Icon;
use navstack_core::{CloseConsumer, CloseTrigger, OverlayKind, OverlayRegistration};

use crate::app::{NavContext, use_nav};
use crate::components::icons as ic;
use crate::utils::dom;

stylance::import_crate_style!(css, "src/components/overlay.module.css");

// ============================================================================
// Hook
// ============================================================================

/// Handle to a registered overlay.
#[derive(Clone, Copy)]
pub struct OverlayHandle {
    id: StoredValue<String>,
    ctx: NavContext,
    /// True while this overlay is the topmost open one.
    pub is_topmost: Signal<bool>,
}

impl OverlayHandle {
    /// Asks the close coordinator to close this overlay if it is topmost.
    /// The overlay's own consumer then runs its close handler.
    pub fn dismiss(&self, trigger: CloseTrigger) -> bool {
        if !self.is_topmost.get_untracked() {
            return false;
        }
        self.ctx.trigger_close(trigger);
        true
    }
}

/// Registers an overlay for as long as the calling component lives.
///
/// `on_close` is what the overlay does to close itself (usually setting
/// `open` to false); it runs when a close request reaches this overlay.
pub fn use_overlay(
    id: impl Into<String>,
    kind: OverlayKind,
    open: Signal<bool>,
    on_close: Callback<()>,
) -> OverlayHandle {
    let ctx = use_nav();
    let id: String = id.into();
    let instance = ctx.next_overlay_instance();
    let consumer = StoredValue::new(CloseConsumer::starting_at(
        ctx.close_signal.get_untracked(),
    ));
    let stored_id = StoredValue::new(id.clone());

    Effect::new(move |_| {
        let is_open = open.get();
        let id = stored_id.get_value();
        let registration = if is_open {
            // Requests issued before the overlay opened are not for it.
            consumer.set_value(CloseConsumer::starting_at(ctx.close_signal.get_untracked()));
            OverlayRegistration::open(id, kind, move || on_close.run(()))
        } else {
            OverlayRegistration::closed(id)
        };
        ctx.report_overlay(registration.instance(instance));
    });

    Effect::new(move |_| {
        let signal = ctx.close_signal.get();
        if signal.should_close && open.get_untracked() {
            let id = stored_id.get_value();
            ctx.consume_close(consumer, &id);
        }
    });

    on_cleanup(move || ctx.unregister_overlay(&id, instance));

    OverlayHandle {
        id: stored_id,
        ctx,
        is_topmost: Signal::derive(move || stored_id.with_value(|id| ctx.is_topmost(id))),
    }
}

// ============================================================================
// Shell
// ============================================================================

#[derive(Clone, Copy)]
struct OverlayScope(OverlayHandle);

/// Shared shell for every overlay kind.
#[component]
pub fn Overlay(
    #[prop(into)] id: String,
    #[prop(optional)] kind: OverlayKind,
    #[prop(into)] open: Signal<bool>,
    #[prop(into)] on_close: Callback<()>,
    #[prop(optional, into)] title: Option<String>,
    children: ChildrenFn,
) -> impl IntoView {
    let handle = use_overlay(id.clone(), kind, open, on_close);
    provide_context(OverlayScope(handle));

    let panel_class = format!(
        "{} {}",
        css::panel,
        match kind {
            OverlayKind::Dialog => css::dialog,
            OverlayKind::Sheet => css::sheet,
            OverlayKind::Drawer => css::drawer,
        }
    );

    let selector = format!("[data-overlay-id='{}']", id);
    Effect::new(move |_| {
        if open.get() {
            dom::focus_element(&selector);
        }
    });

    let on_backdrop = move |_| {
        handle.dismiss(CloseTrigger::Backdrop);
    };

    view! {
        <Show when=move || open.get()>
            <div class=css::layer>
                <div class=css::backdrop on:click=on_backdrop />
                <section
                    class=panel_class.clone()
                    tabindex="-1"
                    role=kind.aria_role()
                    aria-modal="true"
                    aria-label=title.clone()
                    data-overlay-root=""
                    data-overlay-id=id.clone()
                    data-overlay-kind=kind.as_str()
                    data-topmost=move || handle.is_topmost.get().to_string()
                >
                    {title.clone().map(|title| view! {
                        <header class=css::header>
                            <h2 class=css::title>{title}</h2>
                            <OverlayCloseButton />
                        </header>
                    })}
                    <div class=css::body>{children()}</div>
                </section>
            </div>
        </Show>
    }
}

/// The sanctioned dismiss control. Must be rendered inside an [`Overlay`].
#[component]
pub fn OverlayCloseButton(#[prop(optional, into)] label: Option<String>) -> impl IntoView {
    let OverlayScope(handle) =
        use_context::<OverlayScope>().expect("OverlayCloseButton must be used inside an Overlay");
    let label = label.unwrap_or_else(|| "Close".to_string());

    view! {
        <button
            type="button"
            class=css::closeButton
            aria-label=label
            data-overlay-close=""
            on:click=move |_| {
                handle.dismiss(CloseTrigger::Button);
            }
        >
            <Icon icon=ic::CLOSE />
        </button>
    }
}
