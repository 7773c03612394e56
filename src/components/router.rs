//! Application router component.
//!
//! The URL hash is the source of truth. [`NavContext::location`] follows
//! `hashchange` (wired by the provider); the router derives the current
//! [`AppRoute`] from it and renders the matching screen. The header stays
//! mounted across navigations.

use leptos::prelude::*;
use leptos_icons::Icon;

use crate::app::{NavContext, use_nav};
use crate::components::clients::{ClientDetail, ClientList};
use crate::components::icons as ic;
use crate::components::screen::ScreenAdapter;
use crate::components::settings::SettingsScreen;
use crate::config::APP_NAME;
use crate::models::AppRoute;

stylance::import_crate_style!(css, "src/components/layout.module.css");

// ============================================================================
// Main Router
// ============================================================================

/// Main application router.
///
/// - `#/`, `#/clients` → client list (`?status=` filters it)
/// - `#/clients/{id}` → client detail
/// - `#/settings` → settings and debug panel
#[component]
pub fn AppRouter() -> impl IntoView {
    let ctx = use_nav();

    // Query-only changes keep the same route and must not remount the screen.
    let route = Memo::new(move |_| AppRoute::from_path(&ctx.location.get().path));

    view! {
        <div class=css::shell>
            <TopBar route=route />
            <main class=css::content>
                {move || match route.get() {
                    AppRoute::Clients => view! { <ClientList /> }.into_any(),
                    AppRoute::Client(id) => view! { <ClientDetail client_id=id /> }.into_any(),
                    AppRoute::Settings => view! { <SettingsScreen /> }.into_any(),
                    AppRoute::NotFound => view! { <NotFound /> }.into_any(),
                }}
            </main>
        </div>
    }
}

// ============================================================================
// Header
// ============================================================================

#[component]
fn TopBar(route: Memo<AppRoute>) -> impl IntoView {
    let ctx = use_nav();

    let on_clients = Signal::derive(move || {
        matches!(route.get(), AppRoute::Clients | AppRoute::Client(_))
    });
    let on_settings = Signal::derive(move || route.get() == AppRoute::Settings);
    let overlays = Signal::derive(move || ctx.overlay_count());

    view! {
        <header class=css::topBar>
            <span class=css::brand>{APP_NAME}</span>
            <nav class=css::nav>
                <NavLink
                    ctx=ctx
                    target=AppRoute::Clients
                    active=on_clients
                    icon=ic::CLIENTS
                    label="Clients"
                />
                <NavLink
                    ctx=ctx
                    target=AppRoute::Settings
                    active=on_settings
                    icon=ic::SETTINGS
                    label="Settings"
                />
            </nav>
            <Show when=move || { overlays.get() > 0 }>
                <span class=css::overlayBadge title="Open overlays">
                    {move || overlays.get()}
                </span>
            </Show>
        </header>
    }
}

#[component]
fn NavLink(
    ctx: NavContext,
    target: AppRoute,
    active: Signal<bool>,
    icon: icondata::Icon,
    label: &'static str,
) -> impl IntoView {
    let location = target.location();
    let class = move || {
        if active.get() {
            format!("{} {}", css::navLink, css::navLinkActive)
        } else {
            css::navLink.to_string()
        }
    };

    view! {
        <button type="button" class=class on:click=move |_| ctx.navigate(location.clone())>
            <Icon icon=icon />
            <span>{label}</span>
        </button>
    }
}

// ============================================================================
// Not Found
// ============================================================================

#[component]
fn NotFound() -> impl IntoView {
    let ctx = use_nav();

    view! {
        <ScreenAdapter screen_id="not-found" class=css::screen>
            <div class=css::empty>
                <h1>"Nothing here"</h1>
                <p>{move || format!("No screen matches {}", ctx.location.get().path)}</p>
                <button
                    type="button"
                    class=css::primaryButton
                    on:click=move |_| ctx.navigate(AppRoute::Clients.location())
                >
                    "Back to clients"
                </button>
            </div>
        </ScreenAdapter>
    }
}
