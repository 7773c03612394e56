//! Client list screen.

use leptos::prelude::*;
use leptos_icons::Icon;
use navstack_core::OverlayKind;

use crate::app::{AppState, NavContext, use_nav};
use crate::components::clients::ClientEditor;
use crate::components::icons as ic;
use crate::components::overlay::Overlay;
use crate::components::screen::{ScreenAdapter, use_screen_context};
use crate::models::{AppRoute, Client, ClientStatus, Location, status_filter};

stylance::import_crate_style!(css, "src/components/clients/clients.module.css");
stylance::import_crate_style!(ui, "src/components/layout.module.css");

#[component]
pub fn ClientList() -> impl IntoView {
    let ctx = use_nav();
    let state = expect_context::<AppState>();

    let filter = Memo::new(move |_| status_filter(&ctx.location.get().search));
    let visible = Memo::new(move |_| {
        let filter = filter.get();
        state.clients.with(|clients| {
            clients
                .iter()
                .filter(|c| filter.is_none_or(|status| c.status == status))
                .cloned()
                .collect::<Vec<_>>()
        })
    });

    let filters_open = RwSignal::new(false);
    let creating = RwSignal::new(false);

    let apply_filter = move |status: Option<ClientStatus>| {
        filters_open.set(false);
        let search = status
            .map(|s| format!("?status={}", s.slug()))
            .unwrap_or_default();
        ctx.navigate(Location {
            path: AppRoute::Clients.to_path(),
            search,
        });
    };

    let on_created = Callback::new(move |client: Client| {
        ctx.navigate(AppRoute::Client(client.id).location());
    });

    view! {
        <ScreenAdapter screen_id="clients" class=ui::screen>
            <div class=css::toolbar>
                <h1 class=css::heading>
                    "Clients"
                    <span class=css::count>{move || visible.with(Vec::len)}</span>
                </h1>
                <div class=css::toolbarActions>
                    <button type="button" class=ui::button on:click=move |_| filters_open.set(true)>
                        <Icon icon=ic::FILTER />
                        <span>
                            {move || filter.get().map_or("All", |s| s.label())}
                        </span>
                    </button>
                    <button type="button" class=ui::primaryButton on:click=move |_| creating.set(true)>
                        <Icon icon=ic::PLUS />
                        <span>"New client"</span>
                    </button>
                </div>
            </div>

            <ul class=css::list>
                <For
                    each=move || visible.get()
                    key=|client| client.clone()
                    children=move |client| view! { <ClientRow client=client ctx=ctx /> }
                />
            </ul>

            <Overlay
                id="filters-drawer"
                kind=OverlayKind::Drawer
                open=filters_open
                on_close=Callback::new(move |_: ()| filters_open.set(false))
                title="Filters"
            >
                <div class=css::filterOptions>
                    <FilterOption
                        label="All"
                        selected=Signal::derive(move || filter.get().is_none())
                        on_pick=Callback::new(move |_: ()| apply_filter(None))
                    />
                    {ClientStatus::ALL
                        .into_iter()
                        .map(|status| view! {
                            <FilterOption
                                label=status.label()
                                selected=Signal::derive(move || filter.get() == Some(status))
                                on_pick=Callback::new(move |_: ()| apply_filter(Some(status)))
                            />
                        })
                        .collect_view()}
                </div>
            </Overlay>

            <ClientEditor open=creating client=Signal::stored(None) on_saved=on_created />
        </ScreenAdapter>
    }
}

#[component]
fn ClientRow(client: Client, ctx: NavContext) -> impl IntoView {
    let screen = use_screen_context();
    let target = AppRoute::Client(client.id).location();

    let open_client = move |_| {
        // A screen on its way out must not navigate.
        if screen.is_active.get_untracked() {
            ctx.navigate(target.clone());
        }
    };

    view! {
        <li>
            <button type="button" class=css::row on:click=open_client>
                <span class=css::avatar><Icon icon=ic::USER /></span>
                <span class=css::rowText>
                    <span class=css::rowName>{client.name}</span>
                    <span class=css::rowCompany>{client.company}</span>
                </span>
                <StatusBadge status=client.status />
            </button>
        </li>
    }
}

#[component]
fn FilterOption(
    label: &'static str,
    selected: Signal<bool>,
    on_pick: Callback<()>,
) -> impl IntoView {
    let class = move || {
        if selected.get() {
            format!("{} {}", css::filterOption, css::filterOptionSelected)
        } else {
            css::filterOption.to_string()
        }
    };

    view! {
        <button type="button" class=class on:click=move |_| on_pick.run(())>
            {label}
        </button>
    }
}

/// Colored status pill.
#[component]
pub fn StatusBadge(status: ClientStatus) -> impl IntoView {
    let tone = match status {
        ClientStatus::Active => css::statusActive,
        ClientStatus::Prospect => css::statusProspect,
        ClientStatus::Dormant => css::statusDormant,
    };

    view! { <span class=format!("{} {}", css::status, tone)>{status.label()}</span> }
}
