//! Client detail screen.

use leptos::prelude::*;
use leptos_icons::Icon;
use navstack_core::OverlayKind;

use super::list::StatusBadge;
use crate::app::{AppState, use_nav};
use crate::components::clients::ClientEditor;
use crate::components::icons as ic;
use crate::components::overlay::Overlay;
use crate::components::screen::ScreenAdapter;
use crate::config::ACTIVITY_ENTRIES;
use crate::models::{AppRoute, activity_log};

stylance::import_crate_style!(css, "src/components/clients/clients.module.css");
stylance::import_crate_style!(ui, "src/components/layout.module.css");

#[component]
pub fn ClientDetail(client_id: u32) -> impl IntoView {
    let ctx = use_nav();
    let state = expect_context::<AppState>();
    let client = Memo::new(move |_| state.client(client_id));

    let details_open = RwSignal::new(false);
    let editing = RwSignal::new(false);

    let on_activate = Callback::new(move |_: ()| {
        tracing::debug!(client_id, "client screen active");
    });

    view! {
        <ScreenAdapter
            screen_id=format!("client-{}", client_id)
            class=ui::screen
            on_activate=on_activate
        >
            <div class=css::toolbar>
                <button
                    type="button"
                    class=ui::button
                    on:click=move |_| ctx.navigate(AppRoute::Clients.location())
                >
                    <Icon icon=ic::BACK />
                    <span>"Clients"</span>
                </button>
                <div class=css::toolbarActions>
                    <button
                        type="button"
                        class=ui::button
                        disabled=move || client.with(Option::is_none)
                        on:click=move |_| details_open.set(true)
                    >
                        <Icon icon=ic::DETAILS />
                        <span>"Details"</span>
                    </button>
                    <button
                        type="button"
                        class=ui::primaryButton
                        disabled=move || client.with(Option::is_none)
                        on:click=move |_| editing.set(true)
                    >
                        <Icon icon=ic::EDIT />
                        <span>"Edit"</span>
                    </button>
                </div>
            </div>

            {move || match client.get() {
                Some(c) => view! {
                    <article class=css::profile>
                        <h1 class=css::heading>{c.name.clone()}</h1>
                        <p class=css::rowCompany>{c.company.clone()}</p>
                        <StatusBadge status=c.status />
                    </article>
                }
                .into_any(),
                None => view! {
                    <div class=ui::empty>
                        <p>{format!("Client #{} does not exist.", client_id)}</p>
                    </div>
                }
                .into_any(),
            }}

            <h2 class=css::subheading>"Activity"</h2>
            <ol class=css::activity>
                {activity_log(client_id, ACTIVITY_ENTRIES)
                    .into_iter()
                    .map(|entry| view! { <li>{entry}</li> })
                    .collect_view()}
            </ol>

            <Overlay
                id="details-sheet"
                kind=OverlayKind::Sheet
                open=details_open
                on_close=Callback::new(move |_: ()| details_open.set(false))
                title="Details"
            >
                {move || client.get().map(|c| view! {
                    <dl class=css::details>
                        <dt>"Company"</dt>
                        <dd>{c.company}</dd>
                        <dt>"Status"</dt>
                        <dd>{c.status.label()}</dd>
                        <dt>"Notes"</dt>
                        <dd>
                            {if c.notes.is_empty() { "No notes yet.".to_string() } else { c.notes }}
                        </dd>
                    </dl>
                })}
            </Overlay>

            <ClientEditor open=editing client=client />
        </ScreenAdapter>
    }
}
