//! Client edit dialog.
//!
//! Closing with unsaved changes opens a nested `confirm-exit` dialog instead
//! of closing, so a back action first asks before discarding the draft.

use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use navstack_core::OverlayKind;
use wasm_bindgen_futures::spawn_local;

use crate::app::{AppState, use_nav};
use crate::components::overlay::Overlay;
use crate::config::{SAVE_LATENCY_MS, SAVE_PRESERVE_MS};
use crate::models::{Client, ClientStatus};

stylance::import_crate_style!(css, "src/components/clients/clients.module.css");
stylance::import_crate_style!(ui, "src/components/layout.module.css");

/// Edit dialog for a client. `client` is `None` when creating one.
#[component]
pub fn ClientEditor(
    open: RwSignal<bool>,
    #[prop(into)] client: Signal<Option<Client>>,
    #[prop(optional, into)] on_saved: Option<Callback<Client>>,
) -> impl IntoView {
    let ctx = use_nav();
    let state = expect_context::<AppState>();

    let blank = move || Client {
        id: state.next_id(),
        name: String::new(),
        company: String::new(),
        status: ClientStatus::Prospect,
        notes: String::new(),
    };
    let baseline = RwSignal::new(client.get_untracked().unwrap_or_else(blank));
    let draft = RwSignal::new(baseline.get_untracked());
    let saving = RwSignal::new(false);
    let confirm_open = RwSignal::new(false);

    // Every opening starts from the stored record.
    Effect::new(move |was_open: Option<bool>| {
        let is_open = open.get();
        if is_open && was_open != Some(true) {
            let record = client.get_untracked().unwrap_or_else(blank);
            baseline.set(record.clone());
            draft.set(record);
        }
        is_open
    });

    let dirty = Memo::new(move |_| draft.with(|d| baseline.with(|b| d != b)));

    let on_close = Callback::new(move |_: ()| {
        if saving.get_untracked() {
            return;
        }
        if dirty.get_untracked() && !ctx.is_force_closing() {
            confirm_open.set(true);
        } else {
            open.set(false);
        }
    });

    let discard = move |_| {
        confirm_open.set(false);
        draft.set(baseline.get_untracked());
        open.set(false);
    };

    let save = move |_| {
        if saving.get_untracked() {
            return;
        }
        let record = draft.get_untracked();
        if record.name.trim().is_empty() {
            return;
        }
        saving.set(true);
        spawn_local(async move {
            let stored = record.clone();
            ctx.preserve_scroll_during_action(SAVE_PRESERVE_MS, move || async move {
                TimeoutFuture::new(SAVE_LATENCY_MS).await;
                state.upsert(stored);
            })
            .await;
            tracing::debug!(id = record.id, "client saved");
            baseline.set(record.clone());
            saving.set(false);
            open.set(false);
            if let Some(cb) = on_saved {
                cb.run(record);
            }
        });
    };

    let title = if client.get_untracked().is_some() {
        "Edit client"
    } else {
        "New client"
    };

    view! {
        <Overlay id="edit-client" kind=OverlayKind::Dialog open=open on_close=on_close title=title>
            <form class=css::form on:submit=|ev| ev.prevent_default()>
                <label class=css::field>
                    <span>"Name"</span>
                    <input
                        type="text"
                        prop:value=move || draft.with(|d| d.name.clone())
                        on:input=move |ev| draft.update(|d| d.name = event_target_value(&ev))
                    />
                </label>
                <label class=css::field>
                    <span>"Company"</span>
                    <input
                        type="text"
                        prop:value=move || draft.with(|d| d.company.clone())
                        on:input=move |ev| draft.update(|d| d.company = event_target_value(&ev))
                    />
                </label>
                <label class=css::field>
                    <span>"Status"</span>
                    <select on:change=move |ev| {
                        if let Some(status) = ClientStatus::from_slug(&event_target_value(&ev)) {
                            draft.update(|d| d.status = status);
                        }
                    }>
                        {ClientStatus::ALL
                            .into_iter()
                            .map(|status| view! {
                                <option
                                    value=status.slug()
                                    prop:selected=move || draft.with(|d| d.status == status)
                                >
                                    {status.label()}
                                </option>
                            })
                            .collect_view()}
                    </select>
                </label>
                <label class=css::field>
                    <span>"Notes"</span>
                    <textarea
                        rows="4"
                        prop:value=move || draft.with(|d| d.notes.clone())
                        on:input=move |ev| draft.update(|d| d.notes = event_target_value(&ev))
                    />
                </label>
            </form>
            <div class=css::actions>
                <button type="button" class=ui::button on:click=move |_| on_close.run(())>
                    "Cancel"
                </button>
                <button
                    type="button"
                    class=ui::primaryButton
                    disabled=move || saving.get()
                    on:click=save
                >
                    {move || if saving.get() { "Saving…" } else { "Save" }}
                </button>
            </div>
        </Overlay>

        <Overlay
            id="confirm-exit"
            kind=OverlayKind::Dialog
            open=confirm_open
            on_close=Callback::new(move |_: ()| confirm_open.set(false))
            title="Discard changes?"
        >
            <p>"Your edits to this client have not been saved."</p>
            <div class=css::actions>
                <button type="button" class=ui::button on:click=move |_| confirm_open.set(false)>
                    "Keep editing"
                </button>
                <button type="button" class=ui::dangerButton on:click=discard>
                    "Discard"
                </button>
            </div>
        </Overlay>
    }
}
