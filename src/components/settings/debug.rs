//! In-app view of the navigation debug sink.

use leptos::prelude::*;
use leptos_icons::Icon;
use navstack_core::{DebugEntry, LogCategory, Navigator};
use serde::Serialize;

use crate::app::use_nav;
use crate::components::icons as ic;

stylance::import_crate_style!(css, "src/components/settings/settings.module.css");
stylance::import_crate_style!(ui, "src/components/layout.module.css");

/// Most recent entries shown in the panel.
const VISIBLE_ENTRIES: usize = 100;

#[component]
pub fn DebugPanel() -> impl IntoView {
    let ctx = use_nav();
    let entries = RwSignal::new(Vec::<DebugEntry>::new());
    let refresh = move || entries.set(ctx.logs());
    refresh();

    let export = move |_| {
        let Some(json) = ctx.read(Navigator::export_logs) else {
            return;
        };
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        match serde_json::from_str::<serde_json::Value>(&json)
            .ok()
            .and_then(|value| value.serialize(&serializer).ok())
        {
            Some(value) => web_sys::console::log_1(&value),
            None => tracing::warn!("debug log export failed"),
        }
    };

    view! {
        <section class=css::card>
            <h2 class=css::panelTitle>
                <Icon icon=ic::DEBUG />
                <span>"Debug log"</span>
            </h2>

            <div class=css::categories>
                {LogCategory::ALL
                    .into_iter()
                    .map(|category| view! { <CategoryToggle category=category /> })
                    .collect_view()}
            </div>

            <div class=css::buttons>
                <button type="button" class=ui::button on:click=move |_| refresh()>"Refresh"</button>
                <button type="button" class=ui::button on:click=export>"Export to console"</button>
                <button
                    type="button"
                    class=ui::dangerButton
                    on:click=move |_| {
                        ctx.clear_logs();
                        refresh();
                    }
                >
                    "Clear"
                </button>
            </div>

            <ol class=css::log>
                {move || {
                    entries.with(|all| {
                        all.iter()
                            .rev()
                            .take(VISIBLE_ENTRIES)
                            .map(|entry| view! { <LogLine entry=entry.clone() /> })
                            .collect_view()
                    })
                }}
            </ol>
        </section>
    }
}

#[component]
fn CategoryToggle(category: LogCategory) -> impl IntoView {
    let ctx = use_nav();
    let enabled = RwSignal::new(
        ctx.read(|nav| nav.is_category_enabled(category))
            .unwrap_or(true),
    );

    view! {
        <label class=css::toggle>
            <input
                type="checkbox"
                prop:checked=move || enabled.get()
                on:change=move |ev| {
                    let on = event_target_checked(&ev);
                    enabled.set(on);
                    ctx.toggle_category(category, on);
                }
            />
            <span>{category.as_str()}</span>
        </label>
    }
}

#[component]
fn LogLine(entry: DebugEntry) -> impl IntoView {
    let details = entry
        .details
        .as_ref()
        .map(|d| d.to_string())
        .unwrap_or_default();

    view! {
        <li class=css::logLine>
            <span class=css::logTime>{format!("{:.0}", entry.timestamp)}</span>
            <span class=css::logCategory>{entry.category.as_str()}</span>
            <span class=css::logAction>{entry.action}</span>
            <code class=css::logDetails>{details}</code>
        </li>
    }
}
