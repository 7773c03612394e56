//! Settings screen.
//!
//! Shows the active navigation configuration and, when the debug sink is
//! enabled, the [`DebugPanel`].

mod debug;

use leptos::prelude::*;
use navstack_core::{GuardrailTrigger, Navigator};

use crate::app::use_nav;
use crate::components::screen::ScreenAdapter;

pub use debug::DebugPanel;

stylance::import_crate_style!(css, "src/components/settings/settings.module.css");
stylance::import_crate_style!(ui, "src/components/layout.module.css");

#[component]
pub fn SettingsScreen() -> impl IntoView {
    let ctx = use_nav();
    let config = ctx.read(|nav| nav.config().clone()).unwrap_or_default();
    let attempts = RwSignal::new(ctx.read(Navigator::guardrail_attempts).unwrap_or(0));
    let rows = ctx.read(navigation_rows).unwrap_or_default();

    let run_audit = move |_| {
        ctx.run_guardrail(GuardrailTrigger::Manual);
        attempts.set(ctx.read(Navigator::guardrail_attempts).unwrap_or(0));
    };
    let reset = move |_| {
        ctx.reset_guardrail();
        attempts.set(0);
    };

    view! {
        <ScreenAdapter screen_id="settings" class=ui::screen>
            <h1 class=css::heading>"Settings"</h1>

            <section class=css::card>
                <h2>"Navigation"</h2>
                <dl class=css::table>
                    {rows
                        .into_iter()
                        .map(|(label, value)| view! {
                            <dt>{label}</dt>
                            <dd>{value}</dd>
                        })
                        .collect_view()}
                </dl>
            </section>

            <section class=css::card>
                <h2>"Guardrail"</h2>
                <p>
                    {move || format!(
                        "{} of {} recovery attempts used.",
                        attempts.get(),
                        config.max_recovery_attempts,
                    )}
                </p>
                <div class=css::buttons>
                    <button type="button" class=ui::button on:click=run_audit>"Run audit"</button>
                    <button type="button" class=ui::button on:click=reset>"Reset attempts"</button>
                </div>
            </section>

            <Show when=move || ctx.debug_enabled()>
                <DebugPanel />
            </Show>
        </ScreenAdapter>
    }
}

/// Label/value pairs for the navigation card.
///
/// The audit row reflects whether the audit actually runs, which is off when
/// the configured heuristics fail to compile.
fn navigation_rows(nav: &Navigator) -> Vec<(&'static str, String)> {
    let config = nav.config();
    vec![
        ("Overlay ceiling", config.max_overlays.to_string()),
        ("Recovery attempts", config.max_recovery_attempts.to_string()),
        ("Audit interval", format!("{} ms", config.guardrail_interval_ms)),
        ("Scroll retention", format!("{} min", config.scroll_retention_ms / 60_000.0)),
        ("Close-button audit", on_off(nav.dom_audit_enabled()).to_string()),
        ("Debug sink", on_off(config.debug_enabled).to_string()),
    ]
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
