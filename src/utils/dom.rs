//! DOM and Web API utility functions.
//!
//! Provides safe, consistent access to browser APIs with proper error handling.

use navstack_core::{CloseButtonHeuristics, CloseCandidate};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::Closure;
use web_sys::{Document, Element, HtmlElement, IdleRequestOptions, Storage, Window};

use crate::config::SCROLL_LOCK_CLASS;

/// Get the browser window object.
#[inline]
pub fn window() -> Option<Window> {
    web_sys::window()
}

#[inline]
pub fn document() -> Option<Document> {
    window()?.document()
}

#[inline]
pub fn body() -> Option<HtmlElement> {
    document()?.body()
}

/// Get sessionStorage.
#[inline]
pub fn session_storage() -> Option<Storage> {
    window()?.session_storage().ok()?
}

/// Text content of the element with `id`, if present and non-empty.
pub fn element_text(id: &str) -> Option<String> {
    let text = document()?.get_element_by_id(id)?.text_content()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Focus an element by CSS selector.
///
/// Returns `true` if the element was found and focused successfully.
pub fn focus_element(selector: &str) -> bool {
    if let Some(document) = document()
        && let Some(element) = document.query_selector(selector).ok().flatten()
        && let Ok(html_element) = element.dyn_into::<HtmlElement>()
    {
        html_element.focus().is_ok()
    } else {
        false
    }
}

// =============================================================================
// Scrolling
// =============================================================================

/// Vertical scroll offset of the window.
pub fn window_scroll_y() -> f64 {
    window().and_then(|w| w.scroll_y().ok()).unwrap_or(0.0)
}

/// Scrolls the window to `y` without smooth scrolling.
pub fn scroll_window_to(y: f64) {
    if let Some(window) = window() {
        window.scroll_to_with_x_and_y(0.0, y);
    }
}

/// Toggles the page scroll lock held while overlays are open.
pub fn set_scroll_lock(locked: bool) {
    let Some(body) = body() else { return };
    let classes = body.class_list();
    let result = if locked {
        classes.add_1(SCROLL_LOCK_CLASS)
    } else {
        classes.remove_1(SCROLL_LOCK_CLASS)
    };
    if result.is_err() {
        tracing::warn!(locked, "failed to toggle scroll lock");
    }
}

pub fn is_scroll_locked() -> bool {
    body().is_some_and(|b| b.class_list().contains(SCROLL_LOCK_CLASS))
}

// =============================================================================
// Scheduling
// =============================================================================

/// Runs `f` when the browser is idle, or after `timeout_ms` at the latest.
///
/// Falls back to a zero-delay timeout where `requestIdleCallback` is missing.
pub fn request_idle(timeout_ms: u32, f: impl FnOnce() + 'static) {
    let Some(window) = window() else { return };
    let callback = Closure::once_into_js(f);

    let options = IdleRequestOptions::new();
    options.set_timeout(timeout_ms);
    if window
        .request_idle_callback_with_options(callback.unchecked_ref(), &options)
        .is_err()
    {
        let _ = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), 0);
    }
}

// =============================================================================
// Close-button audit
// =============================================================================

/// Collects every clickable element inside mounted overlays.
pub fn collect_close_candidates(heuristics: &CloseButtonHeuristics) -> Vec<CloseCandidate> {
    let Some(document) = document() else {
        return Vec::new();
    };
    let Ok(roots) = document.query_selector_all(&heuristics.overlay_root_selector) else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    for i in 0..roots.length() {
        let Some(root) = roots.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let overlay_id = root.get_attribute("data-overlay-id");
        let Ok(clickables) = root.query_selector_all("button, a, [role='button']") else {
            continue;
        };
        for j in 0..clickables.length() {
            if let Some(element) = clickables.item(j).and_then(|n| n.dyn_into::<Element>().ok()) {
                candidates.push(describe(&element, overlay_id.clone(), heuristics));
            }
        }
    }
    candidates
}

fn describe(
    element: &Element,
    overlay_id: Option<String>,
    heuristics: &CloseButtonHeuristics,
) -> CloseCandidate {
    CloseCandidate {
        overlay_id,
        tag: element.tag_name().to_lowercase(),
        text: element.text_content().unwrap_or_default().trim().to_string(),
        aria_label: element.get_attribute("aria-label"),
        class_names: class_names(element),
        sanctioned: element.has_attribute(&heuristics.sanctioned_attribute),
    }
}

/// Classes of `element` and of its icon children. Read through the attribute
/// since `className` is not a string on SVG nodes.
fn class_names(element: &Element) -> String {
    let mut classes: Vec<String> = element.get_attribute("class").into_iter().collect();
    if let Ok(icons) = element.query_selector_all("svg, i, span") {
        for i in 0..icons.length() {
            if let Some(class) = icons
                .item(i)
                .and_then(|n| n.dyn_into::<Element>().ok())
                .and_then(|e| e.get_attribute("class"))
            {
                classes.push(class);
            }
        }
    }
    classes.join(" ")
}
