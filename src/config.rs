//! Application configuration.
//!
//! Centralizes the web-level constants. Tunables of the navigation core
//! (ceilings, intervals, retention) live in [`NavConfig`] and can be
//! overridden from the host page.

use navstack_core::NavConfig;

use crate::utils::dom;

// =============================================================================
// Application Metadata
// =============================================================================

/// Application name displayed in the header.
pub const APP_NAME: &str = "Fieldbook";

/// Number of demo clients generated on startup.
pub const DEMO_CLIENT_COUNT: u32 = 80;

// =============================================================================
// Navigation Configuration
// =============================================================================

/// Id of an optional `<script type="application/json">` element holding a
/// [`NavConfig`] override.
pub const NAV_CONFIG_ELEMENT_ID: &str = "navstack-config";

/// sessionStorage key for persisted scroll records.
pub const SCROLL_STORAGE_KEY: &str = "navstack.scroll";

/// Class placed on `<body>` while an overlay locks page scroll.
pub const SCROLL_LOCK_CLASS: &str = "navstack-scroll-lock";

/// Delay before auditing after a route change, so screens have re-rendered.
pub const SETTLE_DELAY_MS: u32 = 50;

/// How long a save action keeps the list scroll pinned.
pub const SAVE_PRESERVE_MS: u32 = 600;

/// Simulated latency of a save round trip in the demo.
pub const SAVE_LATENCY_MS: u32 = 250;

/// Entries in a client's activity history.
pub const ACTIVITY_ENTRIES: u32 = 30;

/// Loads the navigation config, falling back to defaults.
///
/// A malformed override is logged and ignored.
pub fn nav_config() -> NavConfig {
    let Some(raw) = dom::element_text(NAV_CONFIG_ELEMENT_ID) else {
        return NavConfig::default();
    };
    match NavConfig::from_json(&raw) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed navigation config");
            NavConfig::default()
        }
    }
}

// =============================================================================
// UI Configuration
// =============================================================================

/// Icon theme selection.
///
/// Available themes:
/// - `Bootstrap` - Familiar, slightly bolder (default)
/// - `Lucide` - Minimal, thin strokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(dead_code)]
pub enum IconTheme {
    #[default]
    Bootstrap,
    Lucide,
}

/// Current icon theme used throughout the application.
pub const ICON_THEME: IconTheme = IconTheme::Bootstrap;
