//! UI components built with Leptos.
//!
//! - [`provider`] - Navigation context and browser event wiring
//! - [`overlay`] - Dialogs, sheets and drawers bound to the overlay registry
//! - [`screen`] - Screen adapter for routed views
//! - [`router`] - Application routing (main entry point)
//! - [`clients`] - Demo client list and detail screens
//! - [`settings`] - Settings and debug panel
//! - [`icons`] - Centralized icon definitions (change theme here)

pub mod clients;
pub mod icons;
pub mod overlay;
pub mod provider;
pub mod router;
pub mod screen;
pub mod settings;

pub use overlay::{Overlay, OverlayCloseButton, OverlayHandle, use_overlay};
pub use provider::NavProvider;
pub use router::AppRouter;
pub use screen::{ScreenAdapter, ScreenContext, use_screen_context};
