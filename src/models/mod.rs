//! Data models and types for the application.
//!
//! - [`Location`], [`AppRoute`] - Hash-based navigation
//! - [`Client`], [`ClientStatus`] - Demo business records

mod client;
mod route;

pub use client::{Client, ClientStatus, activity_log, demo_clients, status_filter};
pub use route::{AppRoute, Location};
