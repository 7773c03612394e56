//! Platform-independent navigation state for overlay-heavy web apps.
//!
//! - [`overlay`]: which dialog, sheet or drawer is topmost
//! - [`close`]: the global close signal and back-action interception
//! - [`screen`]: mounted screens and their activation
//! - [`scroll`]: per-route scroll memory and drift correction
//! - [`guardrail`]: invariant checks with bounded recovery
//! - [`navigator`]: the facade a UI binding talks to
//!
//! Everything that touches the browser goes through the traits in
//! [`platform`].

pub mod close;
pub mod config;
pub mod debug;
pub mod error;
pub mod guardrail;
pub mod navigator;
pub mod overlay;
pub mod platform;
pub mod ring_buffer;
pub mod screen;
pub mod scroll;

pub use close::{CloseConsumer, CloseSignal, CloseState, CloseTrigger, PopOutcome};
pub use config::{CloseButtonHeuristics, NavConfig};
pub use debug::{DebugEntry, DebugSink, LogCategory};
pub use error::{NavError, Result};
pub use guardrail::{
    CloseCandidate, Debouncer, GuardrailReport, GuardrailTrigger, Recovery, Violation,
};
pub use navigator::{GuardrailEnv, GuardrailOutcome, Navigator};
pub use overlay::{CloseHandler, OverlayKind, OverlayRegistration, RegisterOutcome};
pub use platform::{
    Clock, HistoryPort, ManualClock, NoPersistence, RouterPort, ScrollPersistence, ScrollSurface,
    Timers,
};
pub use ring_buffer::RingBuffer;
pub use screen::{Activation, ActivationTracker, ScreenEntry, validate_screen_context};
pub use scroll::{PreserveFlag, PreserveOptions, RouteKey, ScrollRecord, preserve_during_action};
