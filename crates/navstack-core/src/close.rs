//! Global close coordinator.
//!
//! Holds the process-wide [`CloseSignal`] and turns the platform back action
//! into a close request while any overlay is open. A synthetic history entry
//! sits on top of the real one so that "back" produces a notification instead
//! of leaving the page.
//!
//! ```text
//!   Idle ──trigger_close──▶ CloseRequested(n) ──reset_close──▶ Idle
//! ```

use std::fmt;

use serde::Serialize;

use crate::platform::HistoryPort;

// ============================================================================
// Signal
// ============================================================================

/// The read side of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CloseSignal {
    pub should_close: bool,
    /// Incremented on every trigger, never reset.
    pub close_id: u64,
}

/// Observable coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseState {
    Idle,
    CloseRequested(u64),
}

/// What asked for the close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseTrigger {
    Button,
    Backdrop,
    BackAction,
    Escape,
    Programmatic,
}

impl fmt::Display for CloseTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Button => "button",
            Self::Backdrop => "backdrop",
            Self::BackAction => "back_action",
            Self::Escape => "escape",
            Self::Programmatic => "programmatic",
        };
        f.write_str(label)
    }
}

/// Result of a history pop notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopOutcome {
    /// An overlay is open: the pop became a close request and the synthetic
    /// entry was pushed again.
    CloseRequested(u64),
    /// Nothing to close: the coordinator disarmed and stepped back again so
    /// the user really navigates.
    Navigate,
    /// Landed on a stale synthetic entry and stepped past it.
    SkippedSynthetic,
    /// A plain route change the coordinator does not own.
    RouteChanged,
}

// ============================================================================
// Coordinator
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct CloseCoordinator {
    signal: CloseSignal,
    armed: bool,
    synthetic_pushes: u64,
}

impl CloseCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) -> CloseSignal {
        self.signal
    }

    pub fn state(&self) -> CloseState {
        if self.signal.should_close {
            CloseState::CloseRequested(self.signal.close_id)
        } else {
            CloseState::Idle
        }
    }

    /// Idle → CloseRequested. A trigger while already requested bumps the id
    /// so the new request is distinguishable from the pending one.
    pub fn trigger_close(&mut self, trigger: CloseTrigger) -> CloseSignal {
        self.signal.close_id += 1;
        self.signal.should_close = true;
        tracing::debug!(%trigger, close_id = self.signal.close_id, "close requested");
        self.signal
    }

    /// CloseRequested → Idle. Called by the consumer that performed the close.
    pub fn reset_close(&mut self) {
        self.signal.should_close = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Number of synthetic entries pushed so far.
    pub fn synthetic_pushes(&self) -> u64 {
        self.synthetic_pushes
    }

    /// Pushes the synthetic entry if it is not already in place.
    pub fn arm(&mut self, history: &mut dyn HistoryPort) {
        if self.armed {
            return;
        }
        self.push_synthetic(history);
        self.armed = true;
    }

    /// Forgets the synthetic entry, e.g. on provider teardown.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Handles a history pop notification.
    pub fn handle_pop(&mut self, history: &mut dyn HistoryPort, overlays_open: bool) -> PopOutcome {
        if self.armed {
            if overlays_open {
                let signal = self.trigger_close(CloseTrigger::BackAction);
                self.push_synthetic(history);
                PopOutcome::CloseRequested(signal.close_id)
            } else {
                self.armed = false;
                history.go_back();
                PopOutcome::Navigate
            }
        } else if history.at_synthetic_entry() {
            history.go_back();
            PopOutcome::SkippedSynthetic
        } else {
            PopOutcome::RouteChanged
        }
    }

    /// Re-arms after a route change settled.
    pub fn on_route_settled(&mut self, history: &mut dyn HistoryPort) {
        self.arm(history);
    }

    fn push_synthetic(&mut self, history: &mut dyn HistoryPort) {
        history.push_synthetic();
        self.synthetic_pushes += 1;
    }
}

// ============================================================================
// Consumer
// ============================================================================

/// Per-overlay bookkeeping that makes sure each `close_id` is handled once.
#[derive(Debug, Default, Clone, Copy)]
pub struct CloseConsumer {
    last_seen: u64,
}

impl CloseConsumer {
    /// A consumer that ignores any close already issued before it mounted.
    pub fn starting_at(signal: CloseSignal) -> Self {
        Self {
            last_seen: signal.close_id,
        }
    }

    /// Returns true if this consumer should close for `signal`.
    ///
    /// Every new `close_id` is marked seen, even when the consumer is not
    /// topmost, so it cannot act on it later after the overlay above it left.
    pub fn should_act(&mut self, signal: CloseSignal, is_topmost: bool) -> bool {
        if !signal.should_close || signal.close_id <= self.last_seen {
            return false;
        }
        self.last_seen = signal.close_id;
        is_topmost
    }

    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }
}
