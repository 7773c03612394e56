//! Ports to the host environment.
//!
//! The core never touches the browser directly. The web package implements
//! these traits over `web_sys`; tests implement them with in-memory doubles.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::future::LocalBoxFuture;

use crate::scroll::ScrollRecord;

/// Monotonic-enough wall clock in milliseconds.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Clock plus a way to suspend for a fixed delay.
pub trait Timers: Clock {
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()>;
}

/// Platform history used to intercept the back action.
pub trait HistoryPort {
    /// Pushes a synthetic entry on top of the current one (same URL).
    fn push_synthetic(&mut self);
    /// Steps one entry back.
    fn go_back(&mut self);
    /// Whether the entry the history currently points at is synthetic.
    fn at_synthetic_entry(&self) -> bool;
}

/// The external router, seen from the guardrail.
pub trait RouterPort {
    /// Current path, without the query string.
    fn current_path(&self) -> Option<String>;
    /// Replace-navigates to `path` without adding a history entry.
    fn replace(&mut self, path: &str);
}

/// The scrollable viewport of a screen (or the window).
pub trait ScrollSurface {
    fn offset(&self) -> f64;
    fn set_offset(&self, offset: f64);
}

/// Durable mirror of the scroll store.
pub trait ScrollPersistence {
    fn load(&self) -> crate::Result<Vec<ScrollRecord>>;
    fn store(&self, records: &[ScrollRecord]) -> crate::Result<()>;
}

/// Persistence that keeps nothing; used where storage is unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPersistence;

impl ScrollPersistence for NoPersistence {
    fn load(&self) -> crate::Result<Vec<ScrollRecord>> {
        Ok(Vec::new())
    }

    fn store(&self, _records: &[ScrollRecord]) -> crate::Result<()> {
        Ok(())
    }
}

/// A clock that only moves when told to. Handy for tests and replays.
#[derive(Debug, Default, Clone)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn at(ms: f64) -> Self {
        let clock = Self::default();
        clock.set(ms);
        clock
    }

    pub fn set(&self, ms: f64) {
        self.0.store(ms.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, ms: f64) {
        self.set(self.now_ms() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::SeqCst))
    }
}
