//! Scroll position store.
//!
//! Keeps one [`ScrollRecord`] per route key (path + query string) so a screen
//! can get its viewport back after being covered or navigated away from, and
//! provides [`preserve_during_action`] to pin the viewport while an action
//! (opening a dialog, refetching a list) shifts the layout.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::config::NavConfig;
use crate::platform::{ScrollPersistence, ScrollSurface, Timers};

// ============================================================================
// RouteKey
// ============================================================================

/// Path plus query string, e.g. `/clients?page=2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteKey(String);

impl RouteKey {
    /// Builds a key from a path and a query string (with or without `?`).
    pub fn new(path: &str, search: &str) -> Self {
        let search = search.trim_start_matches('?');
        if search.is_empty() {
            Self(path.to_string())
        } else {
            Self(format!("{}?{}", path, search))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path part, without the query string.
    pub fn path(&self) -> &str {
        self.0.split('?').next().unwrap_or_default()
    }
}

impl From<&str> for RouteKey {
    fn from(key: &str) -> Self {
        match key.split_once('?') {
            Some((path, search)) => Self::new(path, search),
            None => Self::new(key, ""),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// ScrollRecord / ScrollStore
// ============================================================================

/// A saved viewport offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollRecord {
    pub route_key: RouteKey,
    pub position: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    pub saved_at: f64,
}

/// Per-route scroll offsets with a retention horizon.
pub struct ScrollStore {
    records: HashMap<RouteKey, ScrollRecord>,
    retention_ms: f64,
    preserving: PreserveFlag,
    persistence: Box<dyn ScrollPersistence + Send + Sync>,
}

impl ScrollStore {
    /// Creates a store and loads whatever the persistence layer still holds.
    ///
    /// An unavailable or corrupt persistence layer is logged and ignored.
    pub fn new(
        retention_ms: f64,
        persistence: Box<dyn ScrollPersistence + Send + Sync>,
    ) -> Self {
        let records = match persistence.load() {
            Ok(records) => records
                .into_iter()
                .map(|r| (r.route_key.clone(), r))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "scroll persistence unavailable, starting empty");
                HashMap::new()
            }
        };
        Self {
            records,
            retention_ms,
            preserving: PreserveFlag::default(),
            persistence,
        }
    }

    /// Saves `position` for `route_key`. Last write wins.
    pub fn save(
        &mut self,
        route_key: RouteKey,
        position: f64,
        item_id: Option<String>,
        now_ms: f64,
    ) {
        self.records.insert(
            route_key.clone(),
            ScrollRecord {
                route_key,
                position: position.max(0.0),
                item_id,
                saved_at: now_ms,
            },
        );
        self.persist();
    }

    /// Saved position for `route_key`. The record is kept.
    pub fn restore(&self, route_key: &RouteKey) -> Option<f64> {
        self.records.get(route_key).map(|r| r.position)
    }

    pub fn record(&self, route_key: &RouteKey) -> Option<&ScrollRecord> {
        self.records.get(route_key)
    }

    /// Drops the record for `route_key`.
    pub fn discard(&mut self, route_key: &RouteKey) -> Option<ScrollRecord> {
        let removed = self.records.remove(route_key);
        if removed.is_some() {
            self.persist();
        }
        removed
    }

    /// Purges records older than the retention window. Returns how many went.
    pub fn cleanup(&mut self, now_ms: f64) -> usize {
        let horizon = now_ms - self.retention_ms;
        let before = self.records.len();
        self.records.retain(|_, r| r.saved_at >= horizon);
        let purged = before - self.records.len();
        if purged > 0 {
            tracing::debug!(purged, "purged stale scroll records");
            self.persist();
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True while a [`preserve_during_action`] scope is running.
    pub fn is_preserving(&self) -> bool {
        self.preserving.is_active()
    }

    /// Handle shared with [`preserve_during_action`].
    pub fn preserve_flag(&self) -> PreserveFlag {
        self.preserving.clone()
    }

    fn persist(&self) {
        let mut records: Vec<ScrollRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.saved_at.total_cmp(&b.saved_at));
        if let Err(e) = self.persistence.store(&records) {
            tracing::warn!(error = %e, "failed to persist scroll records");
        }
    }
}

impl fmt::Debug for ScrollStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollStore")
            .field("records", &self.records.len())
            .field("retention_ms", &self.retention_ms)
            .field("preserving", &self.is_preserving())
            .finish()
    }
}

// ============================================================================
// Preservation
// ============================================================================

/// Shared counter of running preservation scopes.
#[derive(Debug, Default, Clone)]
pub struct PreserveFlag(Arc<AtomicUsize>);

impl PreserveFlag {
    pub fn acquire(&self) -> PreserveGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        PreserveGuard(Arc::clone(&self.0))
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }
}

/// Releases the preserving state when dropped, on every exit path.
#[derive(Debug)]
pub struct PreserveGuard(Arc<AtomicUsize>);

impl Drop for PreserveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Parameters of one preservation scope.
#[derive(Debug, Clone, PartialEq)]
pub struct PreserveOptions {
    pub duration_ms: u32,
    pub threshold_px: f64,
    pub recheck_delays_ms: Vec<u32>,
}

impl PreserveOptions {
    pub fn from_config(config: &NavConfig, duration_ms: u32) -> Self {
        Self {
            duration_ms,
            threshold_px: config.drift_threshold_px,
            recheck_delays_ms: config.drift_recheck_delays_ms.clone(),
        }
    }

    fn delay_at(&self, step: usize) -> u32 {
        match self.recheck_delays_ms.get(step) {
            Some(delay) => *delay,
            None => self.recheck_delays_ms.last().copied().unwrap_or(16).max(1),
        }
    }
}

/// Runs `action` while pinning the viewport to its current offset.
///
/// For `duration_ms` the surface is re-checked after each delay in
/// `recheck_delays_ms` (the last one repeating) and snapped back whenever it
/// drifted more than `threshold_px`. The watcher runs concurrently with the
/// action, so async actions spanning several frames are covered too.
pub async fn preserve_during_action<S, T, F, Fut, R>(
    surface: &S,
    timers: &T,
    flag: &PreserveFlag,
    options: &PreserveOptions,
    action: F,
) -> R
where
    S: ScrollSurface + ?Sized,
    T: Timers + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = R>,
{
    let _guard = flag.acquire();
    let anchor = surface.offset();
    let deadline = timers.now_ms() + f64::from(options.duration_ms);

    let watcher = async {
        let mut corrections = 0usize;
        let mut step = 0usize;
        loop {
            timers.sleep(options.delay_at(step)).await;
            if correct_drift(surface, anchor, options.threshold_px) {
                corrections += 1;
            }
            if timers.now_ms() >= deadline {
                break corrections;
            }
            step += 1;
        }
    };

    let (result, corrections) = futures_util::future::join(action(), watcher).await;
    if correct_drift(surface, anchor, options.threshold_px) {
        tracing::debug!(anchor, corrections = corrections + 1, "scroll preserved");
    } else if corrections > 0 {
        tracing::debug!(anchor, corrections, "scroll preserved");
    }
    result
}

fn correct_drift<S: ScrollSurface + ?Sized>(surface: &S, anchor: f64, threshold_px: f64) -> bool {
    if (surface.offset() - anchor).abs() > threshold_px {
        surface.set_offset(anchor);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;

    use futures_util::future::LocalBoxFuture;

    use super::*;
    use crate::NavError;
    use crate::platform::{Clock, NoPersistence};

    struct MemoryPersistence(Arc<std::sync::Mutex<Vec<ScrollRecord>>>);

    impl ScrollPersistence for MemoryPersistence {
        fn load(&self) -> crate::Result<Vec<ScrollRecord>> {
            Ok(self.0.lock().unwrap().clone())
        }

        fn store(&self, records: &[ScrollRecord]) -> crate::Result<()> {
            *self.0.lock().unwrap() = records.to_vec();
            Ok(())
        }
    }

    struct BrokenPersistence;

    impl ScrollPersistence for BrokenPersistence {
        fn load(&self) -> crate::Result<Vec<ScrollRecord>> {
            Err(NavError::StorageUnavailable)
        }

        fn store(&self, _records: &[ScrollRecord]) -> crate::Result<()> {
            Err(NavError::StorageWrite)
        }
    }

    struct Surface {
        offset: Cell<f64>,
        writes: RefCell<Vec<f64>>,
    }

    impl Surface {
        fn at(offset: f64) -> Rc<Self> {
            Rc::new(Self {
                offset: Cell::new(offset),
                writes: RefCell::new(Vec::new()),
            })
        }

        /// Simulates a layout shift.
        fn shift(&self, offset: f64) {
            self.offset.set(offset);
        }
    }

    impl ScrollSurface for Surface {
        fn offset(&self) -> f64 {
            self.offset.get()
        }

        fn set_offset(&self, offset: f64) {
            self.writes.borrow_mut().push(offset);
            self.offset.set(offset);
        }
    }

    struct TokioTimers {
        start: tokio::time::Instant,
    }

    impl Clock for TokioTimers {
        fn now_ms(&self) -> f64 {
            self.start.elapsed().as_secs_f64() * 1000.0
        }
    }

    impl Timers for TokioTimers {
        fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
            Box::pin(tokio::time::sleep(Duration::from_millis(u64::from(ms))))
        }
    }

    fn store() -> ScrollStore {
        ScrollStore::new(1_000.0, Box::new(NoPersistence))
    }

    fn options(duration_ms: u32) -> PreserveOptions {
        PreserveOptions::from_config(&NavConfig::default(), duration_ms)
    }

    #[test]
    fn test_route_key_composition() {
        assert_eq!(RouteKey::new("/clients", "").as_str(), "/clients");
        assert_eq!(RouteKey::new("/clients", "?page=2").as_str(), "/clients?page=2");
        assert_eq!(RouteKey::new("/clients", "page=2").as_str(), "/clients?page=2");
        assert_eq!(RouteKey::from("/clients?page=2").path(), "/clients");
        assert_eq!(RouteKey::from("/clients?page=2"), RouteKey::new("/clients", "page=2"));
    }

    #[test]
    fn test_save_overwrites_and_restore_is_idempotent() {
        let mut store = store();
        let key = RouteKey::from("/clients");
        store.save(key.clone(), 120.0, None, 1.0);
        store.save(key.clone(), 480.0, Some("client-7".into()), 2.0);

        assert_eq!(store.len(), 1);
        assert_eq!(store.restore(&key), Some(480.0));
        assert_eq!(store.restore(&key), Some(480.0));
        assert_eq!(
            store.record(&key).and_then(|r| r.item_id.clone()),
            Some("client-7".to_string())
        );
        assert_eq!(store.restore(&RouteKey::from("/reports")), None);
    }

    #[test]
    fn test_negative_position_is_clamped() {
        let mut store = store();
        let key = RouteKey::from("/a");
        store.save(key.clone(), -30.0, None, 0.0);
        assert_eq!(store.restore(&key), Some(0.0));
    }

    #[test]
    fn test_discard() {
        let mut store = store();
        let key = RouteKey::from("/a");
        store.save(key.clone(), 10.0, None, 0.0);
        assert!(store.discard(&key).is_some());
        assert!(store.discard(&key).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_cleanup_purges_old_records() {
        let mut store = store();
        store.save(RouteKey::from("/old"), 10.0, None, 0.0);
        store.save(RouteKey::from("/new"), 20.0, None, 1_500.0);

        assert_eq!(store.cleanup(2_000.0), 1);
        assert_eq!(store.restore(&RouteKey::from("/old")), None);
        assert_eq!(store.restore(&RouteKey::from("/new")), Some(20.0));
        assert_eq!(store.cleanup(2_000.0), 0);
    }

    #[test]
    fn test_persistence_round_trip() {
        let backing = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut first = ScrollStore::new(1_000.0, Box::new(MemoryPersistence(backing.clone())));
        first.save(RouteKey::from("/clients?page=3"), 640.0, None, 5.0);

        let second = ScrollStore::new(1_000.0, Box::new(MemoryPersistence(backing)));
        assert_eq!(second.restore(&RouteKey::from("/clients?page=3")), Some(640.0));
    }

    #[test]
    fn test_broken_persistence_degrades() {
        let mut store = ScrollStore::new(1_000.0, Box::new(BrokenPersistence));
        store.save(RouteKey::from("/a"), 42.0, None, 0.0);
        assert_eq!(store.restore(&RouteKey::from("/a")), Some(42.0));
    }

    #[test]
    fn test_preserve_guard_releases() {
        let store = store();
        let flag = store.preserve_flag();
        {
            let _outer = flag.acquire();
            let _inner = flag.acquire();
            assert!(store.is_preserving());
        }
        assert!(!store.is_preserving());
    }

    #[test]
    fn test_delay_schedule_repeats_last() {
        let opts = PreserveOptions {
            duration_ms: 100,
            threshold_px: 5.0,
            recheck_delays_ms: vec![0, 0],
        };
        assert_eq!(opts.delay_at(0), 0);
        assert_eq!(opts.delay_at(5), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preserve_corrects_shift_during_async_action() {
        let surface = Surface::at(250.0);
        let timers = TokioTimers {
            start: tokio::time::Instant::now(),
        };
        let flag = PreserveFlag::default();

        let observed = preserve_during_action(&*surface, &timers, &flag, &options(300), || {
            let surface = Rc::clone(&surface);
            async move {
                surface.shift(900.0);
                tokio::time::sleep(Duration::from_millis(30)).await;
                let early = surface.offset();
                surface.shift(40.0);
                tokio::time::sleep(Duration::from_millis(60)).await;
                (early, surface.offset())
            }
        })
        .await;

        assert_eq!(observed, (250.0, 250.0));
        assert_eq!(surface.offset(), 250.0);
        assert!(surface.writes.borrow().len() >= 2);
        assert!(!flag.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_small_drift_is_tolerated() {
        let surface = Surface::at(100.0);
        let timers = TokioTimers {
            start: tokio::time::Instant::now(),
        };
        let flag = PreserveFlag::default();
        let shifted: &Surface = &surface;

        preserve_during_action(shifted, &timers, &flag, &options(50), || async move {
            shifted.shift(103.0);
        })
        .await;

        assert_eq!(surface.offset(), 103.0);
        assert!(surface.writes.borrow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_action_still_releases() {
        let surface = Surface::at(0.0);
        let timers = TokioTimers {
            start: tokio::time::Instant::now(),
        };
        let flag = PreserveFlag::default();

        let result: Result<(), NavError> =
            preserve_during_action(&*surface, &timers, &flag, &options(20), || async {
                Err(NavError::StorageWrite)
            })
            .await;

        assert!(result.is_err());
        assert!(!flag.is_active());
    }
}
