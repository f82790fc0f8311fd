//! `CreditController` and `MultiStreamCreditManager` (spec.md §4.5).

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// A single credit counter. `available` never goes negative: `try_consume` fails rather than
/// overdrawing. Safe to share across tasks — the only primitive in this crate that is
/// (spec.md §5, "Credit controllers used across tasks are the only primitives requiring
/// atomicity").
pub struct CreditController {
    available: AtomicI64,
    initial: i64,
    max: i64,
    notify: Notify,
}

impl CreditController {
    pub fn new(initial: i64) -> Self {
        Self::with_max(initial, i64::MAX)
    }

    pub fn with_max(initial: i64, max: i64) -> Self {
        Self {
            available: AtomicI64::new(initial),
            initial,
            max,
            notify: Notify::new(),
        }
    }

    /// Attempts to consume `n` credits atomically; returns `false` (no-op) if insufficient.
    pub fn try_consume(&self, n: i64) -> bool {
        let mut current = self.available.load(Ordering::Acquire);
        loop {
            if current < n {
                return false;
            }
            match self.available.compare_exchange_weak(
                current,
                current - n,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    /// Blocks (cooperatively) until `n` credits are available, then consumes them.
    pub async fn consume(&self, n: i64) {
        loop {
            if self.try_consume(n) {
                return;
            }
            self.notify.notified().await;
        }
    }

    /// Grants `n` additional credits, saturating at `max`, and wakes any waiters.
    pub fn grant(&self, n: i64) {
        let mut current = self.available.load(Ordering::Acquire);
        loop {
            let next = current.saturating_add(n).min(self.max);
            match self.available.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
        self.notify.notify_waiters();
    }

    pub fn available(&self) -> i64 {
        self.available.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.available.store(self.initial, Ordering::Release);
        self.notify.notify_waiters();
    }
}

/// Keyed registry of per-stream credit controllers (spec.md §4.5).
#[derive(Default)]
pub struct MultiStreamCreditManager {
    streams: RwLock<HashMap<String, Arc<CreditController>>>,
}

impl MultiStreamCreditManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, stream_id: impl Into<String>, initial: i64) -> Arc<CreditController> {
        let controller = Arc::new(CreditController::new(initial));
        self.streams.write().insert(stream_id.into(), controller.clone());
        controller
    }

    pub fn unregister(&self, stream_id: &str) {
        self.streams.write().remove(stream_id);
    }

    pub fn get(&self, stream_id: &str) -> Option<Arc<CreditController>> {
        self.streams.read().get(stream_id).cloned()
    }

    pub fn try_consume(&self, stream_id: &str, n: i64) -> bool {
        self.get(stream_id).map(|c| c.try_consume(n)).unwrap_or(false)
    }

    pub fn grant(&self, stream_id: &str, n: i64) {
        if let Some(c) = self.get(stream_id) {
            c.grant(n);
        }
    }

    pub fn total_available(&self) -> i64 {
        self.streams.read().values().map(|c| c.available()).sum()
    }

    pub fn active_streams(&self) -> Vec<String> {
        self.streams.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_consume_respects_balance() {
        let c = CreditController::new(10);
        assert!(c.try_consume(7));
        assert!(!c.try_consume(7));
        assert_eq!(c.available(), 3);
    }

    #[test]
    fn grant_saturates_at_max() {
        let c = CreditController::with_max(0, 5);
        c.grant(100);
        assert_eq!(c.available(), 5);
    }

    #[test]
    fn reset_restores_initial() {
        let c = CreditController::new(10);
        c.try_consume(10);
        c.reset();
        assert_eq!(c.available(), 10);
    }

    #[test]
    fn credit_conservation_invariant() {
        // property 8: sum(granted) - sum(consumed) == available - initial
        let c = CreditController::new(0);
        let mut granted = 0i64;
        let mut consumed = 0i64;
        for n in [5, 3, 8, 2] {
            c.grant(n);
            granted += n;
        }
        for n in [4, 6] {
            if c.try_consume(n) {
                consumed += n;
            }
        }
        assert_eq!(granted - consumed, c.available() - 0);
    }

    #[tokio::test]
    async fn consume_wakes_on_grant() {
        let c = Arc::new(CreditController::new(0));
        let waiter = {
            let c = c.clone();
            tokio::spawn(async move {
                c.consume(5).await;
            })
        };
        tokio::task::yield_now().await;
        c.grant(5);
        waiter.await.unwrap();
        assert_eq!(c.available(), 0);
    }

    #[test]
    fn multi_stream_manager_tracks_totals() {
        let mgr = MultiStreamCreditManager::new();
        mgr.register("a", 10);
        mgr.register("b", 5);
        assert_eq!(mgr.total_available(), 15);
        assert!(mgr.try_consume("a", 10));
        assert_eq!(mgr.total_available(), 5);
        assert_eq!(mgr.active_streams().len(), 2);
        mgr.unregister("a");
        assert_eq!(mgr.active_streams().len(), 1);
    }
}
