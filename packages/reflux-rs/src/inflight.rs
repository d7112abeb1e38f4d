//! Inflight tracking for correlated dispatches.
//!
//! A correlation is tracked only while someone awaits it
//! (`Store::dispatch_and_settle`). Its outstanding count covers:
//! - actions reduced but not yet routed by a runner
//! - effect chains spawned but not yet finished
//!
//! A chain counts its follow-ups before dispatching them, so the count never
//! drops to zero between a chain finishing and a runner routing what it
//! returned.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use dashmap::DashMap;
use tokio::sync::Notify;
use tracing::warn;

use crate::core::CorrelationId;

/// Outstanding work of one correlation.
pub(crate) struct Pending {
    outstanding: AtomicUsize,
    /// Callers blocked in `wait_zero`
    waiters: AtomicUsize,
    settled: Notify,
    /// Only the first failure is reported
    error: Mutex<Option<anyhow::Error>>,
}

impl Pending {
    fn new() -> Self {
        Self {
            outstanding: AtomicUsize::new(0),
            waiters: AtomicUsize::new(0),
            settled: Notify::new(),
            error: Mutex::new(None),
        }
    }

    fn is_busy(&self) -> bool {
        self.outstanding.load(Ordering::Acquire) > 0
    }

    fn error_slot(&self) -> MutexGuard<'_, Option<anyhow::Error>> {
        self.error.lock().unwrap_or_else(|poisoned| {
            warn!("inflight error slot was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

/// Counts a caller as waiting on a correlation until dropped.
///
/// Dropping it on cancellation keeps an abandoned correlation from holding
/// its error forever.
pub struct WaiterGuard {
    pending: Option<Arc<Pending>>,
}

impl WaiterGuard {
    fn new(pending: Option<Arc<Pending>>) -> Self {
        if let Some(p) = &pending {
            p.waiters.fetch_add(1, Ordering::AcqRel);
        }
        Self { pending }
    }
}

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        if let Some(p) = &self.pending {
            p.waiters.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// Outstanding work per correlation ID.
#[derive(Default)]
pub struct InflightTracker {
    pending: DashMap<CorrelationId, Arc<Pending>>,
}

impl InflightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, cid: CorrelationId) -> Arc<Pending> {
        self.pending
            .entry(cid)
            .or_insert_with(|| Arc::new(Pending::new()))
            .clone()
    }

    fn lookup(&self, cid: CorrelationId) -> Option<Arc<Pending>> {
        self.pending.get(&cid).map(|p| Arc::clone(p.value()))
    }

    /// Add `n` units of work, starting to track `cid` if needed.
    pub fn inc(&self, cid: CorrelationId, n: usize) {
        self.entry(cid).outstanding.fetch_add(n, Ordering::AcqRel);
    }

    /// Add `n` units of work only if `cid` is already being tracked.
    ///
    /// Returns whether the caller now owes `n` matching decrements.
    pub fn inc_if_tracked(&self, cid: CorrelationId, n: usize) -> bool {
        match self.lookup(cid) {
            Some(p) if p.is_busy() => {
                p.outstanding.fetch_add(n, Ordering::AcqRel);
                true
            }
            _ => false,
        }
    }

    /// Finish `n` units of work.
    ///
    /// At zero, waiters wake up. The entry is dropped right away unless a
    /// waiter still has to collect an error from it.
    pub fn dec(&self, cid: CorrelationId, n: usize) {
        let Some(p) = self.lookup(cid) else {
            return;
        };
        if p.outstanding.fetch_sub(n, Ordering::AcqRel) != n {
            return;
        }

        p.settled.notify_waiters();
        let keep_for_waiter =
            p.waiters.load(Ordering::Acquire) > 0 && p.error_slot().is_some();
        if !keep_for_waiter {
            self.pending.remove(&cid);
        }
    }

    /// Record a failure for `cid`. Later failures are logged and dropped.
    pub fn record_error(&self, cid: CorrelationId, err: anyhow::Error) {
        let Some(p) = self.lookup(cid) else {
            return;
        };
        let mut slot = p.error_slot();
        if slot.is_none() {
            warn!(cid = %cid, error = %err, "recording error for correlation");
            *slot = Some(err);
        }
    }

    /// Wait until `cid` has no outstanding work.
    ///
    /// Returns the first recorded error, if any.
    pub async fn wait_zero(&self, cid: CorrelationId) -> Result<()> {
        let _waiter = WaiterGuard::new(self.lookup(cid));

        loop {
            let Some(p) = self.lookup(cid) else {
                return Ok(());
            };

            // Subscribe first so a dec() racing the check still wakes us.
            let settled = p.settled.notified();

            if !p.is_busy() {
                let err = p.error_slot().take();
                self.pending.remove(&cid);
                return err.map_or(Ok(()), Err);
            }

            settled.await;
        }
    }

    /// Whether `cid` has outstanding work.
    pub fn has_pending_work(&self, cid: CorrelationId) -> bool {
        self.lookup(cid).is_some_and(|p| p.is_busy())
    }

    /// Number of tracked correlations.
    pub fn active_count(&self) -> usize {
        self.pending.len()
    }

    /// Start tracking `cid` and count the caller as waiting on it.
    ///
    /// Call before dispatching, then `wait_zero`.
    pub fn register_waiter(&self, cid: CorrelationId) -> WaiterGuard {
        WaiterGuard::new(Some(self.entry(cid)))
    }

    /// Stop tracking `cid` without waking anyone (timeout cleanup).
    pub(crate) fn forget(&self, cid: CorrelationId) {
        self.pending.remove(&cid);
    }
}

impl std::fmt::Debug for InflightTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InflightTracker")
            .field("active_correlations", &self.pending.len())
            .finish()
    }
}

/// Finishes one unit of work when dropped.
///
/// Dropped when a chain returns, panics, or is aborted by a newer action.
pub struct InflightGuard {
    tracker: Arc<InflightTracker>,
    cid: CorrelationId,
}

impl InflightGuard {
    /// Take ownership of one already-counted unit of work.
    pub fn adopt(tracker: Arc<InflightTracker>, cid: CorrelationId) -> Self {
        Self { tracker, cid }
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.tracker.dec(self.cid, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_zero_without_entry_returns_immediately() {
        let tracker = InflightTracker::new();
        tracker.wait_zero(CorrelationId::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_zero_after_balanced_inc_dec() {
        let tracker = Arc::new(InflightTracker::new());
        let cid = CorrelationId::new();
        let _waiter = tracker.register_waiter(cid);
        tracker.inc(cid, 2);

        let t = tracker.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            t.dec(cid, 1);
            t.dec(cid, 1);
        });

        tracker.wait_zero(cid).await.unwrap();
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn test_recorded_error_is_returned_to_waiter() {
        let tracker = InflightTracker::new();
        let cid = CorrelationId::new();
        let _waiter = tracker.register_waiter(cid);
        tracker.inc(cid, 1);
        tracker.record_error(cid, anyhow::anyhow!("first"));
        tracker.record_error(cid, anyhow::anyhow!("second"));
        tracker.dec(cid, 1);

        let err = tracker.wait_zero(cid).await.unwrap_err();
        assert_eq!(err.to_string(), "first");
    }

    #[test]
    fn test_inc_if_tracked_ignores_unknown_correlation() {
        let tracker = InflightTracker::new();
        let cid = CorrelationId::new();
        assert!(!tracker.inc_if_tracked(cid, 1));
        assert!(!tracker.has_pending_work(cid));

        tracker.inc(cid, 1);
        assert!(tracker.inc_if_tracked(cid, 1));
        tracker.dec(cid, 2);
        assert!(!tracker.has_pending_work(cid));
    }

    #[test]
    fn test_guard_decrements_on_drop() {
        let tracker = Arc::new(InflightTracker::new());
        let cid = CorrelationId::new();
        tracker.inc(cid, 1);
        {
            let _guard = InflightGuard::adopt(tracker.clone(), cid);
            assert!(tracker.has_pending_work(cid));
        }
        assert!(!tracker.has_pending_work(cid));
    }

    #[test]
    fn test_error_without_waiter_does_not_leak() {
        let tracker = InflightTracker::new();
        let cid = CorrelationId::new();
        tracker.inc(cid, 1);
        tracker.record_error(cid, anyhow::anyhow!("boom"));
        tracker.dec(cid, 1);
        assert_eq!(tracker.active_count(), 0);
    }
}
