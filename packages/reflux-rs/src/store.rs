//! The state container.
//!
//! A [`Store`] owns the application state and the root reducer. It is an
//! explicit, cheaply cloneable handle: create it once at startup and pass it to
//! whatever needs to read state or dispatch actions.
//!
//! # Dispatch
//!
//! `dispatch` is synchronous. Under the state lock it:
//! 1. runs the reducer on the action
//! 2. bumps the per-tag generation used for switch-to-latest
//! 3. publishes the action on the bus, so runners observe actions in exactly
//!    the order they were reduced
//!
//! Effects run later, on the runner's tasks, and see the already-updated state.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dashmap::DashMap;
use tokio::sync::{broadcast, watch};
use tracing::{error, trace};

use crate::bus::ActionBus;
use crate::core::{Action, ActionEnvelope, CorrelationId};
use crate::error::RefluxError;
use crate::inflight::InflightTracker;
use crate::reducer::{panic_message, Reducer};

/// Default timeout for `dispatch_and_settle`.
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

struct StoreInner<S, A> {
    state: watch::Sender<S>,
    reducer: Box<dyn Reducer<S, A>>,
    bus: ActionBus<A>,
    inflight: Arc<InflightTracker>,
    /// Runners currently attached; each one settles every tracked action once.
    runners: AtomicUsize,
    /// Latest dispatch generation per action tag.
    generations: DashMap<&'static str, u64>,
}

/// Explicit, constructor-injected state container.
///
/// # Example
///
/// ```ignore
/// let store = Store::new(AppState::default(), app_reducer());
///
/// store.dispatch(RecipeAction::FetchRecipes);
///
/// let recipes = store.select(|s: &AppState| s.recipes.recipes.clone());
/// println!("{} recipes", recipes.get().len());
/// ```
pub struct Store<S, A> {
    inner: Arc<StoreInner<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// How a dispatch participates in inflight tracking.
#[derive(Clone, Copy)]
enum Tracking {
    /// Start tracking this correlation (edge dispatch that will be awaited).
    Start,
    /// Count only if the correlation is already tracked (effect follow-ups).
    Follow,
}

impl<S, A> Store<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Create a store with its own action bus.
    pub fn new<R: Reducer<S, A>>(initial: S, reducer: R) -> Self {
        Self::with_bus(initial, reducer, ActionBus::new())
    }

    /// Create a store that publishes on an existing bus.
    pub fn with_bus<R: Reducer<S, A>>(initial: S, reducer: R, bus: ActionBus<A>) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            inner: Arc::new(StoreInner {
                state,
                reducer: Box::new(reducer),
                bus,
                inflight: Arc::new(InflightTracker::new()),
                runners: AtomicUsize::new(0),
                generations: DashMap::new(),
            }),
        }
    }

    /// Dispatch an action (fire-and-forget).
    ///
    /// Reduces synchronously and returns the fresh correlation ID the action
    /// was published with.
    pub fn dispatch(&self, action: A) -> CorrelationId {
        let cid = CorrelationId::new();
        self.deliver(action, cid, Tracking::Follow, None);
        cid
    }

    /// Dispatch an action under an existing correlation.
    ///
    /// Used by the runner for follow-up actions, so they extend the chain the
    /// triggering action belongs to.
    pub fn dispatch_with_correlation(&self, action: A, cid: CorrelationId) {
        self.deliver(action, cid, Tracking::Follow, None);
    }

    /// Dispatch an action and wait until every effect chain it triggered,
    /// directly or through follow-up actions, has finished.
    ///
    /// Uses [`DEFAULT_SETTLE_TIMEOUT`].
    ///
    /// # Returns
    ///
    /// - `Ok(())` if every chain completed
    /// - `Err` with the first effect error, or a timeout
    pub async fn dispatch_and_settle(&self, action: A) -> Result<()> {
        self.dispatch_and_settle_timeout(action, DEFAULT_SETTLE_TIMEOUT)
            .await
    }

    /// Dispatch an action and wait for its chains, with a custom timeout.
    pub async fn dispatch_and_settle_timeout(&self, action: A, timeout: Duration) -> Result<()> {
        let cid = CorrelationId::new();

        // Register before dispatching so an early error is not cleaned up
        // before we collect it.
        let _waiter = self.inner.inflight.register_waiter(cid);

        self.deliver(action, cid, Tracking::Start, None);

        match tokio::time::timeout(timeout, self.inner.inflight.wait_zero(cid)).await {
            Ok(result) => result,
            Err(_) => {
                self.inner.inflight.forget(cid);
                Err(RefluxError::Timeout { duration: timeout }.into())
            }
        }
    }

    /// Dispatch a follow-up only while the chain's trigger is still the
    /// latest action of its tag.
    ///
    /// The check and the reduction happen under the same state lock, so once
    /// a newer action of `tag` has been dispatched the stale chain can never
    /// reach the reducers. Returns whether the action was dispatched.
    pub(crate) fn dispatch_if_current(
        &self,
        action: A,
        cid: CorrelationId,
        tag: &'static str,
        generation: u64,
    ) -> bool {
        self.deliver(action, cid, Tracking::Follow, Some((tag, generation)))
    }

    /// Whether `generation` is still the latest dispatch of `tag`.
    pub fn is_current(&self, tag: &'static str, generation: u64) -> bool {
        self.latest_generation(tag) == generation
    }

    fn latest_generation(&self, tag: &'static str) -> u64 {
        self.inner
            .generations
            .get(tag)
            .map(|g| *g)
            .unwrap_or(0)
    }

    fn deliver(
        &self,
        action: A,
        cid: CorrelationId,
        tracking: Tracking,
        guard: Option<(&'static str, u64)>,
    ) -> bool {
        let tag = action.kind();
        let mut delivered = None;

        self.inner.state.send_if_modified(|state| {
            if let Some((trigger, generation)) = guard {
                if self.latest_generation(trigger) != generation {
                    return false;
                }
            }

            // No rollback: writes made before a panic are kept and published.
            let reduced = catch_unwind(AssertUnwindSafe(|| {
                self.inner.reducer.reduce(state, &action)
            }));
            if let Err(panic_info) = reduced {
                error!(
                    %cid,
                    tag,
                    panic = %panic_message(panic_info.as_ref()),
                    "reducer panicked"
                );
            }

            let generation = {
                let mut latest = self.inner.generations.entry(tag).or_insert(0);
                *latest += 1;
                *latest
            };

            // Count before publishing, the runner may settle it immediately.
            let runners = self.inner.runners.load(Ordering::Acquire);
            if runners > 0 {
                match tracking {
                    Tracking::Start => self.inner.inflight.inc(cid, runners),
                    Tracking::Follow => {
                        self.inner.inflight.inc_if_tracked(cid, runners);
                    }
                }
            }

            delivered = Some(
                self.inner
                    .bus
                    .emit_envelope(ActionEnvelope::sequenced(cid, action, generation)),
            );
            true
        });

        match delivered {
            Some(receivers) => {
                trace!(%cid, tag, receivers, "action dispatched");
                true
            }
            None => {
                trace!(%cid, tag, "stale follow-up dropped");
                false
            }
        }
    }

    /// Clone the current state.
    pub fn snapshot(&self) -> S
    where
        S: Clone,
    {
        self.inner.state.borrow().clone()
    }

    /// Read the current state without cloning it.
    ///
    /// Do not dispatch from inside `f`.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// A live view of part of the state.
    pub fn select<T, F>(&self, project: F) -> Selection<S, T>
    where
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        let mut rx = self.inner.state.subscribe();
        let project: Arc<dyn Fn(&S) -> T + Send + Sync> = Arc::new(project);
        let last = project(&rx.borrow_and_update());
        Selection { rx, project, last }
    }

    /// Subscribe to every dispatched action.
    pub fn subscribe(&self) -> broadcast::Receiver<ActionEnvelope<A>> {
        self.inner.bus.subscribe()
    }

    /// The bus actions are published on.
    pub fn bus(&self) -> &ActionBus<A> {
        &self.inner.bus
    }

    /// The inflight tracker (for runners and advanced use).
    pub fn inflight(&self) -> &Arc<InflightTracker> {
        &self.inner.inflight
    }

    /// Number of attached effect runners.
    pub fn runner_count(&self) -> usize {
        self.inner.runners.load(Ordering::Acquire)
    }

    /// Subscribe a runner and count it for settle tracking.
    pub(crate) fn attach_runner(&self) -> (broadcast::Receiver<ActionEnvelope<A>>, RunnerSlot<S, A>) {
        let receiver = self.inner.bus.subscribe();
        self.inner.runners.fetch_add(1, Ordering::AcqRel);
        (
            receiver,
            RunnerSlot {
                store: self.clone(),
            },
        )
    }
}

impl<S, A> std::fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("runners", &self.inner.runners.load(Ordering::Acquire))
            .field("inflight", &self.inner.inflight)
            .finish_non_exhaustive()
    }
}

/// Keeps a runner counted as attached until dropped.
pub(crate) struct RunnerSlot<S, A> {
    store: Store<S, A>,
}

impl<S, A> Drop for RunnerSlot<S, A> {
    fn drop(&mut self) {
        self.store.inner.runners.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A live, continuously-updated projection of the store's state.
pub struct Selection<S, T> {
    rx: watch::Receiver<S>,
    project: Arc<dyn Fn(&S) -> T + Send + Sync>,
    last: T,
}

impl<S, T> Selection<S, T> {
    /// The projected value right now.
    pub fn get(&self) -> T {
        (self.project)(&self.rx.borrow())
    }
}

impl<S, T: Clone + PartialEq> Selection<S, T> {
    /// Wait for the projection to change and return the new value.
    ///
    /// Dispatches that leave the projected value equal are skipped. Returns
    /// `None` once the store is gone.
    pub async fn next(&mut self) -> Option<T> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            let value = (self.project)(&self.rx.borrow_and_update());
            if value != self.last {
                self.last = value.clone();
                return Some(value);
            }
        }
    }
}

impl<S, T: std::fmt::Debug> std::fmt::Debug for Selection<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        count: i64,
        label: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum CounterAction {
        Add(i64),
        Rename(String),
        Explode,
    }

    impl Action for CounterAction {
        fn kind(&self) -> &'static str {
            match self {
                CounterAction::Add(_) => "counter/add",
                CounterAction::Rename(_) => "counter/rename",
                CounterAction::Explode => "counter/explode",
            }
        }
    }

    fn reducer(state: &mut Counter, action: &CounterAction) {
        match action {
            CounterAction::Add(n) => state.count += n,
            CounterAction::Rename(label) => state.label = label.clone(),
            CounterAction::Explode => {
                state.label = "half-applied".into();
                panic!("boom")
            }
        }
    }

    fn store() -> Store<Counter, CounterAction> {
        Store::new(Counter::default(), reducer)
    }

    #[test]
    fn test_dispatch_reduces_synchronously() {
        let store = store();
        store.dispatch(CounterAction::Add(2));
        store.dispatch(CounterAction::Add(3));
        assert_eq!(store.snapshot().count, 5);
        assert_eq!(store.with_state(|s| s.count), 5);
    }

    #[tokio::test]
    async fn test_dispatch_publishes_after_reducing() {
        let store = store();
        let mut receiver = store.subscribe();

        let cid = store.dispatch(CounterAction::Add(1));

        let envelope = receiver.recv().await.unwrap();
        assert_eq!(envelope.cid, cid);
        assert_eq!(envelope.action, CounterAction::Add(1));
        assert_eq!(store.snapshot().count, 1);
    }

    #[test]
    fn test_reducer_panic_keeps_store_usable() {
        let store = store();
        store.dispatch(CounterAction::Explode);
        store.dispatch(CounterAction::Add(1));
        assert_eq!(store.snapshot().count, 1);
    }

    #[tokio::test]
    async fn test_reducer_panic_publishes_writes_made_before_it() {
        let store = store();
        let mut label = store.select(|s: &Counter| s.label.clone());

        store.dispatch(CounterAction::Explode);

        assert_eq!(store.snapshot().label, "half-applied");
        assert_eq!(label.next().await.as_deref(), Some("half-applied"));
    }

    #[tokio::test]
    async fn test_selection_skips_unrelated_changes() {
        let store = store();
        let mut count = store.select(|s: &Counter| s.count);
        assert_eq!(count.get(), 0);

        let handle = store.clone();
        tokio::spawn(async move {
            handle.dispatch(CounterAction::Rename("ignored".into()));
            handle.dispatch(CounterAction::Add(4));
        });

        assert_eq!(count.next().await, Some(4));
        assert_eq!(count.get(), 4);
    }

    #[tokio::test]
    async fn test_selection_ends_when_store_dropped() {
        let store = store();
        let mut label = store.select(|s: &Counter| s.label.clone());
        drop(store);
        assert_eq!(label.next().await, None);
    }

    #[tokio::test]
    async fn test_settle_without_runner_returns_immediately() {
        let store = store();
        store
            .dispatch_and_settle(CounterAction::Add(1))
            .await
            .unwrap();
        assert_eq!(store.snapshot().count, 1);
        assert_eq!(store.inflight().active_count(), 0);
    }

    #[tokio::test]
    async fn test_settle_times_out_when_runner_never_processes() {
        let store = store();
        let (_receiver, _slot) = store.attach_runner();
        assert_eq!(store.runner_count(), 1);

        let err = store
            .dispatch_and_settle_timeout(CounterAction::Add(1), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RefluxError>(),
            Some(RefluxError::Timeout { .. })
        ));
        assert_eq!(store.inflight().active_count(), 0);
    }

    #[tokio::test]
    async fn test_generation_increments_per_tag() {
        let store = store();
        let mut receiver = store.subscribe();

        store.dispatch(CounterAction::Add(1));
        store.dispatch(CounterAction::Rename("a".into()));
        store.dispatch(CounterAction::Add(1));

        assert_eq!(receiver.recv().await.unwrap().generation, 1);
        assert_eq!(receiver.recv().await.unwrap().generation, 1);
        let third = receiver.recv().await.unwrap();
        assert_eq!(third.generation, 2);
        assert!(store.is_current("counter/add", 2));
        assert!(!store.is_current("counter/add", 1));
    }

    #[test]
    fn test_stale_follow_up_is_dropped() {
        let store = store();
        store.dispatch(CounterAction::Rename("first".into()));
        store.dispatch(CounterAction::Rename("second".into()));

        let cid = CorrelationId::new();
        assert!(!store.dispatch_if_current(CounterAction::Add(5), cid, "counter/rename", 1));
        assert_eq!(store.snapshot().count, 0);

        assert!(store.dispatch_if_current(CounterAction::Add(5), cid, "counter/rename", 2));
        assert_eq!(store.snapshot().count, 5);
    }

    #[test]
    fn test_runner_slot_detaches_on_drop() {
        let store = store();
        let (_receiver, slot) = store.attach_runner();
        assert_eq!(store.runner_count(), 1);
        drop(slot);
        assert_eq!(store.runner_count(), 0);
    }
}
