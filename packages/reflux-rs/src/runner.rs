//! The effect runner.
//!
//! The runner:
//! 1. Subscribes to the store's action bus
//! 2. For each action, spawns one chain per registered effect for its tag
//! 3. Dispatches whatever the chain returns, under the same correlation
//! 4. Those follow-up actions are reduced and routed again, continuing the loop
//!
//! # Switch lanes
//!
//! A switch registration keeps one running chain. When a newer action with
//! the same tag arrives the old chain is aborted, and because the store checks
//! the per-tag generation before reducing a follow-up, a chain that was already
//! past its await point still cannot dispatch once it has been superseded.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::{Action, ActionEnvelope, FlattenStrategy};
use crate::effect::EffectContext;
use crate::error::{EffectFailed, RefluxError};
use crate::inflight::InflightGuard;
use crate::reducer::panic_message;
use crate::registry::{EffectRegistry, Registration};
use crate::store::{RunnerSlot, Store};

/// Routes dispatched actions to effects.
///
/// Subscribes at construction, so actions dispatched between `new` and
/// `start` are not missed.
///
/// # Example
///
/// ```ignore
/// let store = Store::new(AppState::default(), app_reducer());
/// let runner = EffectRunner::new(&store, deps, app_effects()).start();
///
/// store.dispatch_and_settle(RecipeAction::FetchRecipes.into()).await?;
///
/// runner.abort();
/// ```
pub struct EffectRunner<S, A, D> {
    store: Store<S, A>,
    deps: Arc<D>,
    registry: Arc<EffectRegistry<S, A, D>>,
    receiver: Receiver<ActionEnvelope<A>>,
    _slot: RunnerSlot<S, A>,
}

impl<S, A, D> EffectRunner<S, A, D>
where
    S: Send + Sync + 'static,
    A: Action,
    D: Send + Sync + 'static,
{
    /// Create a runner that owns its dependencies.
    pub fn new(store: &Store<S, A>, deps: D, registry: EffectRegistry<S, A, D>) -> Self {
        Self::with_arc(store, Arc::new(deps), registry)
    }

    /// Create a runner from already-shared dependencies.
    pub fn with_arc(store: &Store<S, A>, deps: Arc<D>, registry: EffectRegistry<S, A, D>) -> Self {
        let (receiver, slot) = store.attach_runner();
        Self {
            store: store.clone(),
            deps,
            registry: Arc::new(registry),
            receiver,
            _slot: slot,
        }
    }

    /// Run in the background and return a handle to the task.
    pub fn start(self) -> RunnerHandle {
        info!(
            effect_count = self.registry.effect_count(),
            "starting effect runner"
        );
        RunnerHandle {
            handle: tokio::spawn(self.run()),
        }
    }

    /// Process actions until the bus is closed.
    ///
    /// Normally spawned through [`EffectRunner::start`]. The bus only closes
    /// when every store handle is gone.
    pub async fn run(mut self) {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) => self.route(envelope),
                Err(RecvError::Lagged(n)) => {
                    warn!(missed = n, "action bus lagged, missed actions");
                }
                Err(RecvError::Closed) => {
                    info!("action bus closed, effect runner shutting down");
                    break;
                }
            }
        }

        info!("effect runner stopped");
    }

    fn route(&self, envelope: ActionEnvelope<A>) {
        let tracker = self.store.inflight();

        // Only counted envelopes are settled here; the store counted this one
        // if its correlation is being awaited.
        let tracked = tracker.has_pending_work(envelope.cid);
        let _envelope_guard = tracked.then(|| InflightGuard::adopt(tracker.clone(), envelope.cid));

        for registration in self.registry.matching(envelope.kind()) {
            if tracked {
                tracker.inc(envelope.cid, 1);
            }
            let chain_guard = tracked.then(|| InflightGuard::adopt(tracker.clone(), envelope.cid));

            let ctx = EffectContext::new(
                self.store.clone(),
                self.deps.clone(),
                envelope.cid,
                registration.tag,
                envelope.generation,
                registration.strategy,
            );

            debug!(
                effect = registration.name,
                tag = registration.tag,
                cid = %envelope.cid,
                strategy = %registration.strategy,
                "spawning effect chain"
            );

            let handle = spawn_chain(
                registration.clone(),
                self.store.clone(),
                envelope.action.clone(),
                ctx,
                chain_guard,
            );

            if registration.strategy == FlattenStrategy::Switch {
                registration.supersede(handle.abort_handle());
            }
        }
    }
}

fn spawn_chain<S, A, D>(
    registration: Arc<Registration<S, A, D>>,
    store: Store<S, A>,
    action: A,
    ctx: EffectContext<S, A, D>,
    guard: Option<InflightGuard>,
) -> JoinHandle<()>
where
    S: Send + Sync + 'static,
    A: Action,
    D: Send + Sync + 'static,
{
    tokio::spawn(async move {
        let _guard = guard;
        let cid = ctx.correlation_id();
        let generation = ctx.generation();
        let strategy = ctx.strategy();
        let effect = registration.name;
        let tag = registration.tag;

        let outcome = AssertUnwindSafe(registration.effect.run(action, ctx))
            .catch_unwind()
            .await;

        let follow_ups: Vec<A> = match outcome {
            Ok(Ok(actions)) => actions.into_vec(),
            Ok(Err(err)) => {
                error!(effect, tag, %cid, error = %format!("{:#}", err), "effect failed");
                let failed = EffectFailed::from_error(&err, effect, tag, cid);
                store.inflight().record_error(cid, err);
                registration.effect.recover(&failed).into_iter().collect()
            }
            Err(panic_info) => {
                let message = panic_message(panic_info.as_ref());
                error!(effect, tag, %cid, panic = %message, "effect panicked");
                let failed = EffectFailed::panicked(effect, tag, cid);
                store
                    .inflight()
                    .record_error(cid, RefluxError::EffectPanicked { effect, message }.into());
                registration.effect.recover(&failed).into_iter().collect()
            }
        };

        for follow_up in follow_ups {
            let dispatched = match strategy {
                FlattenStrategy::Merge => {
                    store.dispatch_with_correlation(follow_up, cid);
                    true
                }
                FlattenStrategy::Switch => store.dispatch_if_current(follow_up, cid, tag, generation),
            };
            if !dispatched {
                debug!(effect, tag, %cid, "chain superseded, dropping follow-up actions");
                break;
            }
        }
    })
}

impl<S, A, D> std::fmt::Debug for EffectRunner<S, A, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRunner")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Handle to a running effect runner.
#[derive(Debug)]
pub struct RunnerHandle {
    handle: JoinHandle<()>,
}

impl RunnerHandle {
    /// Stop routing actions.
    ///
    /// Chains already spawned keep running to completion. Call this during
    /// test teardown or shutdown.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Whether the runner task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
