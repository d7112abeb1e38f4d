//! Effect trait and context for side-effect execution.
//!
//! Effects observe dispatched actions, perform IO, and return follow-up
//! actions. They hold no state of their own between runs.
//!
//! # Key Properties
//!
//! - **Return actions**: effects never dispatch; the runner dispatches what
//!   they return, under the triggering action's correlation
//! - **Read-only state**: the context exposes snapshots, never `&mut`
//! - **Failures become actions**: `recover` maps a sanitized failure to an
//!   optional "failed" action

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::core::{Action, CorrelationId, Emitted, FlattenStrategy};
use crate::error::EffectFailed;
use crate::store::{Selection, Store};

/// Context passed to effect handlers.
///
/// Cheap to clone; clones are semantically identical.
///
/// # Narrow API
///
/// Effects only:
/// 1. access dependencies via `deps()`
/// 2. read the state via `snapshot()`, `with_state()` or `select()`
/// 3. return actions (the runner dispatches them)
pub struct EffectContext<S, A, D> {
    store: Store<S, A>,
    deps: Arc<D>,
    cid: CorrelationId,
    tag: &'static str,
    generation: u64,
    strategy: FlattenStrategy,
}

impl<S, A, D> EffectContext<S, A, D>
where
    S: Send + Sync + 'static,
    A: Action,
{
    pub(crate) fn new(
        store: Store<S, A>,
        deps: Arc<D>,
        cid: CorrelationId,
        tag: &'static str,
        generation: u64,
        strategy: FlattenStrategy,
    ) -> Self {
        Self {
            store,
            deps,
            cid,
            tag,
            generation,
            strategy,
        }
    }

    /// Get shared dependencies.
    pub fn deps(&self) -> &D {
        &self.deps
    }

    /// Clone the current state.
    ///
    /// Reflects every action reduced so far, including actions dispatched
    /// after the one that started this chain.
    pub fn snapshot(&self) -> S
    where
        S: Clone,
    {
        self.store.snapshot()
    }

    /// Read the current state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        self.store.with_state(f)
    }

    /// A live view of part of the state.
    pub fn select<T, F>(&self, project: F) -> Selection<S, T>
    where
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        self.store.select(project)
    }

    /// Correlation ID of the triggering action.
    pub fn correlation_id(&self) -> CorrelationId {
        self.cid
    }

    /// Tag of the triggering action.
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// Whether this chain may still dispatch.
    ///
    /// Always true for merge lanes. A switch lane goes stale as soon as a
    /// newer action of the same tag is dispatched; long effects can check
    /// this to skip work nobody will observe.
    pub fn is_current(&self) -> bool {
        match self.strategy {
            FlattenStrategy::Merge => true,
            FlattenStrategy::Switch => self.store.is_current(self.tag, self.generation),
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn strategy(&self) -> FlattenStrategy {
        self.strategy
    }
}

impl<S, A, D> Clone for EffectContext<S, A, D> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            deps: self.deps.clone(),
            cid: self.cid,
            tag: self.tag,
            generation: self.generation,
            strategy: self.strategy,
        }
    }
}

impl<S, A, D> std::fmt::Debug for EffectContext<S, A, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectContext")
            .field("cid", &self.cid)
            .field("tag", &self.tag)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

/// Side-effect handler for one or more action tags.
///
/// # Example
///
/// ```ignore
/// struct FetchRecipesEffect;
///
/// #[async_trait]
/// impl Effect<AppState, AppAction, AppDeps> for FetchRecipesEffect {
///     async fn run(
///         &self,
///         _action: AppAction,
///         ctx: EffectContext<AppState, AppAction, AppDeps>,
///     ) -> Result<Emitted<AppAction>> {
///         let recipes = ctx.deps().recipes.fetch_recipes(None).await?;
///         Ok(smallvec![RecipeAction::SetRecipes(recipes).into()])
///     }
/// }
/// ```
#[async_trait]
pub trait Effect<S, A, D>: Send + Sync + 'static {
    /// Handle an action and return the follow-up actions to dispatch.
    ///
    /// # Errors
    ///
    /// Return `Err` when the side effect fails. The runner logs the raw
    /// error, sanitizes it into an [`EffectFailed`] and passes that to
    /// [`Effect::recover`].
    async fn run(&self, action: A, ctx: EffectContext<S, A, D>) -> Result<Emitted<A>>;

    /// Map a failed run to an action for the store, if any.
    fn recover(&self, failure: &EffectFailed) -> Option<A> {
        let _ = failure;
        None
    }

    /// Name used in logs and failure records.
    fn name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Strip the module path from a type name, keeping generic arguments intact.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("my_app::effects::SignupEffect"), "SignupEffect");
        assert_eq!(short_type_name("Plain"), "Plain");
        assert_eq!(
            short_type_name("my_app::Wrapper<my_app::Inner>"),
            "Wrapper<my_app::Inner>"
        );
    }
}
