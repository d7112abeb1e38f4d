//! Routing table from action tags to effects.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tokio::task::AbortHandle;
use tracing::{trace, warn};

use crate::core::FlattenStrategy;
use crate::effect::Effect;
use crate::error::RefluxError;

/// One effect bound to one tag, plus its switch lane.
pub(crate) struct Registration<S, A, D> {
    pub(crate) name: &'static str,
    pub(crate) tag: &'static str,
    pub(crate) strategy: FlattenStrategy,
    pub(crate) effect: Box<dyn Effect<S, A, D>>,
    /// Abort handle of the chain currently running in this lane (switch only).
    lane: Mutex<Option<AbortHandle>>,
}

impl<S, A, D> Registration<S, A, D> {
    /// Make `handle` the lane's running chain, aborting the previous one.
    pub(crate) fn supersede(&self, handle: AbortHandle) {
        let mut lane = match self.lane.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(effect = self.name, "lane mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        if let Some(previous) = lane.replace(handle) {
            if !previous.is_finished() {
                trace!(effect = self.name, tag = self.tag, "aborting superseded chain");
                previous.abort();
            }
        }
    }
}

/// Which effects run for which action tags, and how repeated actions are
/// flattened.
///
/// # Example
///
/// ```ignore
/// let registry = EffectRegistry::new()
///     .on(TRY_SIGNUP, FlattenStrategy::Switch, SignupEffect)
///     .on(LOGOUT, FlattenStrategy::Merge, LogoutEffect);
/// ```
pub struct EffectRegistry<S, A, D> {
    routes: HashMap<&'static str, Vec<Arc<Registration<S, A, D>>>>,
}

impl<S, A, D> EffectRegistry<S, A, D> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Register an effect for a tag.
    ///
    /// # Panics
    ///
    /// Panics if the same effect is already registered for this tag.
    /// Use `try_on` for a non-panicking version.
    pub fn on<E>(self, tag: &'static str, strategy: FlattenStrategy, effect: E) -> Self
    where
        E: Effect<S, A, D>,
    {
        self.try_on(tag, strategy, effect)
            .unwrap_or_else(|e| panic!("{}", e))
    }

    /// Register an effect for a tag, returning an error on duplicates.
    pub fn try_on<E>(mut self, tag: &'static str, strategy: FlattenStrategy, effect: E) -> Result<Self>
    where
        E: Effect<S, A, D>,
    {
        let name = effect.name();
        let lanes = self.routes.entry(tag).or_default();
        if lanes.iter().any(|r| r.name == name) {
            return Err(RefluxError::EffectAlreadyRegistered { effect: name, tag }.into());
        }
        lanes.push(Arc::new(Registration {
            name,
            tag,
            strategy,
            effect: Box::new(effect),
            lane: Mutex::new(None),
        }));
        Ok(self)
    }

    /// Registrations for a tag, in registration order.
    pub(crate) fn matching(&self, tag: &str) -> &[Arc<Registration<S, A, D>>] {
        self.routes.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether any effect observes `tag`.
    pub fn handles(&self, tag: &str) -> bool {
        !self.matching(tag).is_empty()
    }

    /// Total number of registrations.
    pub fn effect_count(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    /// Tags with at least one effect, sorted.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.routes.keys().copied().collect();
        tags.sort_unstable();
        tags
    }
}

impl<S, A, D> Default for EffectRegistry<S, A, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A, D> std::fmt::Debug for EffectRegistry<S, A, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("tags", &self.tags())
            .field("effect_count", &self.effect_count())
            .finish()
    }
}
