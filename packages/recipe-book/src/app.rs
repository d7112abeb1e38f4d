//! Effect registration and application boot.

use reflux::{EffectRegistry, EffectRunner, FlattenStrategy, RunnerHandle, Store};
use tracing::info;

use crate::domains::auth::actions::{LOGOUT, TRY_SIGNIN, TRY_SIGNUP};
use crate::domains::auth::{LogoutEffect, SigninEffect, SignupEffect};
use crate::domains::recipes::actions::{FETCH_RECIPES, STORE_RECIPES};
use crate::domains::recipes::{FetchRecipesEffect, StoreRecipesEffect};
use crate::kernel::AppDeps;
use crate::state::{app_reducer, AppAction, ApplicationState};

pub type AppStore = Store<ApplicationState, AppAction>;

/// Every effect of the application, keyed by the action tag it handles.
///
/// Credential exchanges and fetches switch to the latest request. Logout and
/// store run every request to completion.
pub fn app_effects() -> EffectRegistry<ApplicationState, AppAction, AppDeps> {
    EffectRegistry::new()
        .on(TRY_SIGNUP, FlattenStrategy::Switch, SignupEffect)
        .on(TRY_SIGNIN, FlattenStrategy::Switch, SigninEffect)
        .on(LOGOUT, FlattenStrategy::Merge, LogoutEffect)
        .on(FETCH_RECIPES, FlattenStrategy::Switch, FetchRecipesEffect)
        .on(STORE_RECIPES, FlattenStrategy::Merge, StoreRecipesEffect)
}

/// A running application: the store plus its effect runner.
pub struct App {
    pub store: AppStore,
    runner: RunnerHandle,
}

impl App {
    /// Build the store and start the effect runner.
    ///
    /// Must be called inside a tokio runtime.
    pub fn boot(deps: AppDeps) -> Self {
        let store = Store::new(ApplicationState::default(), app_reducer());
        let runner = EffectRunner::new(&store, deps, app_effects()).start();
        info!(runners = store.runner_count(), "application booted");
        Self { store, runner }
    }

    pub fn shutdown(&self) {
        self.runner.abort();
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.runner.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_every_intent() {
        let effects = app_effects();

        for tag in [TRY_SIGNUP, TRY_SIGNIN, LOGOUT, FETCH_RECIPES, STORE_RECIPES] {
            assert!(effects.handles(tag), "no effect for {}", tag);
        }
        assert!(!effects.handles("recipes/set"));
        assert_eq!(effects.effect_count(), 5);
    }
}
