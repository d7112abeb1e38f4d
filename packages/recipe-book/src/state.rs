//! Application state and the top-level action enum.
//!
//! Each feature owns one slice and one reducer; reducers only see their own
//! slice.

use reflux::{Action, CombinedReducer};
use serde::Serialize;

use crate::domains::auth::reducer as auth_reducer;
use crate::domains::recipes::reducer as recipes_reducer;

pub use crate::domains::auth::{AuthAction, AuthState};
pub use crate::domains::recipes::{RecipeAction, RecipesState};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplicationState {
    pub auth: AuthState,
    pub recipes: RecipesState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    Auth(AuthAction),
    Recipes(RecipeAction),
}

impl Action for AppAction {
    fn kind(&self) -> &'static str {
        match self {
            AppAction::Auth(action) => action.kind(),
            AppAction::Recipes(action) => action.kind(),
        }
    }
}

impl From<AuthAction> for AppAction {
    fn from(action: AuthAction) -> Self {
        AppAction::Auth(action)
    }
}

impl From<RecipeAction> for AppAction {
    fn from(action: RecipeAction) -> Self {
        AppAction::Recipes(action)
    }
}

/// The root reducer: one slice per feature.
pub fn app_reducer() -> CombinedReducer<ApplicationState, AppAction> {
    CombinedReducer::new()
        .slice("auth", |s: &mut ApplicationState| &mut s.auth, auth_reducer::reduce)
        .slice(
            "recipes",
            |s: &mut ApplicationState| &mut s.recipes,
            recipes_reducer::reduce,
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::recipes::Recipe;
    use reflux::Reducer;

    #[test]
    fn test_actions_only_touch_their_slice() {
        let reducer = app_reducer();
        let mut state = ApplicationState::default();

        reducer.reduce(&mut state, &AppAction::from(AuthAction::SetToken("t".into())));
        reducer.reduce(
            &mut state,
            &AppAction::from(RecipeAction::AddRecipe(Recipe::new("Tacos"))),
        );

        assert_eq!(state.auth.token.as_deref(), Some("t"));
        assert_eq!(state.recipes.recipes.len(), 1);
        assert_eq!(reducer.names(), vec!["auth", "recipes"]);
    }

    #[test]
    fn test_kind_delegates_to_feature() {
        assert_eq!(AppAction::from(AuthAction::Logout).kind(), "auth/logout");
        assert_eq!(
            AppAction::from(RecipeAction::FetchRecipes).kind(),
            "recipes/fetch"
        );
    }
}
