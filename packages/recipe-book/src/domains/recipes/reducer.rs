use serde::Serialize;

use super::actions::{RecipeAction, SyncOperation};
use super::models::Recipe;
use crate::state::AppAction;

/// The last backend round-trip that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncError {
    pub operation: SyncOperation,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecipesState {
    pub recipes: Vec<Recipe>,
    pub last_error: Option<SyncError>,
}

pub fn reduce(state: &mut RecipesState, action: &AppAction) {
    let AppAction::Recipes(action) = action else {
        return;
    };

    match action {
        RecipeAction::SetRecipes(recipes) => {
            state.recipes = recipes.clone();
            state.last_error = None;
        }
        RecipeAction::AddRecipe(recipe) => state.recipes.push(recipe.clone()),
        RecipeAction::UpdateRecipe { index, recipe } => {
            if let Some(slot) = state.recipes.get_mut(*index) {
                *slot = recipe.clone();
            }
        }
        RecipeAction::DeleteRecipe { index } => {
            if *index < state.recipes.len() {
                state.recipes.remove(*index);
            }
        }
        RecipeAction::SyncFailed { operation, message } => {
            state.last_error = Some(SyncError {
                operation: *operation,
                message: message.clone(),
            });
        }
        RecipeAction::FetchRecipes | RecipeAction::StoreRecipes => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::auth::AuthAction;
    use reflux::testing::assert_reduces;

    fn tacos() -> Recipe {
        Recipe::new("Tacos")
    }

    #[test]
    fn test_set_replaces_whole_slice() {
        let mut state = RecipesState {
            recipes: vec![Recipe::new("Old"), Recipe::new("Older")],
            last_error: Some(SyncError {
                operation: SyncOperation::Fetch,
                message: "offline".into(),
            }),
        };

        assert_reduces!(
            reduce,
            state,
            AppAction::Recipes(RecipeAction::SetRecipes(vec![tacos()])) =>
                |s: &RecipesState| s.recipes == vec![tacos()] && s.last_error.is_none(),
        );
    }

    #[test]
    fn test_local_edits() {
        let mut state = RecipesState::default();

        assert_reduces!(
            reduce,
            state,
            AppAction::Recipes(RecipeAction::AddRecipe(tacos())) =>
                |s: &RecipesState| s.recipes.len() == 1,
            AppAction::Recipes(RecipeAction::AddRecipe(Recipe::new("Soup"))) =>
                |s: &RecipesState| s.recipes.len() == 2,
            AppAction::Recipes(RecipeAction::UpdateRecipe { index: 0, recipe: Recipe::new("Burrito") }) =>
                |s: &RecipesState| s.recipes[0].name == "Burrito",
            AppAction::Recipes(RecipeAction::DeleteRecipe { index: 0 }) =>
                |s: &RecipesState| s.recipes == vec![Recipe::new("Soup")],
        );
    }

    #[test]
    fn test_out_of_range_edits_are_ignored() {
        let mut state = RecipesState {
            recipes: vec![tacos()],
            last_error: None,
        };
        let before = state.clone();

        reduce(&mut state, &AppAction::Recipes(RecipeAction::DeleteRecipe { index: 3 }));
        reduce(
            &mut state,
            &AppAction::Recipes(RecipeAction::UpdateRecipe {
                index: 1,
                recipe: Recipe::new("Nope"),
            }),
        );

        assert_eq!(state, before);
    }

    #[test]
    fn test_sync_failure_is_surfaced() {
        let mut state = RecipesState::default();
        reduce(
            &mut state,
            &AppAction::Recipes(RecipeAction::SyncFailed {
                operation: SyncOperation::Store,
                message: "Not authorized".into(),
            }),
        );
        assert_eq!(state.last_error.as_ref().map(|e| e.operation), Some(SyncOperation::Store));
    }

    #[test]
    fn test_ignores_other_slices() {
        let mut state = RecipesState::default();
        reduce(&mut state, &AppAction::Auth(AuthAction::Logout));
        assert_eq!(state, RecipesState::default());
    }
}
