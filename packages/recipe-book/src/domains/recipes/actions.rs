use serde::Serialize;

use super::models::Recipe;

pub const FETCH_RECIPES: &str = "recipes/fetch";
pub const SET_RECIPES: &str = "recipes/set";
pub const STORE_RECIPES: &str = "recipes/store";
pub const ADD_RECIPE: &str = "recipes/add";
pub const UPDATE_RECIPE: &str = "recipes/update";
pub const DELETE_RECIPE: &str = "recipes/delete";
pub const SYNC_FAILED: &str = "recipes/sync-failed";

/// Which backend round-trip failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    Fetch,
    Store,
}

impl std::fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncOperation::Fetch => write!(f, "fetch"),
            SyncOperation::Store => write!(f, "store"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecipeAction {
    /// Load the collection from the backend
    FetchRecipes,
    /// Replace the whole recipes slice
    SetRecipes(Vec<Recipe>),
    /// Write the current recipes slice to the backend
    StoreRecipes,
    AddRecipe(Recipe),
    /// Replace the recipe at `index`; out-of-range indices are ignored
    UpdateRecipe { index: usize, recipe: Recipe },
    /// Remove the recipe at `index`; out-of-range indices are ignored
    DeleteRecipe { index: usize },
    SyncFailed {
        operation: SyncOperation,
        message: String,
    },
}

impl RecipeAction {
    pub fn kind(&self) -> &'static str {
        match self {
            RecipeAction::FetchRecipes => FETCH_RECIPES,
            RecipeAction::SetRecipes(_) => SET_RECIPES,
            RecipeAction::StoreRecipes => STORE_RECIPES,
            RecipeAction::AddRecipe(_) => ADD_RECIPE,
            RecipeAction::UpdateRecipe { .. } => UPDATE_RECIPE,
            RecipeAction::DeleteRecipe { .. } => DELETE_RECIPE,
            RecipeAction::SyncFailed { .. } => SYNC_FAILED,
        }
    }
}
