pub mod actions;
pub mod effects;
pub mod models;
pub mod reducer;

pub use actions::{RecipeAction, SyncOperation};
pub use effects::{FetchRecipesEffect, StoreRecipesEffect};
pub use models::{normalize_recipes, Ingredient, Recipe, RecipeDocument};
pub use reducer::{RecipesState, SyncError};
