// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Naming convention: Base* for trait names (e.g., BaseAuthService)

use anyhow::Result;
use async_trait::async_trait;

use crate::domains::recipes::models::{Recipe, RecipeDocument};

// =============================================================================
// Auth Trait
// =============================================================================

#[async_trait]
pub trait BaseAuthService: Send + Sync {
    /// Create an account; on success it becomes the current session
    async fn create_account(&self, email: &str, password: &str) -> Result<()>;

    /// Sign in with credentials; on success it becomes the current session
    async fn sign_in(&self, email: &str, password: &str) -> Result<()>;

    /// ID token of the current session
    async fn current_token(&self) -> Result<String>;

    /// Drop the current session
    async fn sign_out(&self);
}

// =============================================================================
// Recipe Storage Trait
// =============================================================================

#[async_trait]
pub trait BaseRecipeStore: Send + Sync {
    /// Read the whole recipe collection (empty when nothing is stored)
    async fn fetch_recipes(&self, auth_token: Option<&str>) -> Result<Vec<RecipeDocument>>;

    /// Replace the whole recipe collection
    async fn store_recipes(&self, recipes: &[Recipe], auth_token: Option<&str>) -> Result<()>;
}

// =============================================================================
// Navigation Trait
// =============================================================================

pub trait BaseNavigator: Send + Sync {
    /// Route the UI to `path`
    fn navigate(&self, path: &str);
}
