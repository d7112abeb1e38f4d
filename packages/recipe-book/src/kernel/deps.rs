//! Application dependencies for effects (using traits for testability)
//!
//! This module provides the dependency container used by all domain effects.
//! All external services use trait abstractions to enable testing.

use anyhow::{Context, Result};
use async_trait::async_trait;
use firebase_client::{FirebaseAuth, FirebaseDatabase};
use reflux::Categorized;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::domains::recipes::models::{Recipe, RecipeDocument};
use crate::kernel::{BackendError, BaseAuthService, BaseNavigator, BaseRecipeStore};

/// Database path of the recipe collection.
pub const RECIPES_PATH: &str = "recipes";

// =============================================================================
// FirebaseAuth Adapter (implements BaseAuthService trait)
// =============================================================================

/// Wrapper around FirebaseAuth that implements BaseAuthService trait
pub struct FirebaseAuthAdapter(pub Arc<FirebaseAuth>);

impl FirebaseAuthAdapter {
    pub fn new(auth: Arc<FirebaseAuth>) -> Self {
        Self(auth)
    }
}

#[async_trait]
impl BaseAuthService for FirebaseAuthAdapter {
    async fn create_account(&self, email: &str, password: &str) -> Result<()> {
        self.0
            .create_user_with_email_and_password(email, password)
            .await
            .map(|_| ())
            .map_err(|e| Categorized::new(BackendError::from(e)))
            .context("create account")
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        self.0
            .sign_in_with_password(email, password)
            .await
            .map(|_| ())
            .map_err(|e| Categorized::new(BackendError::from(e)))
            .context("sign in")
    }

    async fn current_token(&self) -> Result<String> {
        self.0
            .id_token()
            .await
            .map_err(|e| Categorized::new(BackendError::from(e)))
            .context("read id token")
    }

    async fn sign_out(&self) {
        self.0.sign_out().await;
    }
}

// =============================================================================
// FirebaseDatabase Adapter (implements BaseRecipeStore trait)
// =============================================================================

/// Recipe collection stored at `<database>/recipes.json`
pub struct FirebaseRecipeStore {
    db: FirebaseDatabase,
    path: String,
}

impl FirebaseRecipeStore {
    pub fn new(db: FirebaseDatabase) -> Self {
        Self {
            db,
            path: RECIPES_PATH.to_string(),
        }
    }

    /// Use a different database path (e.g. per-user collections).
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }
}

#[async_trait]
impl BaseRecipeStore for FirebaseRecipeStore {
    async fn fetch_recipes(&self, auth_token: Option<&str>) -> Result<Vec<RecipeDocument>> {
        let recipes: Option<Vec<RecipeDocument>> = self
            .db
            .get(&self.path, auth_token)
            .await
            .map_err(|e| Categorized::new(BackendError::from(e)))
            .context("fetch recipes")?;
        Ok(recipes.unwrap_or_default())
    }

    async fn store_recipes(&self, recipes: &[Recipe], auth_token: Option<&str>) -> Result<()> {
        self.db
            .put(&self.path, recipes, auth_token)
            .await
            .map_err(|e| Categorized::new(BackendError::from(e)))
            .context("store recipes")
    }
}

// =============================================================================
// Navigator
// =============================================================================

/// Navigator for headless runs: there is no router, so navigation is logged.
pub struct LoggingNavigator;

impl BaseNavigator for LoggingNavigator {
    fn navigate(&self, path: &str) {
        info!(path, "navigate");
    }
}

// =============================================================================
// AppDeps
// =============================================================================

/// Application dependencies accessible to effects (using traits for testability)
#[derive(Clone)]
pub struct AppDeps {
    pub auth: Arc<dyn BaseAuthService>,
    pub recipes: Arc<dyn BaseRecipeStore>,
    pub navigator: Arc<dyn BaseNavigator>,
    /// Pass the session token to recipe reads and writes
    pub send_auth_token: bool,
}

impl AppDeps {
    /// Create new AppDeps with the given dependencies
    pub fn new(
        auth: Arc<dyn BaseAuthService>,
        recipes: Arc<dyn BaseRecipeStore>,
        navigator: Arc<dyn BaseNavigator>,
    ) -> Self {
        Self {
            auth,
            recipes,
            navigator,
            send_auth_token: false,
        }
    }

    /// Enable or disable sending the auth token with recipe requests
    pub fn with_send_auth_token(mut self, enabled: bool) -> Self {
        self.send_auth_token = enabled;
        self
    }

    /// Wire the Firebase-backed services from configuration
    pub fn from_config(config: &Config) -> Self {
        let auth = FirebaseAuth::new(config.firebase_api_key.clone())
            .with_base_url(config.firebase_auth_url.clone());
        let db = FirebaseDatabase::new(config.firebase_database_url.clone());

        Self::new(
            Arc::new(FirebaseAuthAdapter::new(Arc::new(auth))),
            Arc::new(FirebaseRecipeStore::new(db)),
            Arc::new(LoggingNavigator),
        )
        .with_send_auth_token(config.send_auth_token)
    }
}
