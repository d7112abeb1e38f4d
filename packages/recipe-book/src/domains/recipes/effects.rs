//! Recipe effects: whole-collection reads and writes.

use anyhow::Result;
use reflux::{async_trait, smallvec, Effect, EffectContext, EffectFailed, Emitted};
use tracing::debug;

use super::actions::{RecipeAction, SyncOperation};
use super::models::normalize_recipes;
use crate::kernel::AppDeps;
use crate::state::{AppAction, ApplicationState};

type Ctx = EffectContext<ApplicationState, AppAction, AppDeps>;

/// Session token to attach to database requests, if enabled.
fn auth_token(ctx: &Ctx) -> Option<String> {
    if !ctx.deps().send_auth_token {
        return None;
    }
    ctx.with_state(|state| state.auth.token.clone())
}

fn sync_failed(operation: SyncOperation, failure: &EffectFailed) -> Option<AppAction> {
    Some(
        RecipeAction::SyncFailed {
            operation,
            message: failure.safe_message.clone(),
        }
        .into(),
    )
}

/// `FetchRecipes` → read the collection and emit one `SetRecipes`.
pub struct FetchRecipesEffect;

#[async_trait]
impl Effect<ApplicationState, AppAction, AppDeps> for FetchRecipesEffect {
    async fn run(&self, _action: AppAction, ctx: Ctx) -> Result<Emitted<AppAction>> {
        let token = auth_token(&ctx);
        let documents = ctx.deps().recipes.fetch_recipes(token.as_deref()).await?;
        let recipes = normalize_recipes(documents);

        debug!(count = recipes.len(), cid = %ctx.correlation_id(), "fetched recipes");
        Ok(smallvec![AppAction::Recipes(RecipeAction::SetRecipes(recipes))])
    }

    fn recover(&self, failure: &EffectFailed) -> Option<AppAction> {
        sync_failed(SyncOperation::Fetch, failure)
    }
}

/// `StoreRecipes` → write the recipes in the store right now. Emits nothing
/// on success.
///
/// The body is read when the effect runs, not when the action was
/// dispatched, so edits reduced in between are included.
pub struct StoreRecipesEffect;

#[async_trait]
impl Effect<ApplicationState, AppAction, AppDeps> for StoreRecipesEffect {
    async fn run(&self, _action: AppAction, ctx: Ctx) -> Result<Emitted<AppAction>> {
        let recipes = ctx.with_state(|state| state.recipes.recipes.clone());
        let token = auth_token(&ctx);
        ctx.deps()
            .recipes
            .store_recipes(&recipes, token.as_deref())
            .await?;

        debug!(count = recipes.len(), cid = %ctx.correlation_id(), "stored recipes");
        Ok(Emitted::new())
    }

    fn recover(&self, failure: &EffectFailed) -> Option<AppAction> {
        sync_failed(SyncOperation::Store, failure)
    }
}
