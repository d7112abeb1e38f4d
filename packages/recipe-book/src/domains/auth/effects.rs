//! Auth effects: credential exchange against the auth backend.
//!
//! Signup and signin are registered on switch lanes, so a second attempt
//! supersedes one still waiting on the backend.

use anyhow::Result;
use reflux::{async_trait, smallvec, Effect, EffectContext, EffectFailed, Emitted};
use tracing::{debug, info};

use super::actions::AuthAction;
use crate::kernel::AppDeps;
use crate::state::{AppAction, ApplicationState};

type Ctx = EffectContext<ApplicationState, AppAction, AppDeps>;

/// Root of the application, shown after signin and logout.
pub const ROOT_PATH: &str = "/";

fn auth_failed(failure: &EffectFailed) -> Option<AppAction> {
    Some(
        AuthAction::AuthFailed {
            message: failure.safe_message.clone(),
        }
        .into(),
    )
}

/// `TrySignup` → create the account, then emit `Signup` and `SetToken`.
pub struct SignupEffect;

#[async_trait]
impl Effect<ApplicationState, AppAction, AppDeps> for SignupEffect {
    async fn run(&self, action: AppAction, ctx: Ctx) -> Result<Emitted<AppAction>> {
        let AppAction::Auth(AuthAction::TrySignup(credentials)) = action else {
            return Ok(Emitted::new());
        };

        let auth = &ctx.deps().auth;
        auth.create_account(&credentials.username, &credentials.password)
            .await?;
        let token = auth.current_token().await?;

        info!(cid = %ctx.correlation_id(), "account created");
        Ok(smallvec![
            AppAction::Auth(AuthAction::Signup),
            AppAction::Auth(AuthAction::SetToken(token)),
        ])
    }

    fn recover(&self, failure: &EffectFailed) -> Option<AppAction> {
        auth_failed(failure)
    }
}

/// `TrySignin` → sign in, go to the root, then emit `Signin` and `SetToken`.
pub struct SigninEffect;

#[async_trait]
impl Effect<ApplicationState, AppAction, AppDeps> for SigninEffect {
    async fn run(&self, action: AppAction, ctx: Ctx) -> Result<Emitted<AppAction>> {
        let AppAction::Auth(AuthAction::TrySignin(credentials)) = action else {
            return Ok(Emitted::new());
        };

        let deps = ctx.deps();
        deps.auth
            .sign_in(&credentials.username, &credentials.password)
            .await?;
        let token = deps.auth.current_token().await?;

        // A superseded signin must not move the user around.
        if !ctx.is_current() {
            debug!(cid = %ctx.correlation_id(), "signin superseded before navigation");
            return Ok(Emitted::new());
        }
        deps.navigator.navigate(ROOT_PATH);

        info!(cid = %ctx.correlation_id(), "signed in");
        Ok(smallvec![
            AppAction::Auth(AuthAction::Signin),
            AppAction::Auth(AuthAction::SetToken(token)),
        ])
    }

    fn recover(&self, failure: &EffectFailed) -> Option<AppAction> {
        auth_failed(failure)
    }
}

/// `Logout` → drop the client session and go to the root. Emits nothing.
pub struct LogoutEffect;

#[async_trait]
impl Effect<ApplicationState, AppAction, AppDeps> for LogoutEffect {
    async fn run(&self, _action: AppAction, ctx: Ctx) -> Result<Emitted<AppAction>> {
        ctx.deps().auth.sign_out().await;
        ctx.deps().navigator.navigate(ROOT_PATH);
        Ok(Emitted::new())
    }
}
