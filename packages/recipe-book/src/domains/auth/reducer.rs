use serde::Serialize;

use super::actions::AuthAction;
use crate::state::AppAction;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthState {
    pub token: Option<String>,
    pub authenticated: bool,
    /// Safe message of the last failed signup or signin
    pub error: Option<String>,
}

pub fn reduce(state: &mut AuthState, action: &AppAction) {
    let AppAction::Auth(action) = action else {
        return;
    };

    match action {
        AuthAction::TrySignup(_) | AuthAction::TrySignin(_) => state.error = None,
        AuthAction::Signup | AuthAction::Signin => {
            state.authenticated = true;
            state.error = None;
        }
        AuthAction::SetToken(token) => state.token = Some(token.clone()),
        AuthAction::Logout => {
            state.token = None;
            state.authenticated = false;
            state.error = None;
        }
        AuthAction::AuthFailed { message } => state.error = Some(message.clone()),
    }
}
