pub mod actions;
pub mod effects;
pub mod reducer;

pub use actions::{AuthAction, AuthCredentials};
pub use effects::{LogoutEffect, SigninEffect, SignupEffect};
pub use reducer::AuthState;
