pub const TRY_SIGNUP: &str = "auth/try-signup";
pub const TRY_SIGNIN: &str = "auth/try-signin";
pub const SIGNUP: &str = "auth/signup";
pub const SIGNIN: &str = "auth/signin";
pub const SET_TOKEN: &str = "auth/set-token";
pub const LOGOUT: &str = "auth/logout";
pub const AUTH_FAILED: &str = "auth/failed";

/// Email and password typed into the signup or signin form.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthCredentials {
    pub username: String,
    pub password: String,
}

impl AuthCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthAction {
    /// Create an account with these credentials
    TrySignup(AuthCredentials),
    /// Sign in with these credentials
    TrySignin(AuthCredentials),
    /// An account was created and is the current session
    Signup,
    /// An existing account is the current session
    Signin,
    /// The current session's ID token
    SetToken(String),
    Logout,
    /// Signup or signin failed; `message` is safe to show
    AuthFailed { message: String },
}

impl AuthAction {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthAction::TrySignup(_) => TRY_SIGNUP,
            AuthAction::TrySignin(_) => TRY_SIGNIN,
            AuthAction::Signup => SIGNUP,
            AuthAction::Signin => SIGNIN,
            AuthAction::SetToken(_) => SET_TOKEN,
            AuthAction::Logout => LOGOUT,
            AuthAction::AuthFailed { .. } => AUTH_FAILED,
        }
    }
}
