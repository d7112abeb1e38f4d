use serde::{Deserialize, Serialize};

/// Body for `accounts:signUp` and `accounts:signInWithPassword`.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordAuthRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(rename = "returnSecureToken")]
    pub return_secure_token: bool,
}

/// A signed-in user, as returned by the Identity Toolkit.
#[derive(Clone, Deserialize)]
pub struct AuthSession {
    #[serde(rename = "idToken")]
    pub id_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
    #[serde(rename = "localId")]
    pub local_id: String,
    pub email: Option<String>,
    /// Token lifetime in seconds, as a decimal string.
    #[serde(rename = "expiresIn")]
    pub expires_in: Option<String>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("local_id", &self.local_id)
            .field("email", &self.email)
            .field("id_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Identity Toolkit error body: `{"error": {"code": 400, "message": "EMAIL_EXISTS"}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthErrorBody {
    pub error: AuthErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthErrorDetail {
    pub code: u16,
    pub message: String,
}

impl AuthErrorDetail {
    /// The bare error code.
    ///
    /// Some messages carry a human suffix, e.g.
    /// `WEAK_PASSWORD : Password should be at least 6 characters`.
    pub fn error_code(&self) -> &str {
        self.message
            .split(" : ")
            .next()
            .unwrap_or(&self.message)
            .trim()
    }
}

/// Realtime Database error body: `{"error": "Permission denied"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseErrorBody {
    pub error: String,
}
