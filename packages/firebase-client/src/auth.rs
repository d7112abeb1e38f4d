//! Identity Toolkit (Firebase Auth) password sign-up and sign-in.

use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{FirebaseError, Result};
use crate::types::{AuthErrorBody, AuthSession, PasswordAuthRequest};

/// Identity Toolkit v1 endpoint.
pub const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Password auth client holding the current session.
///
/// Like the browser SDK, a successful sign-up or sign-in becomes the current
/// user, and `id_token` reads that user's token.
pub struct FirebaseAuth {
    http_client: Client,
    api_key: String,
    base_url: String,
    session: RwLock<Option<AuthSession>>,
}

impl FirebaseAuth {
    /// Create a client for the project owning `api_key`.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_AUTH_URL.to_string(),
            session: RwLock::new(None),
        }
    }

    /// Set a custom base URL (for the auth emulator, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create an account and sign it in.
    pub async fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession> {
        self.password_request("accounts:signUp", email, password)
            .await
    }

    /// Sign in an existing account.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.password_request("accounts:signInWithPassword", email, password)
            .await
    }

    /// The current user's ID token.
    pub async fn id_token(&self) -> Result<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.id_token.clone())
            .ok_or(FirebaseError::NoCurrentUser)
    }

    /// The current user, if any.
    pub async fn current_user(&self) -> Option<AuthSession> {
        self.session.read().await.clone()
    }

    /// Forget the current user. Local only; tokens are not revoked.
    pub async fn sign_out(&self) {
        self.session.write().await.take();
    }

    pub(crate) fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), method)
    }

    async fn password_request(&self, method: &str, email: &str, password: &str) -> Result<AuthSession> {
        let body = PasswordAuthRequest {
            email,
            password,
            return_secure_token: true,
        };

        let resp = self
            .http_client
            .post(self.endpoint(method))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let err = parse_auth_error(status.as_u16(), &text);
            warn!(method, status = %status, error = %err, "Firebase auth request rejected");
            return Err(err);
        }

        let session: AuthSession = resp
            .json()
            .await
            .map_err(|e| FirebaseError::Parse(format!("Failed to parse auth session: {}", e)))?;

        debug!(method, local_id = %session.local_id, "Firebase auth succeeded");
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }
}

impl std::fmt::Debug for FirebaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseAuth")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Turn an Identity Toolkit error response into a `FirebaseError`.
pub(crate) fn parse_auth_error(status: u16, body: &str) -> FirebaseError {
    match serde_json::from_str::<AuthErrorBody>(body) {
        Ok(parsed) => FirebaseError::Auth {
            status,
            code: parsed.error.error_code().to_string(),
        },
        Err(_) => FirebaseError::Api {
            status,
            message: body.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_building() {
        let auth = FirebaseAuth::new("key").with_base_url("http://localhost:9099/identitytoolkit.googleapis.com/v1/");
        assert_eq!(
            auth.endpoint("accounts:signUp"),
            "http://localhost:9099/identitytoolkit.googleapis.com/v1/accounts:signUp"
        );

        let auth = FirebaseAuth::new("key");
        assert_eq!(auth.base_url(), DEFAULT_AUTH_URL);
    }

    #[test]
    fn test_parse_auth_error_code() {
        let body = r#"{"error":{"code":400,"message":"EMAIL_EXISTS","errors":[]}}"#;
        let err = parse_auth_error(400, body);
        assert_eq!(err.auth_code(), Some("EMAIL_EXISTS"));
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_parse_auth_error_strips_description() {
        let body = r#"{"error":{"code":400,"message":"WEAK_PASSWORD : Password should be at least 6 characters"}}"#;
        let err = parse_auth_error(400, body);
        assert_eq!(err.auth_code(), Some("WEAK_PASSWORD"));
    }

    #[test]
    fn test_parse_auth_error_unexpected_body() {
        let err = parse_auth_error(503, "upstream unavailable");
        assert!(err.auth_code().is_none());
        assert!(matches!(err, FirebaseError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_no_current_user_before_sign_in() {
        let auth = FirebaseAuth::new("key");
        assert!(matches!(auth.id_token().await, Err(FirebaseError::NoCurrentUser)));
        assert!(auth.current_user().await.is_none());
        auth.sign_out().await;
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session: AuthSession = serde_json::from_str(
            r#"{"idToken":"secret-token","localId":"uid-1","email":"a@b.c","expiresIn":"3600"}"#,
        )
        .unwrap();
        let debug = format!("{:?}", session);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("uid-1"));
    }
}
