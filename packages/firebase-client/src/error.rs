//! Error types for the Firebase client.

use thiserror::Error;

/// Result type for Firebase client operations.
pub type Result<T> = std::result::Result<T, FirebaseError>;

/// Firebase client errors.
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Identity Toolkit rejected the request (e.g. `EMAIL_EXISTS`)
    #[error("Auth error ({status}): {code}")]
    Auth { status: u16, code: String },

    /// Realtime Database returned a non-2xx response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A token was requested while no user is signed in
    #[error("No user is signed in")]
    NoCurrentUser,

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl FirebaseError {
    /// The Identity Toolkit error code, for auth rejections.
    pub fn auth_code(&self) -> Option<&str> {
        match self {
            FirebaseError::Auth { code, .. } => Some(code),
            _ => None,
        }
    }

    /// HTTP status of a rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            FirebaseError::Auth { status, .. } | FirebaseError::Api { status, .. } => Some(*status),
            FirebaseError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
