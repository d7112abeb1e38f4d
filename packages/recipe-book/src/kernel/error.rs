//! Backend failures, categorized for the store.

use std::borrow::Cow;

use firebase_client::FirebaseError;
use reflux::{Categorizable, SafeErrorCategory};
use thiserror::Error;

/// A failed call to the auth service or the recipe database.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct BackendError(#[from] FirebaseError);

impl BackendError {
    /// The underlying client error.
    pub fn inner(&self) -> &FirebaseError {
        &self.0
    }
}

impl Categorizable for BackendError {
    fn category(&self) -> SafeErrorCategory {
        match &self.0 {
            FirebaseError::Auth { code, .. } => match code.as_str() {
                "EMAIL_EXISTS" | "WEAK_PASSWORD" | "INVALID_EMAIL" | "MISSING_PASSWORD" => {
                    SafeErrorCategory::Validation
                }
                "TOO_MANY_ATTEMPTS_TRY_LATER" => SafeErrorCategory::ExternalService,
                _ => SafeErrorCategory::Unauthorized,
            },
            FirebaseError::NoCurrentUser => SafeErrorCategory::Unauthorized,
            FirebaseError::Api { status: 401 | 403, .. } => SafeErrorCategory::Unauthorized,
            FirebaseError::Api { .. } | FirebaseError::Network(_) | FirebaseError::Parse(_) => {
                SafeErrorCategory::ExternalService
            }
        }
    }

    fn safe_message(&self) -> Cow<'static, str> {
        match &self.0 {
            FirebaseError::Auth { code, .. } => match code.as_str() {
                "EMAIL_EXISTS" => "An account with this email already exists".into(),
                "WEAK_PASSWORD" => "Password should be at least 6 characters".into(),
                "INVALID_EMAIL" => "The email address is invalid".into(),
                "MISSING_PASSWORD" => "A password is required".into(),
                "TOO_MANY_ATTEMPTS_TRY_LATER" => "Service unavailable, try again later".into(),
                _ => "Invalid email or password".into(),
            },
            FirebaseError::NoCurrentUser => "Not signed in".into(),
            FirebaseError::Api { status: 401 | 403, .. } => "Not authorized".into(),
            FirebaseError::Api { .. } | FirebaseError::Parse(_) => {
                "The server could not complete the request".into()
            }
            FirebaseError::Network(_) => "Could not reach the server".into(),
        }
    }
}
