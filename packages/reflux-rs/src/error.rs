//! Structured error types and failure records for reflux.
//!
//! `RefluxError` provides pattern-matchable errors for store and runner
//! operations. `EffectFailed` is the sanitized record built when an effect
//! returns an error or panics.
//!
//! # Boundary
//!
//! > **No raw `anyhow::Error` ever reaches the store.**
//!
//! - `anyhow` carries errors inside effects
//! - `EffectFailed` carries only a category and a user-safe message, and it is
//!   what an effect's failure branch turns into a "failed" action
//!
//! # Categorizing Domain Errors
//!
//! Rust cannot downcast to `dyn Categorizable`, so domain errors that want a
//! specific category wrap themselves in [`Categorized`] before crossing the
//! effect boundary:
//!
//! ```ignore
//! let recipes = backend
//!     .fetch_recipes()
//!     .await
//!     .map_err(Categorized::new)?;
//! ```

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

use crate::core::CorrelationId;

/// Error category for sanitized failure records.
///
/// Only `Validation` and `NotFound` messages may describe the problem; the
/// other categories always carry a generic sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeErrorCategory {
    /// Bad input from the user.
    Validation,
    /// Something the user asked for does not exist.
    NotFound,
    /// Credentials rejected or session missing.
    Unauthorized,
    /// A bug or misconfiguration on our side.
    InternalError,
    /// The backend failed or could not be reached.
    ExternalService,
}

impl fmt::Display for SafeErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafeErrorCategory::Validation => write!(f, "validation_error"),
            SafeErrorCategory::NotFound => write!(f, "not_found"),
            SafeErrorCategory::Unauthorized => write!(f, "unauthorized"),
            SafeErrorCategory::InternalError => write!(f, "internal_error"),
            SafeErrorCategory::ExternalService => write!(f, "external_service_error"),
        }
    }
}

/// An error that knows which category it belongs to and what a user may see.
///
/// # Messages
///
/// - `Validation` and `NotFound` may describe the problem
/// - every other category returns a fixed, generic sentence
pub trait Categorizable: std::error::Error {
    /// Category shown to the store.
    fn category(&self) -> SafeErrorCategory;

    /// Message safe to put in application state.
    fn safe_message(&self) -> Cow<'static, str>;
}

/// A domain error paired with its safe category and message.
///
/// This is the concrete type `EffectFailed::from_error` looks for in an
/// error chain.
#[derive(Debug)]
pub struct Categorized {
    category: SafeErrorCategory,
    safe_message: Cow<'static, str>,
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl Categorized {
    /// Capture the category and safe message of a domain error.
    pub fn new<E>(error: E) -> Self
    where
        E: Categorizable + Send + Sync + 'static,
    {
        Self {
            category: error.category(),
            safe_message: error.safe_message(),
            source: Box::new(error),
        }
    }

    /// The captured category.
    pub fn category(&self) -> SafeErrorCategory {
        self.category
    }

    /// The captured user-safe message.
    pub fn safe_message(&self) -> &str {
        &self.safe_message
    }
}

impl fmt::Display for Categorized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The raw error is for logs; the safe message never replaces it here.
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for Categorized {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Sanitized record of a failed effect chain.
///
/// Handed to `Effect::recover`, which decides which "failed" action (if any)
/// the store should see.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectFailed {
    /// Name of the effect that failed.
    pub effect: &'static str,
    /// Tag of the action that started the chain.
    pub tag: &'static str,
    /// The category of failure.
    pub category: SafeErrorCategory,
    /// A sanitized, user-safe message. Contains no internal details.
    pub safe_message: String,
    /// Correlation ID of the triggering action.
    pub cid: CorrelationId,
}

impl EffectFailed {
    /// Build a failure record from an effect error.
    ///
    /// The raw error should be logged separately before sanitization.
    pub fn from_error(
        error: &anyhow::Error,
        effect: &'static str,
        tag: &'static str,
        cid: CorrelationId,
    ) -> Self {
        let (category, safe_message) = categorize_and_sanitize(error);
        Self {
            effect,
            tag,
            category,
            safe_message,
            cid,
        }
    }

    /// Build a failure record for a panicked effect.
    pub fn panicked(effect: &'static str, tag: &'static str, cid: CorrelationId) -> Self {
        Self {
            effect,
            tag,
            category: SafeErrorCategory::InternalError,
            safe_message: "An internal error occurred".into(),
            cid,
        }
    }
}

impl fmt::Display for EffectFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "effect {} for {} failed ({}): {}",
            self.effect, self.tag, self.category, self.safe_message
        )
    }
}

/// Pick the category and safe message for an effect error.
///
/// Walks the error chain so context layers added with `anyhow::Context` do
/// not hide a [`Categorized`] source.
fn categorize_and_sanitize(error: &anyhow::Error) -> (SafeErrorCategory, String) {
    for cause in error.chain() {
        if let Some(e) = cause.downcast_ref::<Categorized>() {
            return (e.category(), e.safe_message().to_string());
        }
        if let Some(e) = cause.downcast_ref::<RefluxError>() {
            return (e.category(), e.safe_message().into_owned());
        }
    }

    // The raw message may hold credentials or backend internals.
    (
        SafeErrorCategory::InternalError,
        "An internal error occurred".into(),
    )
}

/// Structured error type for reflux operations.
#[derive(Debug, Error)]
pub enum RefluxError {
    /// Timeout waiting for correlated work to complete.
    #[error("operation timed out after {duration:?}")]
    Timeout {
        /// How long we waited.
        duration: std::time::Duration,
    },

    /// An effect panicked while handling an action.
    #[error("effect {effect} panicked: {message}")]
    EffectPanicked {
        /// Name of the effect.
        effect: &'static str,
        /// The panic payload, when it was a string.
        message: String,
    },

    /// The same effect was registered twice for one tag.
    #[error("effect {effect} already registered for {tag}")]
    EffectAlreadyRegistered {
        /// Name of the effect.
        effect: &'static str,
        /// Routing tag.
        tag: &'static str,
    },
}

impl Categorizable for RefluxError {
    fn category(&self) -> SafeErrorCategory {
        SafeErrorCategory::InternalError
    }

    fn safe_message(&self) -> Cow<'static, str> {
        match self {
            RefluxError::Timeout { .. } => "Operation timed out".into(),
            _ => "An internal error occurred".into(),
        }
    }
}
