//! Core types for the reflux store.
//!
//! # Overview
//!
//! Reflux separates **state transitions** from **side effects**:
//! - [`Action`] = an intent or an outcome, tagged by kind
//! - Reducers turn `(state, action)` into the next state, synchronously
//! - Effects observe actions, perform IO, and return follow-up actions
//!
//! # Correlation
//!
//! Every dispatched action travels inside an [`ActionEnvelope`] tagged with a
//! [`CorrelationId`]. Follow-up actions returned by an effect inherit the
//! correlation of the action that triggered it, which lets callers await the
//! whole chain (see `Store::dispatch_and_settle`).

use std::fmt;

use smallvec::SmallVec;
use uuid::Uuid;

/// An immutable description of an intent or an event outcome.
///
/// Each feature defines a closed enum of actions. `kind` returns the tag used
/// to route the action to registered effects, and must be stable per variant.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone)]
/// enum CounterAction {
///     Increment,
///     Reset,
/// }
///
/// impl Action for CounterAction {
///     fn kind(&self) -> &'static str {
///         match self {
///             CounterAction::Increment => "counter/increment",
///             CounterAction::Reset => "counter/reset",
///         }
///     }
/// }
/// ```
pub trait Action: Clone + fmt::Debug + Send + Sync + 'static {
    /// The routing tag for this action.
    fn kind(&self) -> &'static str;
}

/// Follow-up actions returned by an effect.
///
/// Most effects emit zero, one or two actions, so they stay inline.
pub type Emitted<A> = SmallVec<[A; 2]>;

/// How the runner flattens repeated actions of the same tag for one effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlattenStrategy {
    /// Switch to latest: a new action aborts the in-flight chain of the same
    /// lane, and a superseded chain never dispatches.
    #[default]
    Switch,
    /// Every action runs its own independent chain to completion.
    Merge,
}

impl fmt::Display for FlattenStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlattenStrategy::Switch => write!(f, "switch"),
            FlattenStrategy::Merge => write!(f, "merge"),
        }
    }
}

/// Correlation ID for tracking an action and the chains it triggers.
///
/// Use `CorrelationId::NONE` for uncorrelated work, or `CorrelationId::new()`
/// to generate a fresh ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Sentinel value for uncorrelated actions (nil UUID).
    pub const NONE: Self = Self(Uuid::nil());

    /// Create a new random correlation ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Check if this is the NONE sentinel value.
    pub fn is_none(&self) -> bool {
        self.0.is_nil()
    }

    /// Check if this is a real correlation ID (not NONE).
    pub fn is_some(&self) -> bool {
        !self.is_none()
    }

    /// Get the inner UUID value.
    pub fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for CorrelationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<CorrelationId> for Uuid {
    fn from(cid: CorrelationId) -> Uuid {
        cid.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Envelope wrapping a dispatched action with its correlation metadata.
///
/// Feature action enums stay clean; correlation is transport-level.
#[derive(Debug, Clone)]
pub struct ActionEnvelope<A> {
    /// Correlation ID for tracking related work
    pub cid: CorrelationId,
    /// The dispatched action
    pub action: A,
    /// Per-tag dispatch generation assigned by the store (0 when emitted
    /// directly on the bus)
    pub generation: u64,
}

impl<A: Action> ActionEnvelope<A> {
    /// Create a new envelope.
    pub fn new(cid: CorrelationId, action: A) -> Self {
        Self {
            cid,
            action,
            generation: 0,
        }
    }

    pub(crate) fn sequenced(cid: CorrelationId, action: A, generation: u64) -> Self {
        Self {
            cid,
            action,
            generation,
        }
    }

    /// Create an envelope with a new random correlation ID.
    pub fn new_random(action: A) -> Self {
        Self::new(CorrelationId::new(), action)
    }

    /// The routing tag of the wrapped action.
    pub fn kind(&self) -> &'static str {
        self.action.kind()
    }
}
