//! # Reflux
//!
//! A unidirectional state store where reducers decide, effects execute, and
//! actions close the loop.
//!
//! ## Core Concepts
//!
//! - [`Action`] = an intent ("try signup") or an outcome ("set token")
//! - [`Reducer`] = a pure, synchronous `(state, action) -> state` transition
//! - [`Effect`] = async IO triggered by an action, returning follow-up actions
//!
//! ## Architecture
//!
//! ```text
//! Caller
//!     │
//!     ▼ dispatch()
//! Store ── reducer(state, action) ── state updated
//!     │
//!     ▼ publish (same order as reduced)
//! ActionBus
//!     │
//!     ▼ subscribe()
//! EffectRunner.run() loop
//!     │
//!     ├─► Effect A (switch) ─► returns [SetToken] ─┐
//!     │                                            │
//!     └─► Effect B (merge)  ─► returns []          │
//!                                                  │
//!     ┌────────────── dispatch() ◄─────────────────┘
//!     ▼
//! Store
//! ```
//!
//! ## Key Invariants
//!
//! 1. **State changes only in reducers** - reducers are pure, no IO
//! 2. **Effects never mutate state** - they read snapshots and return actions
//! 3. **Dispatch order is reduce order** - effects see actions in that order
//! 4. **Switch lanes never dispatch stale results** - once a newer action of
//!    the same tag is dispatched, the old chain cannot reach the reducers
//! 5. **Failures become actions** - raw errors are logged, and only sanitized
//!    failures reach the store
//!
//! ## Example
//!
//! ```ignore
//! use reflux::{smallvec, CombinedReducer, Effect, EffectContext, EffectRegistry,
//!     EffectRunner, Emitted, FlattenStrategy, Store};
//!
//! let store = Store::new(AppState::default(), app_reducer());
//!
//! let effects = EffectRegistry::new()
//!     .on(TRY_SIGNUP, FlattenStrategy::Switch, SignupEffect)
//!     .on(LOGOUT, FlattenStrategy::Merge, LogoutEffect);
//!
//! let runner = EffectRunner::new(&store, deps, effects).start();
//!
//! store.dispatch_and_settle(AuthAction::TrySignup(credentials).into()).await?;
//! assert!(store.snapshot().auth.authenticated);
//! ```
//!
//! ## What This Is Not
//!
//! Reflux is **not**:
//! - Persistent (state lives in memory)
//! - Time-travelling (no action log or replay)
//! - A job system (chains die with the process)

// Core modules
mod bus;
mod core;
mod effect;
mod error;
mod inflight;
mod reducer;
mod registry;
mod runner;
mod store;

// Testing utilities (feature-gated)
#[cfg(feature = "testing")]
pub mod testing;


// Re-export core types
pub use crate::core::{Action, ActionEnvelope, CorrelationId, Emitted, FlattenStrategy};

// Re-export error types
pub use crate::error::{Categorizable, Categorized, EffectFailed, RefluxError, SafeErrorCategory};

pub use bus::ActionBus;
pub use effect::{Effect, EffectContext};
pub use inflight::{InflightGuard, InflightTracker, WaiterGuard};
pub use reducer::{CombinedReducer, Reducer, Slice};
pub use registry::EffectRegistry;
pub use runner::{EffectRunner, RunnerHandle};
pub use store::{Selection, Store, DEFAULT_SETTLE_TIMEOUT};

// Re-export for effect implementations
pub use async_trait::async_trait;
pub use smallvec::smallvec;
