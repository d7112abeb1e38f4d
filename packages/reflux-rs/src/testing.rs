//! Testing utilities for reducers and effect chains.
//!
//! # Feature Flag
//!
//! This module is only available with the `testing` feature:
//!
//! ```toml
//! [dev-dependencies]
//! reflux = { path = "../reflux-rs", features = ["testing"] }
//! ```
//!
//! ## Using `assert_reduces!`
//!
//! ```ignore
//! use reflux::testing::assert_reduces;
//!
//! let mut state = AuthState::default();
//!
//! assert_reduces!(
//!     auth_reducer,
//!     state,
//!     AuthAction::SetToken("t".into()) => |s: &AuthState| s.token.as_deref() == Some("t"),
//!     AuthAction::Logout => |s: &AuthState| !s.authenticated,
//! );
//! ```
//!
//! ## Using `ActionRecorder`
//!
//! ```ignore
//! let recorder = ActionRecorder::attach(&store);
//!
//! store.dispatch(AuthAction::TrySignup(credentials).into());
//!
//! recorder.wait_for(3).await;
//! assert_eq!(recorder.kinds(), vec!["auth/try-signup", "auth/signup", "auth/set-token"]);
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::core::{Action, ActionEnvelope};
use crate::store::Store;

/// Applies a sequence of actions to a reducer and checks the state after each.
///
/// # Panics
///
/// Panics if any predicate returns false.
#[macro_export]
macro_rules! assert_reduces {
    ($reducer:expr, $state:expr, $($action:expr => $check:expr),+ $(,)?) => {
        $(
            let action = $action;
            $crate::Reducer::reduce(&$reducer, &mut $state, &action);
            assert!(
                ($check)(&$state),
                "Unexpected state after {:?}\n  state: {:?}",
                action, $state
            );
        )+
    };
}

pub use crate::assert_reduces;

/// Records every action dispatched on a store, in dispatch order.
pub struct ActionRecorder<A> {
    seen: Arc<Mutex<Vec<ActionEnvelope<A>>>>,
    notify: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl<A: Action> ActionRecorder<A> {
    /// Start recording. Only actions dispatched after this call are seen.
    pub fn attach<S>(store: &Store<S, A>) -> Self
    where
        S: Send + Sync + 'static,
    {
        let mut receiver = store.subscribe();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let notify = Arc::new(Notify::new());

        let handle = tokio::spawn({
            let seen = seen.clone();
            let notify = notify.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(envelope) => {
                            lock(&seen).push(envelope);
                            notify.notify_waiters();
                        }
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        });

        Self {
            seen,
            notify,
            handle,
        }
    }

    /// Every recorded action.
    pub fn actions(&self) -> Vec<A> {
        lock(&self.seen).iter().map(|e| e.action.clone()).collect()
    }

    /// Every recorded envelope.
    pub fn envelopes(&self) -> Vec<ActionEnvelope<A>> {
        lock(&self.seen).clone()
    }

    /// Tags of every recorded action.
    pub fn kinds(&self) -> Vec<&'static str> {
        lock(&self.seen).iter().map(|e| e.kind()).collect()
    }

    /// Number of recorded actions with `tag`.
    pub fn count(&self, tag: &str) -> usize {
        lock(&self.seen).iter().filter(|e| e.kind() == tag).count()
    }

    /// Wait until at least `n` actions were recorded.
    ///
    /// # Panics
    ///
    /// Panics after five seconds.
    pub async fn wait_for(&self, n: usize) {
        self.wait_until(|actions| actions.len() >= n).await
    }

    /// Wait until an action with `tag` was recorded.
    ///
    /// # Panics
    ///
    /// Panics after five seconds.
    pub async fn wait_for_kind(&self, tag: &str) {
        self.wait_until(|actions| actions.iter().any(|e| e.kind() == tag))
            .await
    }

    async fn wait_until(&self, done: impl Fn(&[ActionEnvelope<A>]) -> bool) {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                if done(&lock(&self.seen)) {
                    return;
                }
                notified.await;
            }
        };
        if tokio::time::timeout(Duration::from_secs(5), wait).await.is_err() {
            panic!("timed out waiting for actions, saw {:?}", self.kinds());
        }
    }
}

impl<A> Drop for ActionRecorder<A> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
