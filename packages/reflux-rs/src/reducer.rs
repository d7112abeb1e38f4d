//! Reducers and slice composition.
//!
//! Reducers are pure state transitions: they receive the current state and an
//! action and produce the next state in place. No IO, no clock, no randomness.
//!
//! # Key Properties
//!
//! - **Synchronous**: reducers run inside `Store::dispatch`, before effects
//! - **Slice-scoped**: [`Slice`] restricts a reducer to one partition of state,
//!   so a feature reducer cannot touch another feature's slice
//! - **Panic-isolated**: [`CombinedReducer`] catches a panicking slice reducer
//!   so the remaining slices still see the action

use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::error;

/// A pure state transition.
///
/// Implemented for any `Fn(&mut S, &A)`, so small reducers can be closures.
///
/// # Example
///
/// ```ignore
/// struct CounterReducer;
///
/// impl Reducer<CounterState, CounterAction> for CounterReducer {
///     fn reduce(&self, state: &mut CounterState, action: &CounterAction) {
///         match action {
///             CounterAction::Increment => state.count += 1,
///             CounterAction::Reset => state.count = 0,
///         }
///     }
/// }
/// ```
pub trait Reducer<S, A>: Send + Sync + 'static {
    /// Apply `action` to `state`.
    ///
    /// Mutations are applied in place and are not rolled back: if a reducer
    /// panics partway through, whatever it already wrote stays in the state
    /// and is published. Reducers that cannot fail halfway should validate
    /// before writing.
    fn reduce(&self, state: &mut S, action: &A);
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(&mut S, &A) + Send + Sync + 'static,
{
    fn reduce(&self, state: &mut S, action: &A) {
        self(state, action)
    }
}

/// A reducer lifted from a slice `T` of the application state `S`.
pub struct Slice<S, T, R> {
    lens: fn(&mut S) -> &mut T,
    reducer: R,
    _state: PhantomData<fn(&mut S) -> &mut T>,
}

impl<S, T, R> Slice<S, T, R> {
    /// Scope `reducer` to the slice selected by `lens`.
    pub fn new(lens: fn(&mut S) -> &mut T, reducer: R) -> Self {
        Self {
            lens,
            reducer,
            _state: PhantomData,
        }
    }
}

impl<S, T, A, R> Reducer<S, A> for Slice<S, T, R>
where
    S: 'static,
    T: 'static,
    A: 'static,
    R: Reducer<T, A>,
{
    fn reduce(&self, state: &mut S, action: &A) {
        self.reducer.reduce((self.lens)(state), action)
    }
}

struct NamedReducer<S, A> {
    name: &'static str,
    inner: Box<dyn Reducer<S, A>>,
}

/// Runs several reducers in registration order for every action.
///
/// # Example
///
/// ```ignore
/// let reducer = CombinedReducer::new()
///     .slice("auth", |s: &mut AppState| &mut s.auth, AuthReducer)
///     .slice("recipes", |s: &mut AppState| &mut s.recipes, RecipesReducer);
///
/// let store = Store::new(AppState::default(), reducer);
/// ```
pub struct CombinedReducer<S, A> {
    parts: Vec<NamedReducer<S, A>>,
}

impl<S: 'static, A: 'static> CombinedReducer<S, A> {
    /// Create an empty combined reducer.
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Add a reducer that sees the whole state.
    pub fn with<R: Reducer<S, A>>(mut self, name: &'static str, reducer: R) -> Self {
        self.parts.push(NamedReducer {
            name,
            inner: Box::new(reducer),
        });
        self
    }

    /// Add a reducer scoped to one slice of the state.
    pub fn slice<T: 'static, R: Reducer<T, A>>(
        self,
        name: &'static str,
        lens: fn(&mut S) -> &mut T,
        reducer: R,
    ) -> Self {
        self.with(name, Slice::new(lens, reducer))
    }

    /// Number of registered reducers.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns true if no reducer is registered.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Names of the registered reducers, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.parts.iter().map(|p| p.name).collect()
    }
}

impl<S: 'static, A: 'static> Default for CombinedReducer<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> Reducer<S, A> for CombinedReducer<S, A>
where
    S: Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    fn reduce(&self, state: &mut S, action: &A) {
        for part in &self.parts {
            // The slice may be left half-updated after a panic; the other
            // slices still observe the action.
            let result = catch_unwind(AssertUnwindSafe(|| part.inner.reduce(state, action)));
            if let Err(panic_info) = result {
                error!(
                    reducer = part.name,
                    panic = %panic_message(panic_info.as_ref()),
                    "reducer panicked"
                );
            }
        }
    }
}

impl<S, A> std::fmt::Debug for CombinedReducer<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedReducer")
            .field("parts", &self.parts.iter().map(|p| p.name).collect::<Vec<_>>())
            .finish()
    }
}

/// Extract a human-readable message from a panic payload.
pub(crate) fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Counters {
        left: i64,
        right: i64,
    }

    #[derive(Debug, Clone)]
    enum CounterAction {
        Bump,
        BumpLeft,
        Explode,
    }

    fn left_reducer(count: &mut i64, action: &CounterAction) {
        match action {
            CounterAction::Bump | CounterAction::BumpLeft => *count += 1,
            CounterAction::Explode => panic!("left exploded"),
        }
    }

    fn right_reducer(count: &mut i64, action: &CounterAction) {
        if let CounterAction::Bump | CounterAction::Explode = action {
            *count += 10;
        }
    }

    fn combined() -> CombinedReducer<Counters, CounterAction> {
        CombinedReducer::new()
            .slice("left", |s: &mut Counters| &mut s.left, left_reducer)
            .slice("right", |s: &mut Counters| &mut s.right, right_reducer)
    }

    #[test]
    fn test_closure_is_a_reducer() {
        let reducer = |state: &mut i64, _: &CounterAction| *state += 2;
        let mut state = 0;
        reducer.reduce(&mut state, &CounterAction::Bump);
        assert_eq!(state, 2);
    }

    #[test]
    fn test_slices_only_touch_their_partition() {
        let reducer = combined();
        let mut state = Counters::default();

        reducer.reduce(&mut state, &CounterAction::BumpLeft);
        assert_eq!(state, Counters { left: 1, right: 0 });

        reducer.reduce(&mut state, &CounterAction::Bump);
        assert_eq!(state, Counters { left: 2, right: 10 });
    }

    #[test]
    fn test_panicking_slice_does_not_stop_others() {
        let reducer = combined();
        let mut state = Counters::default();

        reducer.reduce(&mut state, &CounterAction::Explode);

        assert_eq!(state.left, 0);
        assert_eq!(state.right, 10);
    }

    #[test]
    fn test_names_keep_registration_order() {
        let reducer = combined();
        assert_eq!(reducer.names(), vec!["left", "right"]);
        assert_eq!(reducer.len(), 2);
        assert!(!reducer.is_empty());
        assert!(format!("{:?}", reducer).contains("left"));
    }

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("static message");
        assert_eq!(panic_message(boxed.as_ref()), "static message");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
