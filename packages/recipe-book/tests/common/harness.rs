//! Test harness that boots the application against mock backends.
//!
//! Each test gets a fresh store, runner and set of mocks. Mocks are shared
//! with the harness so tests can configure them and inspect their calls.

use anyhow::Result;
use recipe_book_core::kernel::test_dependencies::TestDependencies;
use recipe_book_core::{App, AppAction, AppStore, ApplicationState};
use reflux::testing::ActionRecorder;
use std::time::Duration;
use test_context::AsyncTestContext;

/// How long a settle may take before the test fails.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Test harness for effect chains.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     ctx.settle(RecipeAction::FetchRecipes).await.unwrap();
///     assert!(ctx.state().recipes.recipes.is_empty());
/// }
/// ```
pub struct TestHarness {
    /// Mocks wired into the running application.
    pub deps: TestDependencies,
    pub app: App,
    /// Every action dispatched after boot, in order.
    pub recorder: ActionRecorder<AppAction>,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
    }

    async fn teardown(self) {
        self.app.shutdown();
    }
}

impl TestHarness {
    /// Boots the application with default mocks.
    pub fn new() -> Self {
        Self::with_deps(TestDependencies::new())
    }

    /// Boots the application with the given mocks.
    pub fn with_deps(deps: TestDependencies) -> Self {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let app = App::boot(deps.clone().into_app_deps());
        let recorder = ActionRecorder::attach(&app.store);

        Self {
            deps,
            app,
            recorder,
        }
    }

    pub fn store(&self) -> &AppStore {
        &self.app.store
    }

    pub fn state(&self) -> ApplicationState {
        self.app.store.snapshot()
    }

    /// Dispatch without waiting for effects.
    pub fn dispatch(&self, action: impl Into<AppAction>) {
        self.app.store.dispatch(action.into());
    }

    /// Dispatch and wait for every effect it triggers, transitively.
    pub async fn settle(&self, action: impl Into<AppAction>) -> Result<()> {
        self.app
            .store
            .dispatch_and_settle_timeout(action.into(), SETTLE_TIMEOUT)
            .await
    }

    /// Poll until `condition` holds.
    ///
    /// # Panics
    ///
    /// Panics after five seconds.
    pub async fn wait_until(&self, condition: impl Fn() -> bool) {
        let poll = async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        };
        if tokio::time::timeout(SETTLE_TIMEOUT, poll).await.is_err() {
            panic!("timed out waiting for condition, saw {:?}", self.recorder.kinds());
        }
    }

    /// Give stray chains a moment to misbehave before asserting on absence.
    pub async fn quiesce(&self) {
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}
