// TestDependencies - mock implementations for testing
//
// Provides mock backends that can be injected into AppDeps for tests.
// Failures are raised as the same categorized errors the Firebase adapters
// produce, so effects see exactly what production would hand them.

use anyhow::Result;
use async_trait::async_trait;
use firebase_client::FirebaseError;
use reflux::Categorized;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use super::{AppDeps, BackendError, BaseAuthService, BaseNavigator, BaseRecipeStore};
use crate::domains::recipes::models::{Recipe, RecipeDocument};

fn backend_error(err: FirebaseError) -> anyhow::Error {
    Categorized::new(BackendError::from(err)).into()
}

// =============================================================================
// Mock Auth Service
// =============================================================================

/// A call made against the mock auth service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCall {
    CreateAccount { email: String },
    SignIn { email: String },
    CurrentToken,
    SignOut,
}

/// Auth service that signs in anyone.
///
/// The token of the current session is `token-<email>`.
pub struct MockAuthService {
    calls: Arc<Mutex<Vec<AuthCall>>>,
    session: Arc<Mutex<Option<String>>>,
    error_code: Arc<Mutex<Option<String>>>,
    gates: Arc<Mutex<HashMap<String, Arc<Notify>>>>,
}

impl MockAuthService {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            session: Arc::new(Mutex::new(None)),
            error_code: Arc::new(Mutex::new(None)),
            gates: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Reject account creation and sign-in with an Identity Toolkit code
    /// (e.g. `EMAIL_EXISTS`)
    pub fn fail_with_code(&self, code: &str) {
        *self.error_code.lock().unwrap() = Some(code.to_string());
    }

    /// Hold sign-in and sign-up for `email` until the returned gate is notified
    pub fn gate(&self, email: &str) -> Arc<Notify> {
        self.gates
            .lock()
            .unwrap()
            .entry(email.to_string())
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    /// Get all calls made, in order
    pub fn calls(&self) -> Vec<AuthCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Expected token for a session opened by `email`
    pub fn token_for(email: &str) -> String {
        format!("token-{}", email)
    }

    async fn open_session(&self, email: &str) -> Result<()> {
        let gate = self.gates.lock().unwrap().get(email).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let code = self.error_code.lock().unwrap().clone();
        if let Some(code) = code {
            return Err(backend_error(FirebaseError::Auth { status: 400, code }));
        }

        *self.session.lock().unwrap() = Some(email.to_string());
        Ok(())
    }
}

impl Default for MockAuthService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseAuthService for MockAuthService {
    async fn create_account(&self, email: &str, _password: &str) -> Result<()> {
        self.calls.lock().unwrap().push(AuthCall::CreateAccount {
            email: email.to_string(),
        });
        self.open_session(email).await
    }

    async fn sign_in(&self, email: &str, _password: &str) -> Result<()> {
        self.calls.lock().unwrap().push(AuthCall::SignIn {
            email: email.to_string(),
        });
        self.open_session(email).await
    }

    async fn current_token(&self) -> Result<String> {
        self.calls.lock().unwrap().push(AuthCall::CurrentToken);
        match self.session.lock().unwrap().as_deref() {
            Some(email) => Ok(Self::token_for(email)),
            None => Err(backend_error(FirebaseError::NoCurrentUser)),
        }
    }

    async fn sign_out(&self) {
        self.calls.lock().unwrap().push(AuthCall::SignOut);
        self.session.lock().unwrap().take();
    }
}

// =============================================================================
// Mock Recipe Store
// =============================================================================

/// Arguments captured from a store call
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCallArgs {
    pub recipes: Vec<Recipe>,
    pub auth_token: Option<String>,
}

pub struct MockRecipeStore {
    documents: Arc<Mutex<Vec<RecipeDocument>>>,
    fetch_calls: Arc<Mutex<Vec<Option<String>>>>,
    store_calls: Arc<Mutex<Vec<StoreCallArgs>>>,
    error_status: Arc<Mutex<Option<u16>>>,
    fetch_gate: Arc<Mutex<Option<Arc<Notify>>>>,
}

impl MockRecipeStore {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(Mutex::new(Vec::new())),
            fetch_calls: Arc::new(Mutex::new(Vec::new())),
            store_calls: Arc::new(Mutex::new(Vec::new())),
            error_status: Arc::new(Mutex::new(None)),
            fetch_gate: Arc::new(Mutex::new(None)),
        }
    }

    /// Documents returned by the next fetches
    pub fn set_documents(&self, documents: Vec<RecipeDocument>) {
        *self.documents.lock().unwrap() = documents;
    }

    /// Parse documents from raw backend JSON
    pub fn set_documents_json(&self, json: &str) {
        self.set_documents(serde_json::from_str(json).unwrap());
    }

    /// Fail every read and write with an HTTP status
    pub fn fail_with_status(&self, status: u16) {
        *self.error_status.lock().unwrap() = Some(status);
    }

    /// Let reads and writes succeed again
    pub fn clear_failure(&self) {
        *self.error_status.lock().unwrap() = None;
    }

    /// Hold every fetch until the returned gate is notified
    pub fn gate_fetches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.fetch_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Auth tokens passed to each fetch, in order
    pub fn fetch_calls(&self) -> Vec<Option<String>> {
        self.fetch_calls.lock().unwrap().clone()
    }

    /// Bodies and tokens of each store, in order
    pub fn store_calls(&self) -> Vec<StoreCallArgs> {
        self.store_calls.lock().unwrap().clone()
    }

    fn check_failure(&self) -> Result<()> {
        match *self.error_status.lock().unwrap() {
            Some(status) => Err(backend_error(FirebaseError::Api {
                status,
                message: "Permission denied".to_string(),
            })),
            None => Ok(()),
        }
    }
}

impl Default for MockRecipeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRecipeStore for MockRecipeStore {
    async fn fetch_recipes(&self, auth_token: Option<&str>) -> Result<Vec<RecipeDocument>> {
        self.fetch_calls
            .lock()
            .unwrap()
            .push(auth_token.map(str::to_string));

        let gate = self.fetch_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.check_failure()?;
        Ok(self.documents.lock().unwrap().clone())
    }

    async fn store_recipes(&self, recipes: &[Recipe], auth_token: Option<&str>) -> Result<()> {
        self.store_calls.lock().unwrap().push(StoreCallArgs {
            recipes: recipes.to_vec(),
            auth_token: auth_token.map(str::to_string),
        });
        self.check_failure()
    }
}

// =============================================================================
// Recording Navigator
// =============================================================================

pub struct RecordingNavigator {
    paths: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self {
            paths: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get all navigations, in order
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl Default for RecordingNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseNavigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub auth: Arc<MockAuthService>,
    pub recipes: Arc<MockRecipeStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub send_auth_token: bool,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            auth: Arc::new(MockAuthService::new()),
            recipes: Arc::new(MockRecipeStore::new()),
            navigator: Arc::new(RecordingNavigator::new()),
            send_auth_token: false,
        }
    }

    /// Pass the session token to recipe reads and writes
    pub fn with_send_auth_token(mut self) -> Self {
        self.send_auth_token = true;
        self
    }

    /// Build AppDeps sharing these mocks
    pub fn into_app_deps(self) -> AppDeps {
        AppDeps::new(self.auth, self.recipes, self.navigator)
            .with_send_auth_token(self.send_auth_token)
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
