//! Pure Firebase REST client.
//!
//! A minimal client for the two Firebase services a thin app needs: password
//! authentication through the Identity Toolkit, and JSON documents in the
//! Realtime Database.
//!
//! # Example
//!
//! ```rust,ignore
//! use firebase_client::{FirebaseAuth, FirebaseDatabase};
//!
//! let auth = FirebaseAuth::new("web-api-key");
//! auth.sign_in_with_password("cook@example.com", "secret").await?;
//! let token = auth.id_token().await?;
//!
//! let db = FirebaseDatabase::new("https://my-project.firebaseio.com");
//! let recipes: Option<Vec<Recipe>> = db.get("recipes", Some(&token)).await?;
//! db.put("recipes", &recipes.unwrap_or_default(), Some(&token)).await?;
//! ```

pub mod auth;
pub mod database;
pub mod error;
pub mod types;

pub use auth::{FirebaseAuth, DEFAULT_AUTH_URL};
pub use database::FirebaseDatabase;
pub use error::{FirebaseError, Result};
pub use types::AuthSession;
