// Recipe book client
//
// Auth and recipe features on top of the reflux store, backed by Firebase.

pub mod app;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod state;

pub use app::{app_effects, App, AppStore};
pub use config::Config;
pub use state::{app_reducer, AppAction, ApplicationState};
