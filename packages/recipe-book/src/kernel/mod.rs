// Kernel - infrastructure shared by every domain
//
// Traits for the backend collaborators, their Firebase adapters, and the
// dependency container handed to effects.

pub mod deps;
pub mod error;
pub mod test_dependencies;
pub mod traits;

pub use deps::{AppDeps, FirebaseAuthAdapter, FirebaseRecipeStore, LoggingNavigator};
pub use error::BackendError;
pub use traits::*;
