//! Test fixtures for credentials and recipe documents.

use recipe_book_core::domains::auth::AuthCredentials;
use recipe_book_core::domains::recipes::{Ingredient, Recipe, RecipeDocument};

pub const PASSWORD: &str = "correct-horse-battery";

/// Credentials with a valid password for `email`
pub fn credentials(email: &str) -> AuthCredentials {
    AuthCredentials::new(email, PASSWORD)
}

/// A document as saved without ingredients
pub fn bare_document(name: &str) -> RecipeDocument {
    RecipeDocument {
        name: name.to_string(),
        description: None,
        image_path: None,
        ingredients: None,
    }
}

/// A fully populated recipe
pub fn schnitzel() -> Recipe {
    Recipe::new("Schnitzel")
        .with_description("A super-tasty Schnitzel - just awesome!")
        .with_image_path("https://example.org/schnitzel.jpg")
        .with_ingredient(Ingredient::new("Meat", 1))
        .with_ingredient(Ingredient::new("French Fries", 20))
}
