use serde::{Deserialize, Serialize};

/// A line in a recipe's shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: u32,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, amount: u32) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// A recipe as held in the store. `ingredients` is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "imagePath", default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    pub ingredients: Vec<Ingredient>,
}

impl Recipe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            image_path: None,
            ingredients: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image_path(mut self, image_path: impl Into<String>) -> Self {
        self.image_path = Some(image_path.into());
        self
    }

    pub fn with_ingredient(mut self, ingredient: Ingredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }
}

/// A recipe as the backend returns it. Documents saved without ingredients
/// come back without the field at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "imagePath", default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<Ingredient>>,
}

impl From<RecipeDocument> for Recipe {
    fn from(doc: RecipeDocument) -> Self {
        Self {
            name: doc.name,
            description: doc.description,
            image_path: doc.image_path,
            ingredients: doc.ingredients.unwrap_or_default(),
        }
    }
}

impl From<Recipe> for RecipeDocument {
    fn from(recipe: Recipe) -> Self {
        Self {
            name: recipe.name,
            description: recipe.description,
            image_path: recipe.image_path,
            ingredients: Some(recipe.ingredients),
        }
    }
}

/// Give every document an ingredient list, keeping order and length.
pub fn normalize_recipes(documents: Vec<RecipeDocument>) -> Vec<Recipe> {
    documents.into_iter().map(Recipe::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_ingredients_become_empty() {
        let docs: Vec<RecipeDocument> = serde_json::from_str(r#"[{"name":"Tacos"}]"#).unwrap();
        let recipes = normalize_recipes(docs);
        assert_eq!(recipes, vec![Recipe::new("Tacos")]);
    }

    #[test]
    fn test_nameless_document_does_not_drop_the_rest() {
        let docs: Vec<RecipeDocument> =
            serde_json::from_str(r#"[{"description":"Untitled draft"},{"name":"Tacos"}]"#).unwrap();
        let recipes = normalize_recipes(docs);

        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].name, "");
        assert_eq!(recipes[0].description.as_deref(), Some("Untitled draft"));
        assert_eq!(recipes[1], Recipe::new("Tacos"));
    }

    #[test]
    fn test_present_ingredients_pass_through() {
        let docs: Vec<RecipeDocument> = serde_json::from_str(
            r#"[
                {"name":"Schnitzel","description":"Crispy","imagePath":"/s.jpg",
                 "ingredients":[{"name":"Meat","amount":1},{"name":"French Fries","amount":20}]},
                {"name":"Burger"}
            ]"#,
        )
        .unwrap();

        let recipes = normalize_recipes(docs);

        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].image_path.as_deref(), Some("/s.jpg"));
        assert_eq!(
            recipes[0].ingredients,
            vec![Ingredient::new("Meat", 1), Ingredient::new("French Fries", 20)]
        );
        assert!(recipes[1].ingredients.is_empty());
    }

    #[test]
    fn test_serialized_recipe_uses_backend_field_names() {
        let recipe = Recipe::new("Soup")
            .with_image_path("/soup.png")
            .with_ingredient(Ingredient::new("Water", 2));
        let json = serde_json::to_value(&recipe).unwrap();

        assert_eq!(json["imagePath"], "/soup.png");
        assert_eq!(json["ingredients"][0]["amount"], 2);
        assert!(json.get("description").is_none());
    }
}
