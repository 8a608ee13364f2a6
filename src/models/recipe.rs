use crate::entities::{ingredient, recipe, tag};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::UserResponse;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<tag::Model> for TagResponse {
    fn from(tag: tag::Model) -> Self {
        TagResponse {
            id: tag.id,
            name: tag.name,
            color: tag.color,
            slug: tag.slug,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

impl From<ingredient::Model> for IngredientResponse {
    fn from(ingredient: ingredient::Model) -> Self {
        IngredientResponse {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
        }
    }
}

/// An ingredient line of a recipe, resolved against the ingredient table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecipeIngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct IngredientAmount {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = 100)]
    pub amount: i32,
}

/// Body of `POST /recipes` and `PUT|PATCH /recipes/{id}`.
///
/// Updates carry the full composition: the ingredient and tag sets replace
/// the stored ones entirely.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecipeWriteRequest {
    pub name: String,
    pub text: String,
    #[serde(default)]
    pub image: Option<String>,
    #[schema(example = 30)]
    pub cooking_time: i32,
    pub ingredients: Vec<IngredientAmount>,
    #[serde(default)]
    pub tags: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: chrono::DateTime<chrono::Utc>,
}

/// Compact recipe card used by favorites, the cart and subscriptions.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecipeShortResponse {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

impl From<recipe::Model> for RecipeShortResponse {
    fn from(recipe: recipe::Model) -> Self {
        RecipeShortResponse {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}
