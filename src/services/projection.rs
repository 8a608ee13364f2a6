//! Read-side views of recipes and users, computed per request for a viewer.
//!
//! Every viewer-dependent flag is `false` for anonymous viewers.

use crate::entities::{ingredient, recipe, recipe_ingredient, recipe_tag, tag, user};
use crate::error::ApiError;
use crate::models::{
    RecipeIngredientResponse, RecipeResponse, RecipeShortResponse, SubscriptionResponse,
    TagResponse, UserResponse,
};
use crate::services::relations::{self, Favorites, ShoppingCart, Subscriptions};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

pub async fn user_view<C>(
    db: &C,
    user: user::Model,
    viewer: Option<i64>,
) -> Result<UserResponse, ApiError>
where
    C: ConnectionTrait,
{
    let is_subscribed = match viewer {
        Some(viewer_id) => relations::exists::<Subscriptions, C>(db, viewer_id, user.id).await?,
        None => false,
    };

    Ok(UserResponse {
        email: user.email,
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        is_subscribed,
    })
}

async fn recipe_tags<C>(db: &C, recipe_id: i64) -> Result<Vec<TagResponse>, ApiError>
where
    C: ConnectionTrait,
{
    let rows = recipe_tag::Entity::find()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .order_by_asc(recipe_tag::Column::Id)
        .find_also_related(tag::Entity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(_, tag)| tag.map(TagResponse::from))
        .collect())
}

async fn recipe_ingredients<C>(
    db: &C,
    recipe_id: i64,
) -> Result<Vec<RecipeIngredientResponse>, ApiError>
where
    C: ConnectionTrait,
{
    let rows = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .order_by_asc(recipe_ingredient::Column::Id)
        .find_also_related(ingredient::Entity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(row, ingredient)| {
            ingredient.map(|ingredient| RecipeIngredientResponse {
                id: ingredient.id,
                name: ingredient.name,
                measurement_unit: ingredient.measurement_unit,
                amount: row.amount,
            })
        })
        .collect())
}

pub async fn recipe_view<C>(
    db: &C,
    recipe: recipe::Model,
    viewer: Option<i64>,
) -> Result<RecipeResponse, ApiError>
where
    C: ConnectionTrait,
{
    let author = user::Entity::find_by_id(recipe.author_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe author not found".to_string()))?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer_id) => (
            relations::exists::<Favorites, C>(db, viewer_id, recipe.id).await?,
            relations::exists::<ShoppingCart, C>(db, viewer_id, recipe.id).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeResponse {
        id: recipe.id,
        tags: recipe_tags(db, recipe.id).await?,
        author: user_view(db, author, viewer).await?,
        ingredients: recipe_ingredients(db, recipe.id).await?,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        pub_date: recipe.pub_date,
    })
}

pub async fn recipe_views<C>(
    db: &C,
    recipes: Vec<recipe::Model>,
    viewer: Option<i64>,
) -> Result<Vec<RecipeResponse>, ApiError>
where
    C: ConnectionTrait,
{
    let mut views = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        views.push(recipe_view(db, recipe, viewer).await?);
    }
    Ok(views)
}

/// An author card with their newest-first recipes, cut to `recipes_limit` when given.
pub async fn subscription_view<C>(
    db: &C,
    author: user::Model,
    viewer: Option<i64>,
    recipes_limit: Option<u64>,
) -> Result<SubscriptionResponse, ApiError>
where
    C: ConnectionTrait,
{
    let author_id = author.id;
    let recipes_count = recipe::Entity::find()
        .filter(recipe::Column::AuthorId.eq(author_id))
        .count(db)
        .await?;

    let mut query = recipe::Entity::find()
        .filter(recipe::Column::AuthorId.eq(author_id))
        .order_by_desc(recipe::Column::PubDate)
        .order_by_desc(recipe::Column::Id);
    if let Some(limit) = recipes_limit {
        query = query.limit(limit);
    }
    let recipes = query
        .all(db)
        .await?
        .into_iter()
        .map(RecipeShortResponse::from)
        .collect();

    let user = user_view(db, author, viewer).await?;
    Ok(SubscriptionResponse::new(user, recipes, recipes_count))
}
