use crate::entities::{ingredient, recipe, recipe_ingredient, recipe_tag, tag};
use crate::error::{ApiError, FieldErrors};
use crate::models::RecipeWriteRequest;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, Set, TransactionTrait,
};
use std::collections::{BTreeMap, BTreeSet};

pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 240;
pub const MIN_AMOUNT: i32 = 1;
pub const MAX_AMOUNT: i32 = 2000;
pub const MAX_NAME_LENGTH: usize = 200;

/// Field-level checks that need no database access.
pub fn validate_fields(draft: &RecipeWriteRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let name_length = draft.name.trim().chars().count();
    if name_length == 0 {
        errors.add("name", "Name must not be empty");
    } else if name_length > MAX_NAME_LENGTH {
        errors.add(
            "name",
            format!("Name must be at most {} characters", MAX_NAME_LENGTH),
        );
    }

    if draft.text.trim().is_empty() {
        errors.add("text", "Text must not be empty");
    }

    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&draft.cooking_time) {
        errors.add(
            "cooking_time",
            format!(
                "Cooking time must be between {} and {} minutes, got {}",
                MIN_COOKING_TIME, MAX_COOKING_TIME, draft.cooking_time
            ),
        );
    }

    if draft.ingredients.is_empty() {
        errors.add("ingredients", "At least one ingredient is required");
    }

    let mut amounts_by_id: BTreeMap<i64, Vec<i32>> = BTreeMap::new();
    for item in &draft.ingredients {
        if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&item.amount) {
            errors.add(
                "ingredients",
                format!(
                    "Amount for ingredient {} must be between {} and {}, got {}",
                    item.id, MIN_AMOUNT, MAX_AMOUNT, item.amount
                ),
            );
        }
        amounts_by_id.entry(item.id).or_default().push(item.amount);
    }
    for (id, amounts) in amounts_by_id.iter().filter(|(_, a)| a.len() > 1) {
        let listed: Vec<String> = amounts.iter().map(ToString::to_string).collect();
        errors.add(
            "ingredients",
            format!(
                "Ingredient {} is listed more than once (amounts {})",
                id,
                listed.join(", ")
            ),
        );
    }

    let mut seen_tags = BTreeSet::new();
    let duplicate_tags: BTreeSet<i64> = draft
        .tags
        .iter()
        .filter(|id| !seen_tags.insert(**id))
        .copied()
        .collect();
    for id in duplicate_tags {
        errors.add("tags", format!("Tag {} is listed more than once", id));
    }

    errors
}

/// Rejects ingredient and tag ids that do not exist.
async fn check_references<C>(
    db: &C,
    draft: &RecipeWriteRequest,
    errors: &mut FieldErrors,
) -> Result<(), ApiError>
where
    C: ConnectionTrait,
{
    let ingredient_ids: BTreeSet<i64> = draft.ingredients.iter().map(|item| item.id).collect();
    if !ingredient_ids.is_empty() {
        let found: BTreeSet<i64> = ingredient::Entity::find()
            .filter(ingredient::Column::Id.is_in(ingredient_ids.iter().copied()))
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.id)
            .collect();
        for id in ingredient_ids.difference(&found) {
            errors.add("ingredients", format!("Ingredient {} does not exist", id));
        }
    }

    let tag_ids: BTreeSet<i64> = draft.tags.iter().copied().collect();
    if !tag_ids.is_empty() {
        let found: BTreeSet<i64> = tag::Entity::find()
            .filter(tag::Column::Id.is_in(tag_ids.iter().copied()))
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.id)
            .collect();
        for id in tag_ids.difference(&found) {
            errors.add("tags", format!("Tag {} does not exist", id));
        }
    }

    Ok(())
}

async fn validate<C>(db: &C, draft: &RecipeWriteRequest) -> Result<(), ApiError>
where
    C: ConnectionTrait,
{
    let mut errors = validate_fields(draft);
    check_references(db, draft, &mut errors).await?;
    errors.into_result()
}

/// Inserts the ingredient-amount and tag rows of `recipe_id`.
async fn attach_composition<C>(
    db: &C,
    recipe_id: i64,
    draft: &RecipeWriteRequest,
) -> Result<(), ApiError>
where
    C: ConnectionTrait,
{
    let ingredient_rows = draft
        .ingredients
        .iter()
        .map(|item| recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(item.id),
            amount: Set(item.amount),
            ..Default::default()
        })
        .collect::<Vec<_>>();
    if !ingredient_rows.is_empty() {
        recipe_ingredient::Entity::insert_many(ingredient_rows)
            .exec(db)
            .await?;
    }

    let tag_rows = draft
        .tags
        .iter()
        .map(|tag_id| recipe_tag::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(*tag_id),
            ..Default::default()
        })
        .collect::<Vec<_>>();
    if !tag_rows.is_empty() {
        recipe_tag::Entity::insert_many(tag_rows).exec(db).await?;
    }

    Ok(())
}

/// Loads a recipe and checks that `caller_id` may change it.
async fn find_owned<C>(db: &C, recipe_id: i64, caller_id: i64) -> Result<recipe::Model, ApiError>
where
    C: ConnectionTrait,
{
    let recipe = recipe::Entity::find_by_id(recipe_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))?;

    if recipe.author_id != caller_id {
        return Err(ApiError::Forbidden(
            "Only the author can modify this recipe".to_string(),
        ));
    }
    Ok(recipe)
}

/// Creates a recipe with its full composition in a single transaction.
pub async fn create(
    db: &DatabaseConnection,
    author_id: i64,
    draft: &RecipeWriteRequest,
) -> Result<recipe::Model, ApiError> {
    validate(db, draft).await?;

    let txn = db.begin().await?;

    let recipe = recipe::ActiveModel {
        author_id: Set(author_id),
        name: Set(draft.name.trim().to_string()),
        text: Set(draft.text.clone()),
        image: Set(draft.image.clone()),
        cooking_time: Set(draft.cooking_time),
        pub_date: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    attach_composition(&txn, recipe.id, draft).await?;
    txn.commit().await?;

    log::info!("Recipe {} created by user {}", recipe.id, author_id);
    Ok(recipe)
}

/// Rewrites a recipe's fields and replaces its ingredient and tag sets.
///
/// Id, author and publish date are preserved.
pub async fn update(
    db: &DatabaseConnection,
    recipe_id: i64,
    caller_id: i64,
    draft: &RecipeWriteRequest,
) -> Result<recipe::Model, ApiError> {
    let existing = find_owned(db, recipe_id, caller_id).await?;
    validate(db, draft).await?;

    let txn = db.begin().await?;

    let mut active: recipe::ActiveModel = existing.into();
    active.name = Set(draft.name.trim().to_string());
    active.text = Set(draft.text.clone());
    active.image = Set(draft.image.clone());
    active.cooking_time = Set(draft.cooking_time);
    let recipe = active.update(&txn).await?;

    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    attach_composition(&txn, recipe_id, draft).await?;

    txn.commit().await?;

    log::info!("Recipe {} updated by user {}", recipe_id, caller_id);
    Ok(recipe)
}

pub async fn delete(
    db: &DatabaseConnection,
    recipe_id: i64,
    caller_id: i64,
) -> Result<(), ApiError> {
    let recipe = find_owned(db, recipe_id, caller_id).await?;
    recipe.delete(db).await?;

    log::info!("Recipe {} deleted by user {}", recipe_id, caller_id);
    Ok(())
}
