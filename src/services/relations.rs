//! Favorites, cart entries and subscriptions share one shape: a unique
//! `(owner, target)` row that the owner adds and removes explicitly.
//!
//! Adding an existing pair and removing a missing one are both reported to
//! the caller instead of being treated as no-ops.

use crate::entities::{favorite_recipe, shopping_cart, subscribe};
use crate::error::{ApiError, FieldErrors};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};

pub trait UserRelation {
    type Entity: EntityTrait;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity> + Send + 'static;

    const DUPLICATE: &'static str;
    const MISSING: &'static str;

    fn owner_column() -> <Self::Entity as EntityTrait>::Column;
    fn target_column() -> <Self::Entity as EntityTrait>::Column;
    fn new_row(owner_id: i64, target_id: i64) -> Self::ActiveModel;

    /// Runs before the uniqueness check.
    fn check(_owner_id: i64, _target_id: i64) -> Result<(), ApiError> {
        Ok(())
    }
}

pub struct Favorites;

impl UserRelation for Favorites {
    type Entity = favorite_recipe::Entity;
    type ActiveModel = favorite_recipe::ActiveModel;

    const DUPLICATE: &'static str = "Recipe is already in favorites";
    const MISSING: &'static str = "Recipe is not in favorites";

    fn owner_column() -> favorite_recipe::Column {
        favorite_recipe::Column::UserId
    }

    fn target_column() -> favorite_recipe::Column {
        favorite_recipe::Column::RecipeId
    }

    fn new_row(owner_id: i64, target_id: i64) -> favorite_recipe::ActiveModel {
        favorite_recipe::ActiveModel {
            user_id: Set(owner_id),
            recipe_id: Set(target_id),
            ..Default::default()
        }
    }
}

pub struct ShoppingCart;

impl UserRelation for ShoppingCart {
    type Entity = shopping_cart::Entity;
    type ActiveModel = shopping_cart::ActiveModel;

    const DUPLICATE: &'static str = "Recipe is already in the shopping cart";
    const MISSING: &'static str = "Recipe is not in the shopping cart";

    fn owner_column() -> shopping_cart::Column {
        shopping_cart::Column::UserId
    }

    fn target_column() -> shopping_cart::Column {
        shopping_cart::Column::RecipeId
    }

    fn new_row(owner_id: i64, target_id: i64) -> shopping_cart::ActiveModel {
        shopping_cart::ActiveModel {
            user_id: Set(owner_id),
            recipe_id: Set(target_id),
            ..Default::default()
        }
    }
}

pub struct Subscriptions;

impl UserRelation for Subscriptions {
    type Entity = subscribe::Entity;
    type ActiveModel = subscribe::ActiveModel;

    const DUPLICATE: &'static str = "Already subscribed to this author";
    const MISSING: &'static str = "Not subscribed to this author";

    fn owner_column() -> subscribe::Column {
        subscribe::Column::UserId
    }

    fn target_column() -> subscribe::Column {
        subscribe::Column::AuthorId
    }

    fn new_row(owner_id: i64, target_id: i64) -> subscribe::ActiveModel {
        subscribe::ActiveModel {
            user_id: Set(owner_id),
            author_id: Set(target_id),
            ..Default::default()
        }
    }

    fn check(owner_id: i64, target_id: i64) -> Result<(), ApiError> {
        if owner_id == target_id {
            return Err(ApiError::Validation(FieldErrors::single(
                "author",
                "You cannot subscribe to yourself",
            )));
        }
        Ok(())
    }
}

pub async fn exists<R, C>(db: &C, owner_id: i64, target_id: i64) -> Result<bool, ApiError>
where
    R: UserRelation,
    C: ConnectionTrait,
{
    let row = R::Entity::find()
        .filter(R::owner_column().eq(owner_id))
        .filter(R::target_column().eq(target_id))
        .one(db)
        .await?;
    Ok(row.is_some())
}

pub async fn add<R, C>(db: &C, owner_id: i64, target_id: i64) -> Result<(), ApiError>
where
    R: UserRelation,
    C: ConnectionTrait,
{
    R::check(owner_id, target_id)?;

    if exists::<R, C>(db, owner_id, target_id).await? {
        return Err(ApiError::Conflict(R::DUPLICATE.to_string()));
    }

    // The unique constraint still guards against a concurrent insert slipping
    // in between the check and this statement.
    R::Entity::insert(R::new_row(owner_id, target_id))
        .exec(db)
        .await
        .map_err(|e| ApiError::from_insert(e, R::DUPLICATE))?;

    log::debug!(
        "Relation {} -> {} added ({})",
        owner_id,
        target_id,
        std::any::type_name::<R>()
    );
    Ok(())
}

pub async fn remove<R, C>(db: &C, owner_id: i64, target_id: i64) -> Result<(), ApiError>
where
    R: UserRelation,
    C: ConnectionTrait,
{
    let result = R::Entity::delete_many()
        .filter(R::owner_column().eq(owner_id))
        .filter(R::target_column().eq(target_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(ApiError::RelationMissing(R::MISSING.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_subscription_is_a_validation_error() {
        let err = Subscriptions::check(7, 7).unwrap_err();
        match err {
            ApiError::Validation(fields) => assert!(fields.get("author").is_some()),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(Subscriptions::check(7, 8).is_ok());
        assert!(Favorites::check(7, 7).is_ok());
    }
}
