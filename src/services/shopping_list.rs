use crate::entities::{ingredient, recipe_ingredient, shopping_cart};
use crate::error::ApiError;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use std::collections::HashMap;
use std::fmt;

/// One aggregated line of the downloadable shopping list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingLine {
    pub ingredient_id: i64,
    pub name: String,
    pub amount: i64,
    pub measurement_unit: String,
}

impl fmt::Display for ShoppingLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} {}", self.name, self.amount, self.measurement_unit)
    }
}

/// Sums amounts per ingredient id, keeping the order in which each
/// ingredient was first seen.
pub fn aggregate<I>(items: I) -> Vec<ShoppingLine>
where
    I: IntoIterator<Item = (ingredient::Model, i32)>,
{
    let mut lines: Vec<ShoppingLine> = Vec::new();
    let mut positions: HashMap<i64, usize> = HashMap::new();

    for (ingredient, amount) in items {
        match positions.get(&ingredient.id) {
            Some(&index) => lines[index].amount += i64::from(amount),
            None => {
                positions.insert(ingredient.id, lines.len());
                lines.push(ShoppingLine {
                    ingredient_id: ingredient.id,
                    name: ingredient.name,
                    amount: i64::from(amount),
                    measurement_unit: ingredient.measurement_unit,
                });
            }
        }
    }

    lines
}

/// Aggregated ingredients of every recipe in `user_id`'s cart.
///
/// Walks cart entries in insertion order and each recipe's ingredient rows in
/// insertion order, so the output is stable for a given cart.
pub async fn build_shopping_list<C>(db: &C, user_id: i64) -> Result<Vec<ShoppingLine>, ApiError>
where
    C: ConnectionTrait,
{
    let recipe_ids: Vec<i64> = shopping_cart::Entity::find()
        .filter(shopping_cart::Column::UserId.eq(user_id))
        .order_by_asc(shopping_cart::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|entry| entry.recipe_id)
        .collect();

    if recipe_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut rows = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.clone()))
        .order_by_asc(recipe_ingredient::Column::Id)
        .find_also_related(ingredient::Entity)
        .all(db)
        .await?;

    let cart_position: HashMap<i64, usize> = recipe_ids
        .iter()
        .enumerate()
        .map(|(position, id)| (*id, position))
        .collect();
    // Stable sort keeps row-id order inside each recipe.
    rows.sort_by_key(|(row, _)| cart_position.get(&row.recipe_id).copied());

    let items = rows.into_iter().filter_map(|(row, ingredient)| match ingredient {
        Some(ingredient) => Some((ingredient, row.amount)),
        None => {
            log::warn!(
                "Recipe {} references missing ingredient {}",
                row.recipe_id,
                row.ingredient_id
            );
            None
        }
    });

    Ok(aggregate(items))
}

/// Plain-text body of the shopping list download.
pub fn render(lines: &[ShoppingLine]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
