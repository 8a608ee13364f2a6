use crate::db::DbPool;
use crate::entities::ingredient;
use crate::error::{ApiError, ApiResult};
use crate::models::IngredientResponse;
use actix_web::{web, HttpResponse};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{EntityTrait, QueryFilter, QueryOrder, Select};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct IngredientQuery {
    /// Case-insensitive name prefix.
    #[schema(example = "app")]
    pub name: Option<String>,
}

/// Escapes `LIKE` wildcards so `prefix` only ever matches literally.
fn escape_like(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Narrows `query` to ingredients whose name starts with `prefix`, ignoring case.
///
/// Only ASCII letters are folded on both sides, matching SQLite's `LOWER`.
/// There a non-Latin prefix must match case exactly. On MySQL the default
/// case-insensitive `utf8mb4` collation covers the remaining letters.
pub fn name_starts_with(query: Select<ingredient::Entity>, prefix: &str) -> Select<ingredient::Entity> {
    let pattern = format!("{}%", escape_like(&prefix.to_ascii_lowercase()));
    query.filter(
        Expr::expr(Func::lower(Expr::col((
            ingredient::Entity,
            ingredient::Column::Name,
        ))))
        .like(LikeExpr::new(pattern).escape('\\')),
    )
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    params(
        ("name" = Option<String>, Query, description = "Case-insensitive name prefix")
    ),
    responses(
        (status = 200, description = "Matching ingredients", body = Vec<IngredientResponse>)
    ),
    tag = "ingredients"
)]
pub async fn list_ingredients(
    pool: web::Data<DbPool>,
    query: web::Query<IngredientQuery>,
) -> ApiResult<HttpResponse> {
    let mut select = ingredient::Entity::find();
    if let Some(prefix) = query.name.as_deref().filter(|p| !p.is_empty()) {
        select = name_starts_with(select, prefix);
    }

    let ingredients: Vec<IngredientResponse> = select
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::Id)
        .all(pool.get_ref())
        .await?
        .into_iter()
        .map(IngredientResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(ingredients))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{ingredient_id}",
    params(
        ("ingredient_id" = i64, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 200, description = "Ingredient", body = IngredientResponse),
        (status = 404, description = "Ingredient not found")
    ),
    tag = "ingredients"
)]
pub async fn get_ingredient(
    path: web::Path<i64>,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    let ingredient = ingredient::Entity::find_by_id(path.into_inner())
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::NotFound("Ingredient not found".to_string()))?;

    Ok(HttpResponse::Ok().json(IngredientResponse::from(ingredient)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards_are_escaped() {
        assert_eq!(escape_like("app"), "app");
        assert_eq!(escape_like("%apple"), "\\%apple");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }
}
