use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::entities::{favorite_recipe, recipe, recipe_tag, shopping_cart, tag};
use crate::error::{ApiError, ApiResult};
use crate::models::{Page, PageRequest, RecipeShortResponse, RecipeWriteRequest};
use crate::services::relations::{self, Favorites, ShoppingCart, UserRelation};
use crate::services::{projection, recipe_writer, shopping_list};
use actix_web::{http::header, web, HttpResponse};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select};

/// Filters accepted by `GET /recipes`.
///
/// `is_favorited` and `is_in_shopping_cart` only narrow the result for an
/// authenticated caller and only when true; otherwise they are ignored.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tags: Vec<String>,
    pub author: Option<i64>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

fn parse_flag(key: &str, value: &str) -> ApiResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ApiError::BadRequest(format!(
            "Invalid boolean for {}: {}",
            key, value
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> ApiResult<T> {
    value
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid number for {}: {}", key, value)))
}

impl RecipeFilter {
    /// Builds the filter from raw query pairs; `tags` may repeat.
    pub fn from_pairs(pairs: &[(String, String)]) -> ApiResult<Self> {
        let mut filter = RecipeFilter::default();
        for (key, value) in pairs {
            match key.as_str() {
                "tags" => filter.tags.push(value.clone()),
                "author" => filter.author = Some(parse_number(key, value)?),
                "is_favorited" => filter.is_favorited = parse_flag(key, value)?,
                "is_in_shopping_cart" => filter.is_in_shopping_cart = parse_flag(key, value)?,
                "page" => filter.page = Some(parse_number(key, value)?),
                "limit" => filter.limit = Some(parse_number(key, value)?),
                _ => {}
            }
        }
        Ok(filter)
    }

    pub fn apply(&self, mut query: Select<recipe::Entity>, viewer: Option<i64>) -> Select<recipe::Entity> {
        if !self.tags.is_empty() {
            query = query.filter(
                recipe::Column::Id.in_subquery(
                    Query::select()
                        .column((recipe_tag::Entity, recipe_tag::Column::RecipeId))
                        .from(recipe_tag::Entity)
                        .inner_join(
                            tag::Entity,
                            Expr::col((tag::Entity, tag::Column::Id))
                                .equals((recipe_tag::Entity, recipe_tag::Column::TagId)),
                        )
                        .and_where(tag::Column::Slug.is_in(self.tags.clone()))
                        .to_owned(),
                ),
            );
        }

        if let Some(author_id) = self.author {
            query = query.filter(recipe::Column::AuthorId.eq(author_id));
        }

        if let Some(viewer_id) = viewer {
            if self.is_favorited {
                query = query.filter(recipe::Column::Id.in_subquery(
                    Query::select()
                        .column(favorite_recipe::Column::RecipeId)
                        .from(favorite_recipe::Entity)
                        .and_where(favorite_recipe::Column::UserId.eq(viewer_id))
                        .to_owned(),
                ));
            }
            if self.is_in_shopping_cart {
                query = query.filter(recipe::Column::Id.in_subquery(
                    Query::select()
                        .column(shopping_cart::Column::RecipeId)
                        .from(shopping_cart::Entity)
                        .and_where(shopping_cart::Column::UserId.eq(viewer_id))
                        .to_owned(),
                ));
            }
        }

        query
    }
}

async fn find_recipe(pool: &DbPool, recipe_id: i64) -> ApiResult<recipe::Model> {
    recipe::Entity::find_by_id(recipe_id)
        .one(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
        ("tags" = Option<Vec<String>>, Query, description = "Tag slugs, repeatable; any match"),
        ("author" = Option<i64>, Query, description = "Author ID"),
        ("is_favorited" = Option<bool>, Query, description = "Only the caller's favorites"),
        ("is_in_shopping_cart" = Option<bool>, Query, description = "Only recipes in the caller's cart")
    ),
    responses(
        (status = 200, description = "Paginated recipes", body = Vec<RecipeResponse>),
        (status = 400, description = "Malformed filter")
    ),
    tag = "recipes"
)]
pub async fn list_recipes(
    viewer: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<Vec<(String, String)>>,
) -> ApiResult<HttpResponse> {
    let viewer = viewer.map(|u| u.user_id);
    let filter = RecipeFilter::from_pairs(&query)?;
    let request = PageRequest::resolve(filter.page, filter.limit, &config.pagination);

    let paginator = filter
        .apply(recipe::Entity::find(), viewer)
        .order_by_asc(recipe::Column::PubDate)
        .order_by_asc(recipe::Column::Id)
        .paginate(pool.get_ref(), request.limit);
    let count = paginator.num_items().await?;
    let recipes = paginator.fetch_page(request.index()).await?;

    let results = projection::recipe_views(pool.get_ref(), recipes, viewer).await?;
    Ok(HttpResponse::Ok().json(Page::new(results, count, request)))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{recipe_id}",
    params(
        ("recipe_id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe", body = RecipeResponse),
        (status = 404, description = "Recipe not found")
    ),
    tag = "recipes"
)]
pub async fn get_recipe(
    path: web::Path<i64>,
    viewer: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    let recipe = find_recipe(pool.get_ref(), path.into_inner()).await?;
    let view = projection::recipe_view(pool.get_ref(), recipe, viewer.map(|u| u.user_id)).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    request_body = RecipeWriteRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn create_recipe(
    req: web::Json<RecipeWriteRequest>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    let recipe = recipe_writer::create(pool.get_ref(), user.user_id, &req).await?;
    let view = projection::recipe_view(pool.get_ref(), recipe, Some(user.user_id)).await?;
    Ok(HttpResponse::Created().json(view))
}

#[utoipa::path(
    put,
    path = "/api/recipes/{recipe_id}",
    params(
        ("recipe_id" = i64, Path, description = "Recipe ID")
    ),
    request_body = RecipeWriteRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn update_recipe(
    path: web::Path<i64>,
    req: web::Json<RecipeWriteRequest>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    let recipe =
        recipe_writer::update(pool.get_ref(), path.into_inner(), user.user_id, &req).await?;
    let view = projection::recipe_view(pool.get_ref(), recipe, Some(user.user_id)).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{recipe_id}",
    params(
        ("recipe_id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn delete_recipe(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    recipe_writer::delete(pool.get_ref(), path.into_inner(), user.user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn add_to<R: UserRelation>(
    recipe_id: i64,
    user: AuthenticatedUser,
    pool: &DbPool,
) -> ApiResult<HttpResponse> {
    let recipe = find_recipe(pool, recipe_id).await?;
    relations::add::<R, _>(pool, user.user_id, recipe.id).await?;
    Ok(HttpResponse::Created().json(RecipeShortResponse::from(recipe)))
}

async fn remove_from<R: UserRelation>(
    recipe_id: i64,
    user: AuthenticatedUser,
    pool: &DbPool,
) -> ApiResult<HttpResponse> {
    let recipe = find_recipe(pool, recipe_id).await?;
    relations::remove::<R, _>(pool, user.user_id, recipe.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/recipes/{recipe_id}/favorite",
    params(
        ("recipe_id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Added to favorites", body = RecipeShortResponse),
        (status = 400, description = "Already in favorites"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Recipe not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn add_favorite(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    add_to::<Favorites>(path.into_inner(), user, pool.get_ref()).await
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{recipe_id}/favorite",
    params(
        ("recipe_id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 400, description = "Not in favorites"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Recipe not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn remove_favorite(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    remove_from::<Favorites>(path.into_inner(), user, pool.get_ref()).await
}

#[utoipa::path(
    post,
    path = "/api/recipes/{recipe_id}/shopping_cart",
    params(
        ("recipe_id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Added to the shopping cart", body = RecipeShortResponse),
        (status = 400, description = "Already in the shopping cart"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Recipe not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn add_to_cart(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    add_to::<ShoppingCart>(path.into_inner(), user, pool.get_ref()).await
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{recipe_id}/shopping_cart",
    params(
        ("recipe_id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from the shopping cart"),
        (status = 400, description = "Not in the shopping cart"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Recipe not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn remove_from_cart(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    remove_from::<ShoppingCart>(path.into_inner(), user, pool.get_ref()).await
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    responses(
        (status = 200, description = "Aggregated shopping list", content_type = "text/plain", body = String),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn download_shopping_cart(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    let lines = shopping_list::build_shopping_list(pool.get_ref(), user.user_id).await?;
    log::debug!(
        "Shopping list for user {} has {} lines",
        user.user_id,
        lines.len()
    );

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"shopping_list.txt\"",
        ))
        .body(shopping_list::render(&lines)))
}
