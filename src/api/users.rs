use crate::auth::{hash_password, verify_password, AuthenticatedUser};
use crate::config::Config;
use crate::db::DbPool;
use crate::entities::{subscribe, user};
use crate::error::{ApiError, ApiResult, FieldErrors};
use crate::models::{Page, PageQuery, PageRequest, SetPasswordRequest};
use crate::services::projection;
use crate::services::relations::{self, Subscriptions};
use actix_web::{web, HttpResponse};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct SubscriptionQuery {
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 6)]
    pub limit: Option<u64>,
    /// Maximum number of recipes embedded per author.
    #[schema(example = 3)]
    pub recipes_limit: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct RecipesLimitQuery {
    #[schema(example = 3)]
    pub recipes_limit: Option<u64>,
}

async fn find_user(pool: &DbPool, user_id: i64) -> ApiResult<user::Model> {
    user::Entity::find_by_id(user_id)
        .one(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Paginated users", body = Vec<UserResponse>)
    ),
    tag = "users"
)]
pub async fn list_users(
    viewer: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let viewer = viewer.map(|u| u.user_id);
    let request = query.resolve(&config.pagination);

    let paginator = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .paginate(pool.get_ref(), request.limit);
    let count = paginator.num_items().await?;
    let users = paginator.fetch_page(request.index()).await?;

    let mut results = Vec::with_capacity(users.len());
    for user in users {
        results.push(projection::user_view(pool.get_ref(), user, viewer).await?);
    }

    Ok(HttpResponse::Ok().json(Page::new(results, count, request)))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn me(user: AuthenticatedUser, pool: web::Data<DbPool>) -> ApiResult<HttpResponse> {
    let model = find_user(pool.get_ref(), user.user_id).await?;
    let view = projection::user_view(pool.get_ref(), model, Some(user.user_id)).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn get_user(
    path: web::Path<i64>,
    viewer: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    let model = find_user(pool.get_ref(), path.into_inner()).await?;
    let view = projection::user_view(pool.get_ref(), model, viewer.map(|u| u.user_id)).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    post,
    path = "/api/users/set_password",
    request_body = SetPasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Current password is wrong"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn set_password(
    req: web::Json<SetPasswordRequest>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    let model = find_user(pool.get_ref(), user.user_id).await?;

    if !verify_password(&req.current_password, &model.password_hash) {
        return Err(ApiError::Validation(FieldErrors::single(
            "current_password",
            "Current password is incorrect",
        )));
    }
    if req.new_password.is_empty() {
        return Err(ApiError::Validation(FieldErrors::single(
            "new_password",
            "This field is required",
        )));
    }

    let mut active: user::ActiveModel = model.into();
    active.password_hash = sea_orm::Set(hash_password(&req.new_password)?);
    active.update(pool.get_ref()).await?;

    log::info!("User {} changed their password", user.user_id);
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
        ("recipes_limit" = Option<u64>, Query, description = "Recipes embedded per author")
    ),
    responses(
        (status = 200, description = "Paginated subscriptions", body = Vec<SubscriptionResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn subscriptions(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<SubscriptionQuery>,
) -> ApiResult<HttpResponse> {
    let request = PageRequest::resolve(query.page, query.limit, &config.pagination);

    let paginator = subscribe::Entity::find()
        .filter(subscribe::Column::UserId.eq(user.user_id))
        .order_by_asc(subscribe::Column::Id)
        .paginate(pool.get_ref(), request.limit);
    let count = paginator.num_items().await?;
    let rows = paginator.fetch_page(request.index()).await?;

    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        let author = find_user(pool.get_ref(), row.author_id).await?;
        results.push(
            projection::subscription_view(
                pool.get_ref(),
                author,
                Some(user.user_id),
                query.recipes_limit,
            )
            .await?,
        );
    }

    Ok(HttpResponse::Ok().json(Page::new(results, count, request)))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/subscribe",
    params(
        ("user_id" = i64, Path, description = "Author ID"),
        ("recipes_limit" = Option<u64>, Query, description = "Recipes embedded in the response")
    ),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionResponse),
        (status = 400, description = "Self-subscription or already subscribed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Author not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn subscribe(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    query: web::Query<RecipesLimitQuery>,
) -> ApiResult<HttpResponse> {
    let author = find_user(pool.get_ref(), path.into_inner()).await?;

    relations::add::<Subscriptions, _>(pool.get_ref(), user.user_id, author.id).await?;
    log::info!("User {} subscribed to {}", user.user_id, author.id);

    let view = projection::subscription_view(
        pool.get_ref(),
        author,
        Some(user.user_id),
        query.recipes_limit,
    )
    .await?;
    Ok(HttpResponse::Created().json(view))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/subscribe",
    params(
        ("user_id" = i64, Path, description = "Author ID")
    ),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Not subscribed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Author not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn unsubscribe(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ApiResult<HttpResponse> {
    let author = find_user(pool.get_ref(), path.into_inner()).await?;

    relations::remove::<Subscriptions, _>(pool.get_ref(), user.user_id, author.id).await?;
    log::info!("User {} unsubscribed from {}", user.user_id, author.id);

    Ok(HttpResponse::NoContent().finish())
}
