use crate::auth::{hash_password, issue_token, verify_password};
use crate::config::Config;
use crate::db::DbPool;
use crate::entities::user;
use crate::error::{ApiError, ApiResult, FieldErrors};
use crate::models::{AuthResponse, LoginRequest, SignupRequest};
use crate::services::projection;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter};

const MAX_NAME_LENGTH: usize = 150;
const MAX_EMAIL_LENGTH: usize = 254;

fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
}

fn validate_signup(req: &SignupRequest) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();

    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') || email.len() > MAX_EMAIL_LENGTH {
        errors.add("email", "Enter a valid email address");
    }
    if !is_valid_username(&req.username) {
        errors.add(
            "username",
            "Letters, numbers or @/./+/-/_ allowed only",
        );
    }
    for (field, value) in [
        ("username", &req.username),
        ("first_name", &req.first_name),
        ("last_name", &req.last_name),
    ] {
        if value.chars().count() > MAX_NAME_LENGTH {
            errors.add(field, format!("At most {} characters", MAX_NAME_LENGTH));
        }
    }
    if req.first_name.trim().is_empty() {
        errors.add("first_name", "This field is required");
    }
    if req.last_name.trim().is_empty() {
        errors.add("last_name", "This field is required");
    }
    if req.password.is_empty() {
        errors.add("password", "This field is required");
    }

    errors.into_result()
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid fields"),
        (status = 409, description = "User already exists")
    ),
    tag = "auth"
)]
pub async fn signup(
    req: web::Json<SignupRequest>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    validate_signup(&req)?;
    let email = req.email.trim().to_string();

    let existing_user = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(email.as_str()))
                .add(user::Column::Username.eq(req.username.as_str())),
        )
        .one(pool.get_ref())
        .await?;

    if existing_user.is_some() {
        return Err(ApiError::AlreadyExists(
            "User with this email or username already exists".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;

    let new_user = user::ActiveModel {
        email: sea_orm::Set(email),
        username: sea_orm::Set(req.username.clone()),
        first_name: sea_orm::Set(req.first_name.trim().to_string()),
        last_name: sea_orm::Set(req.last_name.trim().to_string()),
        password_hash: sea_orm::Set(password_hash),
        created_at: sea_orm::Set(Utc::now()),
        ..Default::default()
    };

    let user = user::Entity::insert(new_user)
        .exec_with_returning(pool.get_ref())
        .await
        .map_err(|e| match ApiError::from_insert(e, "User already exists") {
            ApiError::Conflict(message) => ApiError::AlreadyExists(message),
            other => other,
        })?;

    let token = issue_token(&user, &config.jwt)?;
    log::info!("User {} signed up", user.id);

    let user = projection::user_view(pool.get_ref(), user, None).await?;
    Ok(HttpResponse::Created().json(AuthResponse { token, user }))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "User not found")
    ),
    tag = "auth"
)]
pub async fn login(
    req: web::Json<LoginRequest>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(req.email.trim()))
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = issue_token(&user, &config.jwt)?;
    let user = projection::user_view(pool.get_ref(), user, None).await?;
    Ok(HttpResponse::Ok().json(AuthResponse { token, user }))
}
