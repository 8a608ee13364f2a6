pub mod auth;
pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod users;

use crate::error::ApiError;
use crate::models::{
    AuthResponse, IngredientAmount, IngredientResponse, LoginRequest, PageQuery,
    RecipeIngredientResponse, RecipeResponse, RecipeShortResponse, RecipeWriteRequest,
    SetPasswordRequest, SignupRequest, SubscriptionResponse, TagResponse, UserResponse,
};
use actix_web::web;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth endpoints
        auth::signup,
        auth::login,
        // User endpoints
        users::list_users,
        users::me,
        users::get_user,
        users::set_password,
        users::subscriptions,
        users::subscribe,
        users::unsubscribe,
        // Reference data
        tags::list_tags,
        tags::get_tag,
        ingredients::list_ingredients,
        ingredients::get_ingredient,
        // Recipe endpoints
        recipes::list_recipes,
        recipes::get_recipe,
        recipes::create_recipe,
        recipes::update_recipe,
        recipes::delete_recipe,
        recipes::add_favorite,
        recipes::remove_favorite,
        recipes::add_to_cart,
        recipes::remove_from_cart,
        recipes::download_shopping_cart,
    ),
    components(schemas(
        // Auth schemas
        SignupRequest,
        LoginRequest,
        AuthResponse,
        // User schemas
        UserResponse,
        SetPasswordRequest,
        SubscriptionResponse,
        // Recipe schemas
        TagResponse,
        IngredientResponse,
        IngredientAmount,
        RecipeWriteRequest,
        RecipeResponse,
        RecipeIngredientResponse,
        RecipeShortResponse,
        // Query schemas
        PageQuery,
        users::SubscriptionQuery,
        users::RecipesLimitQuery,
        ingredients::IngredientQuery,
    )),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User profiles and subscriptions"),
        (name = "tags", description = "Recipe tags"),
        (name = "ingredients", description = "Ingredient catalogue"),
        (name = "recipes", description = "Recipes, favorites and the shopping cart"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

use utoipa::Modify;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

/// Registers the `/api` scope. Shared by the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::NotFound(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            .service(
                web::scope("/auth")
                    .route("/signup", web::post().to(auth::signup))
                    .route("/login", web::post().to(auth::login)),
            )
            .service(
                web::scope("/users")
                    .route("", web::get().to(users::list_users))
                    .route("/me", web::get().to(users::me))
                    .route("/set_password", web::post().to(users::set_password))
                    .route("/subscriptions", web::get().to(users::subscriptions))
                    .route("/{user_id}", web::get().to(users::get_user))
                    .route("/{user_id}/subscribe", web::post().to(users::subscribe))
                    .route("/{user_id}/subscribe", web::delete().to(users::unsubscribe)),
            )
            .service(
                web::scope("/tags")
                    .route("", web::get().to(tags::list_tags))
                    .route("/{tag_id}", web::get().to(tags::get_tag)),
            )
            .service(
                web::scope("/ingredients")
                    .route("", web::get().to(ingredients::list_ingredients))
                    .route("/{ingredient_id}", web::get().to(ingredients::get_ingredient)),
            )
            .service(
                web::scope("/recipes")
                    .route("", web::get().to(recipes::list_recipes))
                    .route("", web::post().to(recipes::create_recipe))
                    .route(
                        "/download_shopping_cart",
                        web::get().to(recipes::download_shopping_cart),
                    )
                    .route("/{recipe_id}", web::get().to(recipes::get_recipe))
                    .route("/{recipe_id}", web::put().to(recipes::update_recipe))
                    .route("/{recipe_id}", web::patch().to(recipes::update_recipe))
                    .route("/{recipe_id}", web::delete().to(recipes::delete_recipe))
                    .route("/{recipe_id}/favorite", web::post().to(recipes::add_favorite))
                    .route(
                        "/{recipe_id}/favorite",
                        web::delete().to(recipes::remove_favorite),
                    )
                    .route(
                        "/{recipe_id}/shopping_cart",
                        web::post().to(recipes::add_to_cart),
                    )
                    .route(
                        "/{recipe_id}/shopping_cart",
                        web::delete().to(recipes::remove_from_cart),
                    ),
            ),
    );
}
