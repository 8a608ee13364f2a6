// Integration tests for API endpoints
// Each test runs the full router against its own in-memory SQLite database.
// Run with: cargo test --test api_test

use actix_web::{http::StatusCode, test, web, App};
use recipe_share_service::{
    api,
    config::Config,
    db::{self, DbPool},
    entities::{ingredient, tag},
    models::{AuthResponse, Page, RecipeResponse, SubscriptionResponse, UserResponse},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::{json, Value};

const INGREDIENTS: &str = r#"[
    {"name": "flour", "measurement_unit": "g"},
    {"name": "eggs", "measurement_unit": "pcs"},
    {"name": "milk", "measurement_unit": "ml"},
    {"name": "Apple", "measurement_unit": "pcs"},
    {"name": "Applesauce", "measurement_unit": "g"},
    {"name": "Pineapple", "measurement_unit": "pcs"}
]"#;

const TAGS: &str = r##"[
    {"name": "Breakfast", "color": "#E26C2D", "slug": "breakfast"},
    {"name": "Lunch", "color": "#49B64E", "slug": "lunch"},
    {"name": "Dinner", "color": "#8775D2", "slug": "dinner"}
]"##;

fn test_config() -> Config {
    let mut config = Config::from_env().expect("Failed to load configuration");
    config.database.url = Some("sqlite::memory:".to_string());
    config.jwt.secret = "test-secret".to_string();
    config.pagination.page_size = 6;
    config.pagination.max_page_size = 100;
    config
}

/// Fresh database with the reference fixtures loaded.
async fn setup_pool(config: &Config) -> DbPool {
    let pool = db::create_pool(config)
        .await
        .expect("Failed to create database pool");
    db::load_ingredients(&pool, INGREDIENTS)
        .await
        .expect("Failed to load ingredients");
    db::load_tags(&pool, TAGS).await.expect("Failed to load tags");
    pool
}

/// Helper function to create a test app
fn create_test_app(
    config: Config,
    pool: DbPool,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(config))
        .app_data(web::Data::new(pool))
        .configure(api::configure)
}

macro_rules! init_app {
    () => {{
        let config = test_config();
        let pool = setup_pool(&config).await;
        (
            test::init_service(create_test_app(config, pool.clone())).await,
            pool,
        )
    }};
}

async fn ingredient_id(pool: &DbPool, name: &str) -> i64 {
    ingredient::Entity::find()
        .filter(ingredient::Column::Name.eq(name))
        .one(pool)
        .await
        .unwrap()
        .expect("ingredient fixture missing")
        .id
}

async fn tag_id(pool: &DbPool, slug: &str) -> i64 {
    tag::Entity::find()
        .filter(tag::Column::Slug.eq(slug))
        .one(pool)
        .await
        .unwrap()
        .expect("tag fixture missing")
        .id
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Signs up `name` and returns (token, user id).
macro_rules! signup {
    ($app:expr, $name:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(json!({
                "email": format!("{}@example.com", $name),
                "username": $name,
                "first_name": "Test",
                "last_name": "Cook",
                "password": "password123"
            }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED, "signup should succeed");
        let body: AuthResponse = test::read_body_json(resp).await;
        (body.token, body.user.id)
    }};
}

/// Creates a recipe and returns its id.
macro_rules! create_recipe {
    ($app:expr, $token:expr, $body:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/recipes")
            .insert_header(bearer(&$token))
            .set_json($body)
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED, "recipe should be created");
        let body: RecipeResponse = test::read_body_json(resp).await;
        body.id
    }};
}

fn recipe_body(name: &str, ingredients: Value, tags: Value) -> Value {
    json!({
        "name": name,
        "text": "Mix everything and cook.",
        "cooking_time": 25,
        "ingredients": ingredients,
        "tags": tags
    })
}

#[actix_web::test]
async fn test_signup_and_login() {
    let (app, _pool) = init_app!();
    let (token, _) = signup!(app, "alice");
    assert!(!token.is_empty(), "Token should not be empty");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"email": "alice@example.com", "password": "password123"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: AuthResponse = test::read_body_json(resp).await;
    assert_eq!(body.user.username, "alice");
    assert!(!body.user.is_subscribed);
}

#[actix_web::test]
async fn test_signup_duplicate_and_invalid() {
    let (app, _pool) = init_app!();
    signup!(app, "bob");

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({
            "email": "bob@example.com",
            "username": "bob2",
            "first_name": "Bob",
            "last_name": "Again",
            "password": "password123"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({
            "email": "not-an-email",
            "username": "has space",
            "first_name": "Bad",
            "last_name": "Input",
            "password": "password123"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["fields"]["email"].is_array());
    assert!(body["fields"]["username"].is_array());
}

#[actix_web::test]
async fn test_login_failures() {
    let (app, _pool) = init_app!();
    signup!(app, "carol");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"email": "carol@example.com", "password": "wrong"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"email": "nobody@example.com", "password": "password123"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_create_then_read_recipe() {
    let (app, pool) = init_app!();
    let (token, user_id) = signup!(app, "chef");
    let flour = ingredient_id(&pool, "flour").await;
    let eggs = ingredient_id(&pool, "eggs").await;
    let breakfast = tag_id(&pool, "breakfast").await;

    let recipe_id = create_recipe!(
        app,
        token,
        recipe_body(
            "Pancakes",
            json!([{"id": flour, "amount": 200}, {"id": eggs, "amount": 2}]),
            json!([breakfast])
        )
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/recipes/{}", recipe_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let recipe: RecipeResponse = test::read_body_json(resp).await;

    let mut ingredients: Vec<(i64, i32)> = recipe
        .ingredients
        .iter()
        .map(|line| (line.id, line.amount))
        .collect();
    ingredients.sort();
    let mut expected = vec![(flour, 200), (eggs, 2)];
    expected.sort();
    assert_eq!(ingredients, expected);

    let eggs_line = recipe.ingredients.iter().find(|l| l.id == eggs).unwrap();
    assert_eq!(eggs_line.name, "eggs");
    assert_eq!(eggs_line.measurement_unit, "pcs");

    assert_eq!(recipe.tags.len(), 1);
    assert_eq!(recipe.tags[0].slug, "breakfast");
    assert_eq!(recipe.author.id, user_id);
    assert!(!recipe.is_favorited, "anonymous viewer flags are false");
    assert!(!recipe.is_in_shopping_cart);
    assert!(!recipe.author.is_subscribed);
}

#[actix_web::test]
async fn test_create_recipe_requires_auth() {
    let (app, pool) = init_app!();
    let flour = ingredient_id(&pool, "flour").await;

    let req = test::TestRequest::post()
        .uri("/api/recipes")
        .set_json(recipe_body("Bread", json!([{"id": flour, "amount": 500}]), json!([])))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_create_recipe_validation() {
    let (app, pool) = init_app!();
    let (token, _) = signup!(app, "strict");
    let flour = ingredient_id(&pool, "flour").await;

    let mut body = recipe_body(
        "Bad",
        json!([{"id": flour, "amount": 100}, {"id": flour, "amount": 50}]),
        json!([9999]),
    );
    body["cooking_time"] = json!(0);

    let req = test::TestRequest::post()
        .uri("/api/recipes")
        .insert_header(bearer(&token))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let errors: Value = test::read_body_json(resp).await;
    assert!(errors["fields"]["cooking_time"].is_array());
    assert!(errors["fields"]["tags"].is_array());
    let ingredient_errors = errors["fields"]["ingredients"].to_string();
    assert!(ingredient_errors.contains(&format!("Ingredient {}", flour)));

    // Nothing half-written
    let req = test::TestRequest::get().uri("/api/recipes").to_request();
    let page: Page<RecipeResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.count, 0);
}

#[actix_web::test]
async fn test_update_replaces_composition() {
    let (app, pool) = init_app!();
    let (token, _) = signup!(app, "editor");
    let flour = ingredient_id(&pool, "flour").await;
    let eggs = ingredient_id(&pool, "eggs").await;
    let milk = ingredient_id(&pool, "milk").await;
    let breakfast = tag_id(&pool, "breakfast").await;
    let dinner = tag_id(&pool, "dinner").await;

    let recipe_id = create_recipe!(
        app,
        token,
        recipe_body(
            "Omelette",
            json!([{"id": eggs, "amount": 3}, {"id": flour, "amount": 10}]),
            json!([breakfast])
        )
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/recipes/{}", recipe_id))
        .to_request();
    let before: RecipeResponse = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/recipes/{}", recipe_id))
        .insert_header(bearer(&token))
        .set_json(recipe_body(
            "Milk omelette",
            json!([{"id": eggs, "amount": 4}, {"id": milk, "amount": 100}]),
            json!([dinner]),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let after: RecipeResponse = test::read_body_json(resp).await;

    assert_eq!(after.id, before.id);
    assert_eq!(after.author.id, before.author.id);
    assert_eq!(after.pub_date, before.pub_date);
    assert_eq!(after.name, "Milk omelette");
    assert!(after.ingredients.iter().all(|line| line.id != flour));
    assert_eq!(after.ingredients.len(), 2);
    assert!(after
        .ingredients
        .iter()
        .any(|line| line.id == eggs && line.amount == 4));
    assert_eq!(after.tags.len(), 1);
    assert_eq!(after.tags[0].slug, "dinner");
}

#[actix_web::test]
async fn test_only_author_can_modify() {
    let (app, pool) = init_app!();
    let (author_token, _) = signup!(app, "owner");
    let (other_token, _) = signup!(app, "intruder");
    let flour = ingredient_id(&pool, "flour").await;

    let body = recipe_body("Bread", json!([{"id": flour, "amount": 500}]), json!([]));
    let recipe_id = create_recipe!(app, author_token, &body);

    let req = test::TestRequest::put()
        .uri(&format!("/api/recipes/{}", recipe_id))
        .insert_header(bearer(&other_token))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/recipes/{}", recipe_id))
        .insert_header(bearer(&other_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/recipes/{}", recipe_id))
        .insert_header(bearer(&author_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/recipes/{}", recipe_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_deleting_recipe_clears_favorites_and_cart() {
    let (app, pool) = init_app!();
    let (author_token, _) = signup!(app, "baker");
    let (reader_token, _) = signup!(app, "follower");
    let flour = ingredient_id(&pool, "flour").await;
    let eggs = ingredient_id(&pool, "eggs").await;

    let recipe_id = create_recipe!(
        app,
        author_token,
        recipe_body(
            "Brioche",
            json!([{"id": flour, "amount": 300}, {"id": eggs, "amount": 3}]),
            json!([])
        )
    );

    for relation in ["favorite", "shopping_cart"] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/recipes/{}/{}", recipe_id, relation))
            .insert_header(bearer(&reader_token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri("/api/recipes/download_shopping_cart")
        .insert_header(bearer(&reader_token))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(String::from_utf8(body.to_vec()).unwrap(), "flour - 300 g\neggs - 3 pcs");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/recipes/{}", recipe_id))
        .insert_header(bearer(&author_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri("/api/recipes/download_shopping_cart")
        .insert_header(bearer(&reader_token))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert!(body.is_empty(), "cart entries go with the recipe");

    for filter in ["is_favorited=1", "is_in_shopping_cart=1"] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/recipes?{}", filter))
            .insert_header(bearer(&reader_token))
            .to_request();
        let page: Page<RecipeResponse> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page.count, 0, "{} still matches", filter);
    }

    let remaining = recipe_share_service::entities::recipe_ingredient::Entity::find()
        .all(&pool)
        .await
        .unwrap();
    assert!(remaining.is_empty(), "ingredient rows go with the recipe");
}

#[actix_web::test]
async fn test_favorite_add_remove_semantics() {
    let (app, pool) = init_app!();
    let (token, _) = signup!(app, "fan");
    let flour = ingredient_id(&pool, "flour").await;
    let recipe_id = create_recipe!(
        app,
        token,
        recipe_body("Bread", json!([{"id": flour, "amount": 500}]), json!([]))
    );
    let uri = format!("/api/recipes/{}/favorite", recipe_id);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let short: Value = test::read_body_json(resp).await;
    assert_eq!(short["id"], json!(recipe_id));
    assert_eq!(short["cooking_time"], json!(25));

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "second add is rejected");

    let req = test::TestRequest::get()
        .uri(&format!("/api/recipes/{}", recipe_id))
        .insert_header(bearer(&token))
        .to_request();
    let recipe: RecipeResponse = test::call_and_read_body_json(&app, req).await;
    assert!(recipe.is_favorited);
    assert!(!recipe.is_in_shopping_cart);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "removing a missing favorite");

    let req = test::TestRequest::post()
        .uri("/api/recipes/999999/favorite")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_shopping_list_sums_shared_ingredients() {
    let (app, pool) = init_app!();
    let (token, _) = signup!(app, "shopper");
    let flour = ingredient_id(&pool, "flour").await;
    let eggs = ingredient_id(&pool, "eggs").await;

    let first = create_recipe!(
        app,
        token,
        recipe_body(
            "Pie",
            json!([{"id": flour, "amount": 100}, {"id": eggs, "amount": 2}]),
            json!([])
        )
    );
    let second = create_recipe!(
        app,
        token,
        recipe_body("Cookies", json!([{"id": flour, "amount": 50}]), json!([]))
    );

    for recipe_id in [first, second] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/recipes/{}/shopping_cart", recipe_id))
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri("/api/recipes/download_shopping_cart")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp
        .headers()
        .get("Content-Disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));

    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(text, "flour - 150 g\neggs - 2 pcs");
}

#[actix_web::test]
async fn test_shopping_list_empty_cart_and_auth() {
    let (app, _pool) = init_app!();
    let (token, _) = signup!(app, "empty");

    let req = test::TestRequest::get()
        .uri("/api/recipes/download_shopping_cart")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(body.is_empty());

    let req = test::TestRequest::get()
        .uri("/api/recipes/download_shopping_cart")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_cart_duplicate_semantics() {
    let (app, pool) = init_app!();
    let (token, _) = signup!(app, "cartdup");
    let flour = ingredient_id(&pool, "flour").await;
    let recipe_id = create_recipe!(
        app,
        token,
        recipe_body("Bread", json!([{"id": flour, "amount": 500}]), json!([]))
    );
    let uri = format!("/api/recipes/{}/shopping_cart", recipe_id);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    for expected in [StatusCode::CREATED, StatusCode::BAD_REQUEST] {
        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected);
    }
}

#[actix_web::test]
async fn test_subscriptions() {
    let (app, pool) = init_app!();
    let (reader_token, reader_id) = signup!(app, "reader");
    let (author_token, author_id) = signup!(app, "writer");
    let flour = ingredient_id(&pool, "flour").await;

    for name in ["One", "Two", "Three"] {
        create_recipe!(
            app,
            author_token,
            recipe_body(name, json!([{"id": flour, "amount": 100}]), json!([]))
        );
    }

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/subscribe", reader_id))
        .insert_header(bearer(&reader_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "self-subscription");

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/subscribe?recipes_limit=2", author_id))
        .insert_header(bearer(&reader_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: SubscriptionResponse = test::read_body_json(resp).await;
    assert!(created.is_subscribed);
    assert_eq!(created.recipes.len(), 2);
    assert_eq!(created.recipes_count, 3);

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/subscribe", author_id))
        .insert_header(bearer(&reader_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "duplicate subscription");

    // Still a validation error once other subscriptions exist
    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/subscribe", reader_id))
        .insert_header(bearer(&reader_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["fields"]["author"].is_array());

    let req = test::TestRequest::get()
        .uri("/api/users/subscriptions?recipes_limit=1")
        .insert_header(bearer(&reader_token))
        .to_request();
    let page: Page<SubscriptionResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].id, author_id);
    assert_eq!(page.results[0].recipes.len(), 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}", author_id))
        .insert_header(bearer(&reader_token))
        .to_request();
    let profile: UserResponse = test::call_and_read_body_json(&app, req).await;
    assert!(profile.is_subscribed);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{}/subscribe", author_id))
        .insert_header(bearer(&reader_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{}/subscribe", author_id))
        .insert_header(bearer(&reader_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "not subscribed anymore");

    let req = test::TestRequest::post()
        .uri("/api/users/999999/subscribe")
        .insert_header(bearer(&reader_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_ingredient_prefix_filter() {
    let (app, _pool) = init_app!();

    let req = test::TestRequest::get()
        .uri("/api/ingredients?name=app")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ingredients: Vec<Value> = test::read_body_json(resp).await;
    let names: Vec<&str> = ingredients
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Apple", "Applesauce"]);

    let req = test::TestRequest::get().uri("/api/ingredients").to_request();
    let all: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(all.len(), 6);
}

#[actix_web::test]
async fn test_ingredient_prefix_is_literal() {
    let (app, pool) = init_app!();
    db::load_ingredients(&pool, r#"[{"name": "Мука", "measurement_unit": "г"}]"#)
        .await
        .unwrap();

    let names_for = |ingredients: Vec<Value>| -> Vec<String> {
        ingredients
            .iter()
            .map(|i| i["name"].as_str().unwrap().to_string())
            .collect()
    };

    // `%` and `_` are plain characters, not wildcards
    for uri in [
        "/api/ingredients?name=%25apple",
        "/api/ingredients?name=%25",
        "/api/ingredients?name=_",
        "/api/ingredients?name=a_p",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let ingredients: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(ingredients.is_empty(), "{} matched {:?}", uri, names_for(ingredients));
    }

    let req = test::TestRequest::get()
        .uri("/api/ingredients?name=APP")
        .to_request();
    let ingredients: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(names_for(ingredients), vec!["Apple", "Applesauce"]);

    let req = test::TestRequest::get()
        .uri("/api/ingredients?name=%D0%9C%D1%83%D0%BA")
        .to_request();
    let ingredients: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(names_for(ingredients), vec!["Мука"]);
}

#[actix_web::test]
async fn test_tags_endpoints() {
    let (app, pool) = init_app!();

    let req = test::TestRequest::get().uri("/api/tags").to_request();
    let tags: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(tags.len(), 3);

    let lunch = tag_id(&pool, "lunch").await;
    let req = test::TestRequest::get()
        .uri(&format!("/api/tags/{}", lunch))
        .to_request();
    let tag: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(tag["color"], json!("#49B64E"));

    let req = test::TestRequest::get().uri("/api/tags/999999").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_recipe_list_filters() {
    let (app, pool) = init_app!();
    let (first_token, first_id) = signup!(app, "first");
    let (second_token, _) = signup!(app, "second");
    let flour = ingredient_id(&pool, "flour").await;
    let breakfast = tag_id(&pool, "breakfast").await;
    let lunch = tag_id(&pool, "lunch").await;
    let dinner = tag_id(&pool, "dinner").await;

    let morning = create_recipe!(
        app,
        first_token,
        recipe_body("Porridge", json!([{"id": flour, "amount": 10}]), json!([breakfast]))
    );
    let noon = create_recipe!(
        app,
        second_token,
        recipe_body("Soup", json!([{"id": flour, "amount": 20}]), json!([lunch]))
    );
    create_recipe!(
        app,
        second_token,
        recipe_body("Steak", json!([{"id": flour, "amount": 30}]), json!([dinner]))
    );

    let req = test::TestRequest::post()
        .uri(&format!("/api/recipes/{}/favorite", noon))
        .insert_header(bearer(&first_token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    let req = test::TestRequest::post()
        .uri(&format!("/api/recipes/{}/shopping_cart", morning))
        .insert_header(bearer(&first_token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let ids = |page: &Page<RecipeResponse>| page.results.iter().map(|r| r.id).collect::<Vec<_>>();

    let req = test::TestRequest::get()
        .uri("/api/recipes?tags=breakfast&tags=lunch")
        .to_request();
    let page: Page<RecipeResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(&page), vec![morning, noon]);

    let req = test::TestRequest::get()
        .uri(&format!("/api/recipes?author={}", first_id))
        .to_request();
    let page: Page<RecipeResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(&page), vec![morning]);

    // Anonymous callers: favorite/cart filters are ignored
    let req = test::TestRequest::get()
        .uri("/api/recipes?is_favorited=true")
        .to_request();
    let page: Page<RecipeResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.count, 3);

    let req = test::TestRequest::get()
        .uri("/api/recipes?is_favorited=true")
        .insert_header(bearer(&first_token))
        .to_request();
    let page: Page<RecipeResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(&page), vec![noon]);
    assert!(page.results[0].is_favorited);

    let req = test::TestRequest::get()
        .uri("/api/recipes?is_in_shopping_cart=1&tags=breakfast")
        .insert_header(bearer(&first_token))
        .to_request();
    let page: Page<RecipeResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(&page), vec![morning]);
    assert!(page.results[0].is_in_shopping_cart);

    let req = test::TestRequest::get()
        .uri("/api/recipes?is_favorited=false")
        .insert_header(bearer(&first_token))
        .to_request();
    let page: Page<RecipeResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.count, 3);

    let req = test::TestRequest::get()
        .uri("/api/recipes?author=someone")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_recipe_pagination() {
    let (app, pool) = init_app!();
    let (token, _) = signup!(app, "prolific");
    let flour = ingredient_id(&pool, "flour").await;

    for n in 0..5 {
        create_recipe!(
            app,
            token,
            recipe_body(
                &format!("Recipe {}", n),
                json!([{"id": flour, "amount": 10 + n}]),
                json!([])
            )
        );
    }

    let req = test::TestRequest::get()
        .uri("/api/recipes?page=2&limit=2")
        .to_request();
    let page: Page<RecipeResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.count, 5);
    assert_eq!(page.results.len(), 2);
    assert_eq!(page.next, Some(3));
    assert_eq!(page.previous, Some(1));
    assert_eq!(page.results[0].name, "Recipe 2");
}

#[actix_web::test]
async fn test_users_me_and_set_password() {
    let (app, _pool) = init_app!();
    let (token, user_id) = signup!(app, "dave");

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(&token))
        .to_request();
    let me: UserResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me.id, user_id);
    assert_eq!(me.email, "dave@example.com");

    let req = test::TestRequest::get().uri("/api/users/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/users/set_password")
        .insert_header(bearer(&token))
        .set_json(json!({"current_password": "nope", "new_password": "newpass456"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/users/set_password")
        .insert_header(bearer(&token))
        .set_json(json!({"current_password": "password123", "new_password": "newpass456"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"email": "dave@example.com", "password": "newpass456"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/users?limit=10").to_request();
    let page: Page<UserResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.count, 1);
}

#[actix_web::test]
async fn test_fixtures_are_idempotent() {
    let config = test_config();
    let pool = setup_pool(&config).await;

    let inserted = db::load_ingredients(&pool, INGREDIENTS).await.unwrap();
    assert_eq!(inserted, 0);
    let inserted = db::load_tags(&pool, TAGS).await.unwrap();
    assert_eq!(inserted, 0);

    let inserted = db::load_ingredients(
        &pool,
        r#"[{"name": "flour", "measurement_unit": "kg"}]"#,
    )
    .await
    .unwrap();
    assert_eq!(inserted, 1, "same name with another unit is a new ingredient");
}
