pub mod favorite_recipe;
pub mod ingredient;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod shopping_cart;
pub mod subscribe;
pub mod tag;
pub mod user;
