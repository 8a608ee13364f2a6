pub mod projection;
pub mod recipe_writer;
pub mod relations;
pub mod shopping_list;
