pub mod pagination;
pub mod recipe;
pub mod user;

pub use pagination::*;
pub use recipe::*;
pub use user::*;
