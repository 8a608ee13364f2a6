pub mod fixtures;
pub mod pool;

pub use fixtures::*;
pub use pool::*;
