pub mod manager;
pub mod models;
pub mod scoped;

pub use manager::{DatabaseError, DatabaseManager};
pub use scoped::{OwnedRecord, RecipeAttribute, ScopedRepository};
