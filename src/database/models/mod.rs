pub mod identity;
pub mod ingredient;
pub mod recipe;
pub mod tag;

pub use identity::Identity;
pub use ingredient::Ingredient;
pub use recipe::{Recipe, RecipeDetail, RecipeSummary};
pub use tag::Tag;
