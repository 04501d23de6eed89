use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::scoped::{OwnedRecord, RecipeAttribute};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedRecord for Ingredient {
    const TABLE: &'static str = "ingredients";
    const DEFAULT_ORDER: Option<&'static str> = Some("name DESC");
    const NOUN: &'static str = "Ingredient";
}

impl RecipeAttribute for Ingredient {
    const JOIN_TABLE: &'static str = "recipe_ingredients";
    const JOIN_COLUMN: &'static str = "ingredient_id";
}
