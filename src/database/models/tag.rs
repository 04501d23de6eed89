use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::scoped::{OwnedRecord, RecipeAttribute};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedRecord for Tag {
    const TABLE: &'static str = "tags";
    const DEFAULT_ORDER: Option<&'static str> = Some("name DESC");
    const NOUN: &'static str = "Tag";
}

impl RecipeAttribute for Tag {
    const JOIN_TABLE: &'static str = "recipe_tags";
    const JOIN_COLUMN: &'static str = "tag_id";
}
