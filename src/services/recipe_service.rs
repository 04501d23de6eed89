use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{Ingredient, Recipe, RecipeDetail, RecipeSummary, Tag};
use crate::database::scoped::{OwnedRecord, ScopedRepository};
use crate::services::StoreError;

const SUMMARY_SELECT: &str = r#"
    SELECT r.id, r.title, r.time_minutes, r.price, r.link,
           ARRAY(SELECT rt.tag_id FROM recipe_tags rt WHERE rt.recipe_id = r.id) AS tags,
           ARRAY(SELECT ri.ingredient_id FROM recipe_ingredients ri WHERE ri.recipe_id = r.id) AS ingredients
    FROM recipes r
"#;

/// Fields for a new recipe. The owner never comes from the payload.
#[derive(Debug)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<Uuid>,
}

/// Partial update. None leaves the field untouched; `link` uses a nested
/// Option so an explicit null clears it.
#[derive(Debug, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<Option<String>>,
    pub tags: Option<Vec<Uuid>>,
    pub ingredients: Option<Vec<Uuid>>,
}

/// Recipe store. Reads come back in two shapes: summaries with bare
/// association ids for listings, full expansion for single-item fetches.
pub struct RecipeService {
    repo: ScopedRepository<Recipe>,
}

impl RecipeService {
    pub async fn new() -> Result<Self, StoreError> {
        let pool = DatabaseManager::main_pool().await?;
        Ok(Self::with_pool(pool))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self {
            repo: ScopedRepository::new(pool),
        }
    }

    fn pool(&self) -> &PgPool {
        self.repo.pool()
    }

    /// All recipes owned by the requester, summary shape
    pub async fn list(&self, requester: Uuid) -> Result<Vec<RecipeSummary>, StoreError> {
        let sql = format!("{} WHERE r.owner_id = $1", SUMMARY_SELECT);
        let rows = sqlx::query_as::<_, RecipeSummary>(&sql)
            .bind(requester)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    /// Create a recipe and its association rows in one transaction; either
    /// the whole recipe becomes visible or none of it does.
    pub async fn create(&self, requester: Uuid, recipe: NewRecipe) -> Result<RecipeSummary, StoreError> {
        validate_scalar_fields(
            Some(recipe.title.as_str()),
            Some(recipe.time_minutes),
            Some(recipe.price),
        )?;

        let id = Uuid::new_v4();
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO recipes (id, title, time_minutes, price, link, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(recipe.title.trim())
        .bind(recipe.time_minutes)
        .bind(recipe.price)
        .bind(&recipe.link)
        .bind(requester)
        .execute(&mut *tx)
        .await?;

        replace_links(&mut tx, "recipe_tags", "tag_id", id, &recipe.tags, "tags").await?;
        replace_links(
            &mut tx,
            "recipe_ingredients",
            "ingredient_id",
            id,
            &recipe.ingredients,
            "ingredients",
        )
        .await?;

        tx.commit().await?;

        self.summary_404(requester, id).await
    }

    /// Single recipe with tags and ingredients expanded, owner-gated
    pub async fn retrieve(&self, requester: Uuid, id: Uuid) -> Result<RecipeDetail, StoreError> {
        let recipe = self.repo.select_404(requester, id).await?;

        let tags = sqlx::query_as::<_, Tag>(
            "SELECT t.* FROM tags t JOIN recipe_tags rt ON rt.tag_id = t.id WHERE rt.recipe_id = $1 ORDER BY t.name DESC",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await?;

        let ingredients = sqlx::query_as::<_, Ingredient>(
            "SELECT i.* FROM ingredients i JOIN recipe_ingredients ri ON ri.ingredient_id = i.id WHERE ri.recipe_id = $1 ORDER BY i.name DESC",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await?;

        Ok(RecipeDetail {
            recipe,
            tags,
            ingredients,
        })
    }

    /// Apply changes to an owned recipe. Owner is immutable; association
    /// sets are replaced wholesale when provided.
    pub async fn update(
        &self,
        requester: Uuid,
        id: Uuid,
        changes: RecipeChanges,
    ) -> Result<RecipeSummary, StoreError> {
        validate_scalar_fields(changes.title.as_deref(), changes.time_minutes, changes.price)?;

        let (set_link, link) = match &changes.link {
            Some(value) => (true, value.clone()),
            None => (false, None),
        };

        let mut tx = self.pool().begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE recipes
            SET title = COALESCE($3, title),
                time_minutes = COALESCE($4, time_minutes),
                price = COALESCE($5, price),
                link = CASE WHEN $6 THEN $7 ELSE link END,
                updated_at = now()
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(requester)
        .bind(changes.title.as_ref().map(|t| t.trim().to_string()))
        .bind(changes.time_minutes)
        .bind(changes.price)
        .bind(set_link)
        .bind(link)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::NotFound(format!("{} not found", Recipe::NOUN)));
        }

        if let Some(tags) = &changes.tags {
            clear_links(&mut tx, "recipe_tags", id).await?;
            replace_links(&mut tx, "recipe_tags", "tag_id", id, tags, "tags").await?;
        }
        if let Some(ingredients) = &changes.ingredients {
            clear_links(&mut tx, "recipe_ingredients", id).await?;
            replace_links(
                &mut tx,
                "recipe_ingredients",
                "ingredient_id",
                id,
                ingredients,
                "ingredients",
            )
            .await?;
        }

        tx.commit().await?;

        self.summary_404(requester, id).await
    }

    /// Delete an owned recipe. Its junction rows cascade; tags and
    /// ingredients themselves are untouched.
    pub async fn delete(&self, requester: Uuid, id: Uuid) -> Result<(), StoreError> {
        Ok(self.repo.delete_404(requester, id).await?)
    }

    async fn summary_404(&self, requester: Uuid, id: Uuid) -> Result<RecipeSummary, StoreError> {
        let sql = format!("{} WHERE r.owner_id = $1 AND r.id = $2", SUMMARY_SELECT);
        let row = sqlx::query_as::<_, RecipeSummary>(&sql)
            .bind(requester)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        row.ok_or_else(|| StoreError::NotFound(format!("{} not found", Recipe::NOUN)))
    }
}

async fn clear_links(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    recipe_id: Uuid,
) -> Result<(), StoreError> {
    let sql = format!("DELETE FROM {} WHERE recipe_id = $1", table);
    sqlx::query(&sql).bind(recipe_id).execute(&mut **tx).await?;
    Ok(())
}

/// Insert association rows. A dangling id surfaces as a foreign key
/// violation and is reported as a field error on the payload list.
async fn replace_links(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    column: &str,
    recipe_id: Uuid,
    ids: &[Uuid],
    field: &str,
) -> Result<(), StoreError> {
    let sql = format!(
        "INSERT INTO {} (recipe_id, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        table, column
    );
    for linked_id in ids {
        sqlx::query(&sql)
            .bind(recipe_id)
            .bind(linked_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::field(field, &format!("Invalid id: {}", linked_id))
                } else {
                    StoreError::Sqlx(e)
                }
            })?;
    }
    Ok(())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn validate_scalar_fields(
    title: Option<&str>,
    time_minutes: Option<i32>,
    price: Option<Decimal>,
) -> Result<(), StoreError> {
    let mut errors = HashMap::new();

    if let Some(title) = title {
        if title.trim().is_empty() {
            errors.insert("title".to_string(), "This field may not be blank".to_string());
        }
    }
    if let Some(minutes) = time_minutes {
        if minutes < 0 {
            errors.insert(
                "time_minutes".to_string(),
                "Ensure this value is greater than or equal to 0".to_string(),
            );
        }
    }
    if let Some(price) = price {
        if price < Decimal::ZERO {
            errors.insert(
                "price".to_string(),
                "Ensure this value is greater than or equal to 0".to_string(),
            );
        }
    }

    if !errors.is_empty() {
        return Err(StoreError::Validation(errors));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_scalars() {
        assert!(validate_scalar_fields(Some("Lemon tart"), Some(30), Some(Decimal::new(550, 2))).is_ok());
    }

    #[test]
    fn collects_all_field_errors_at_once() {
        let err = validate_scalar_fields(Some("  "), Some(-5), Some(Decimal::new(-1, 0)))
            .expect_err("should fail");
        match err {
            StoreError::Validation(map) => {
                assert!(map.contains_key("title"));
                assert!(map.contains_key("time_minutes"));
                assert!(map.contains_key("price"));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn absent_fields_are_not_validated() {
        assert!(validate_scalar_fields(None, None, None).is_ok());
    }
}
