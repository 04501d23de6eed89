use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::scoped::{RecipeAttribute, ScopedRepository};
use crate::services::StoreError;

/// Store for named recipe attributes (tags, ingredients). One generic
/// implementation covers both tables; the row type supplies the table and
/// junction names.
pub struct AttributeService<T> {
    repo: ScopedRepository<T>,
}

impl<T> AttributeService<T>
where
    T: RecipeAttribute,
{
    pub async fn new() -> Result<Self, StoreError> {
        let pool = DatabaseManager::main_pool().await?;
        Ok(Self::with_pool(pool))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self {
            repo: ScopedRepository::new(pool),
        }
    }

    /// Attributes owned by the requester, name descending. With
    /// `assigned_only` the result is restricted to attributes referenced by
    /// at least one recipe, each appearing once.
    pub async fn list(&self, requester: Uuid, assigned_only: bool) -> Result<Vec<T>, StoreError> {
        let rows = if assigned_only {
            self.repo.select_assigned(requester).await?
        } else {
            self.repo.select_owned(requester).await?
        };
        Ok(rows)
    }

    /// Create an attribute stamped with the requester as owner. Any owner
    /// supplied in the payload never reaches this layer.
    pub async fn create(&self, requester: Uuid, name: &str) -> Result<T, StoreError> {
        let name = validate_name(name)?;

        let sql = format!(
            "INSERT INTO {} (id, name, owner_id) VALUES ($1, $2, $3) RETURNING *",
            T::TABLE
        );
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(requester)
            .fetch_one(self.repo.pool())
            .await?;
        Ok(row)
    }

}

fn validate_name(name: &str) -> Result<&str, StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::field("name", "This field may not be blank"));
    }
    Ok(trimmed)
}
