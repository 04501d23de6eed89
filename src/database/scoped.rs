use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, PgPool};
use std::marker::PhantomData;
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// A row type that belongs to exactly one identity.
///
/// Table names come from trait constants, never from request input, so
/// interpolating them into SQL is safe.
pub trait OwnedRecord: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize {
    /// Backing table name
    const TABLE: &'static str;
    /// Default ordering for list results; None preserves storage order
    const DEFAULT_ORDER: Option<&'static str>;
    /// Noun used in not-found messages
    const NOUN: &'static str;
}

/// A named owned record that recipes reference through a junction table.
pub trait RecipeAttribute: OwnedRecord {
    const JOIN_TABLE: &'static str;
    const JOIN_COLUMN: &'static str;
}

/// Ownership-scoped access to a table of owned records.
///
/// Every read is filtered to `owner_id = requester` and every miss reports
/// not-found, so a row owned by another identity is indistinguishable from
/// a row that does not exist.
pub struct ScopedRepository<T> {
    pool: PgPool,
    _phantom: PhantomData<T>,
}

impl<T> ScopedRepository<T>
where
    T: OwnedRecord,
{
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// All records owned by the requester, in the type's default order
    pub async fn select_owned(&self, requester: Uuid) -> Result<Vec<T>, DatabaseError> {
        let mut sql = format!("SELECT * FROM {} WHERE owner_id = $1", T::TABLE);
        if let Some(order) = T::DEFAULT_ORDER {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }

        let rows = sqlx::query_as::<_, T>(&sql)
            .bind(requester)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// One record by id, visible only to its owner
    pub async fn select_404(&self, requester: Uuid, id: Uuid) -> Result<T, DatabaseError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1 AND owner_id = $2", T::TABLE);

        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .bind(requester)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or_else(|| DatabaseError::NotFound(format!("{} not found", T::NOUN)))
    }

    /// Delete one record by id, gated on ownership. Junction rows referencing
    /// the record go with it via ON DELETE CASCADE.
    pub async fn delete_404(&self, requester: Uuid, id: Uuid) -> Result<(), DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = $1 AND owner_id = $2", T::TABLE);

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(requester)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("{} not found", T::NOUN)));
        }
        Ok(())
    }
}

impl<T> ScopedRepository<T>
where
    T: RecipeAttribute,
{
    /// Owned attributes referenced by at least one recipe (any recipe, not
    /// necessarily the requester's). DISTINCT collapses attributes that are
    /// referenced by several recipes to a single result row.
    pub async fn select_assigned(&self, requester: Uuid) -> Result<Vec<T>, DatabaseError> {
        let mut sql = format!(
            "SELECT DISTINCT a.* FROM {table} a JOIN {join} j ON j.{col} = a.id WHERE a.owner_id = $1",
            table = T::TABLE,
            join = T::JOIN_TABLE,
            col = T::JOIN_COLUMN,
        );
        if let Some(order) = T::DEFAULT_ORDER {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }

        let rows = sqlx::query_as::<_, T>(&sql)
            .bind(requester)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
