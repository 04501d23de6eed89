use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::Identity;
use crate::services::{is_unique_violation, StoreError};

const MIN_PASSWORD_LENGTH: usize = 8;

/// Account store: creation, credential checks and self-service maintenance.
pub struct IdentityService {
    pool: PgPool,
}

impl IdentityService {
    pub async fn new() -> Result<Self, StoreError> {
        let pool = DatabaseManager::main_pool().await?;
        Ok(Self { pool })
    }

    /// Create a regular identity. Email is normalized before the uniqueness
    /// check; a duplicate resolves to a conflict even under concurrent
    /// registration because the unique constraint decides the winner.
    pub async fn create_identity(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Identity, StoreError> {
        self.create_with_flags(email, password, display_name, false, false).await
    }

    /// Create an identity with elevated flags set
    pub async fn create_privileged_identity(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, StoreError> {
        self.create_with_flags(email, password, "", true, true).await
    }

    async fn create_with_flags(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        is_staff: bool,
        is_superuser: bool,
    ) -> Result<Identity, StoreError> {
        validate_email(email)?;
        validate_password(password)?;

        let email = normalize_email(email);
        let password_hash = hash_password(password)?;

        let row = sqlx::query_as::<_, Identity>(
            r#"
            INSERT INTO identities (id, email, display_name, password_hash, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(display_name)
        .bind(&password_hash)
        .bind(is_staff)
        .bind(is_superuser)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("Email '{}' is already registered", email))
            } else {
                StoreError::Sqlx(e)
            }
        })?;

        Ok(row)
    }

    /// Check credentials and return the identity. Unknown email, wrong
    /// password and inactive account all produce the same error.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, StoreError> {
        let email = normalize_email(email);

        let identity = sqlx::query_as::<_, Identity>(
            "SELECT * FROM identities WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;

        let identity = identity.ok_or(StoreError::InvalidCredentials)?;

        if !identity.is_active || !verify_password(password, &identity.password_hash) {
            return Err(StoreError::InvalidCredentials);
        }

        Ok(identity)
    }

    /// Fetch an identity by id
    pub async fn get(&self, id: Uuid) -> Result<Identity, StoreError> {
        let identity = sqlx::query_as::<_, Identity>(
            "SELECT * FROM identities WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        identity.ok_or_else(|| StoreError::NotFound("Identity not found".to_string()))
    }

    /// Update own display name and/or password
    pub async fn update_profile(
        &self,
        id: Uuid,
        display_name: Option<&str>,
        password: Option<&str>,
    ) -> Result<Identity, StoreError> {
        let password_hash = match password {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let row = sqlx::query_as::<_, Identity>(
            r#"
            UPDATE identities
            SET display_name = COALESCE($2, display_name),
                password_hash = COALESCE($3, password_hash),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(display_name)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| StoreError::NotFound("Identity not found".to_string()))
    }

    /// Remove an identity and everything it owns in one transaction.
    /// Junction rows go first, then recipes and attributes, then the row
    /// itself, so no partially-deleted account is ever observable.
    pub async fn delete_identity(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM recipe_tags WHERE recipe_id IN (SELECT id FROM recipes WHERE owner_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM recipe_ingredients WHERE recipe_id IN (SELECT id FROM recipes WHERE owner_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM recipes WHERE owner_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM tags WHERE owner_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM ingredients WHERE owner_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM identities WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::NotFound("Identity not found".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Lowercase the domain part, leaving the local part untouched
fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn validate_email(email: &str) -> Result<(), StoreError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(StoreError::field("email", "This field may not be blank"));
    }

    let valid = match email.rsplit_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if !valid {
        return Err(StoreError::field("email", "Enter a valid email address"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), StoreError> {
    if password.is_empty() {
        return Err(StoreError::field("password", "This field may not be blank"));
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(StoreError::field(
            "password",
            "Password must be at least 8 characters",
        ));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}
