pub mod attribute_service;
pub mod identity_service;
pub mod recipe_service;

pub use attribute_service::AttributeService;
pub use identity_service::IdentityService;
pub use recipe_service::RecipeService;

use std::collections::HashMap;
use thiserror::Error;

use crate::database::manager::DatabaseError;

/// Errors surfaced by the stores. Terminal for the operation; the transport
/// layer maps them to structured status + message.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed")]
    Validation(HashMap<String, String>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Database(DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    /// Single-field validation failure
    pub fn field(field: &str, message: &str) -> Self {
        let mut errors = HashMap::new();
        errors.insert(field.to_string(), message.to_string());
        StoreError::Validation(errors)
    }
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => StoreError::NotFound(msg),
            other => StoreError::Database(other),
        }
    }
}

/// True when the underlying driver reports a unique-constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_builds_single_entry_map() {
        let err = StoreError::field("name", "This field may not be blank");
        match err {
            StoreError::Validation(map) => {
                assert_eq!(map.len(), 1);
                assert_eq!(map["name"], "This field may not be blank");
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn database_not_found_becomes_store_not_found() {
        let err: StoreError = DatabaseError::NotFound("Tag not found".to_string()).into();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
