use std::collections::HashMap;
use thiserror::Error;

/// Errors from a `CharacterStore`
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("Character with name '{0}' already exists")]
    Duplicate(String),

    #[error("Character {0} not found")]
    NotFound(i32),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Character file is corrupt: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn validation(message: impl Into<String>, field_errors: HashMap<String, String>) -> Self {
        StoreError::Validation { message: message.into(), field_errors }
    }

    /// Validation failure on a single field
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), message.into());
        StoreError::validation("Validation error", field_errors)
    }
}
