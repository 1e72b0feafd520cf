//! # Error Types Module
//!
//! Errors raised by the category store and service. Validation variants are
//! shown to the user as plain-text replies; `Database` is reported with a
//! generic failure message and logged.

use thiserror::Error;

/// Maximum category name length in characters (matches the `VARCHAR(255)` column)
pub const MAX_NAME_LENGTH: usize = 255;

/// Errors for category operations
#[derive(Debug, Error)]
pub enum CategoryError {
    /// Name was empty after trimming
    #[error("Category name is empty")]
    EmptyName,
    /// Name exceeds the maximum length
    #[error("Category name is longer than {max} characters")]
    NameTooLong { max: usize },
    /// A category with this name already exists somewhere in the tree
    #[error("Category '{0}' already exists")]
    DuplicateName(String),
    /// Parent category lookup by name failed
    #[error("Parent category '{0}' not found")]
    ParentNotFound(String),
    /// Category lookup by id failed
    #[error("Category with id {0} not found")]
    NotFound(i64),
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CategoryError {
    /// Whether the error comes from user input rather than from the store
    pub fn is_validation(&self) -> bool {
        !matches!(self, CategoryError::Database(_))
    }

    /// Localization key and arguments describing this error to the user
    pub fn message_key(&self) -> (&'static str, Vec<(&'static str, String)>) {
        match self {
            CategoryError::EmptyName => ("error-empty-name", Vec::new()),
            CategoryError::NameTooLong { max } => {
                ("error-name-too-long", vec![("max", max.to_string())])
            }
            CategoryError::DuplicateName(name) => {
                ("error-duplicate-name", vec![("name", name.clone())])
            }
            CategoryError::ParentNotFound(name) => {
                ("error-parent-not-found", vec![("name", name.clone())])
            }
            CategoryError::NotFound(id) => ("error-category-not-found", vec![("id", id.to_string())]),
            CategoryError::Database(_) => ("error-generic", Vec::new()),
        }
    }
}

/// Result alias for category operations
pub type CategoryResult<T> = std::result::Result<T, CategoryError>;
