//! # Category Service Module
//!
//! Business rules on top of a [`CategoryStore`]: name validation, global
//! name uniqueness, parent resolution by name and cascading deletion.

use std::sync::Arc;
use tracing::{debug, info};

use crate::db::{Category, CategoryStore};
use crate::errors::{CategoryError, CategoryResult, MAX_NAME_LENGTH};

/// Validates a category name input, returning the trimmed name
pub fn validate_category_name(name: &str) -> CategoryResult<String> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(CategoryError::EmptyName);
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(CategoryError::NameTooLong {
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(trimmed.to_string())
}

/// Shared handle to the category store with validation
#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn CategoryStore>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn CategoryStore>) -> Self {
        Self { store }
    }

    /// Create a category without a parent
    pub async fn create_root(&self, name: &str) -> CategoryResult<Category> {
        let name = validate_category_name(name)?;
        if self.store.exists_by_name(&name).await? {
            return Err(CategoryError::DuplicateName(name));
        }
        let category = self.store.save(&name, None).await?;
        info!(category_id = category.id, name = %category.name, "Root category created");
        Ok(category)
    }

    /// Create a category under the parent with the given name
    ///
    /// Uniqueness is checked against the whole store, not only the siblings.
    pub async fn create_child(&self, parent_name: &str, child_name: &str) -> CategoryResult<Category> {
        let parent_name = parent_name.trim();
        let parent = self
            .store
            .find_by_name(parent_name)
            .await?
            .ok_or_else(|| CategoryError::ParentNotFound(parent_name.to_string()))?;

        let child_name = validate_category_name(child_name)?;
        if self.store.exists_by_name(&child_name).await? {
            return Err(CategoryError::DuplicateName(child_name));
        }

        let child = self.store.save(&child_name, Some(parent.id)).await?;
        info!(
            category_id = child.id,
            name = %child.name,
            parent = %parent.name,
            "Child category created"
        );
        Ok(child)
    }

    /// Return the category with this name, creating it as a root when missing.
    /// The flag is `true` when the category was created.
    pub async fn find_or_create_root(&self, name: &str) -> CategoryResult<(Category, bool)> {
        let name = validate_category_name(name)?;
        if let Some(existing) = self.store.find_by_name(&name).await? {
            return Ok((existing, false));
        }
        let category = self.store.save(&name, None).await?;
        info!(category_id = category.id, name = %category.name, "Root category created");
        Ok((category, true))
    }

    /// Delete a category with all its descendants.
    /// Returns the deleted category and the number of removed rows.
    pub async fn delete(&self, id: i64) -> CategoryResult<(Category, u64)> {
        let category = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(CategoryError::NotFound(id))?;
        let removed = self.store.delete_by_id(id).await?;
        info!(category_id = id, name = %category.name, removed, "Category deleted");
        Ok((category, removed))
    }

    pub async fn get(&self, id: i64) -> CategoryResult<Option<Category>> {
        self.store.find_by_id(id).await
    }

    pub async fn find_by_name(&self, name: &str) -> CategoryResult<Option<Category>> {
        self.store.find_by_name(name).await
    }

    pub async fn exists_by_name(&self, name: &str) -> CategoryResult<bool> {
        self.store.exists_by_name(name).await
    }

    /// Root categories in store iteration order
    pub async fn roots(&self) -> CategoryResult<Vec<Category>> {
        self.store.find_by_parent(None).await
    }

    pub async fn children(&self, parent_id: i64) -> CategoryResult<Vec<Category>> {
        let children = self.store.find_by_parent(Some(parent_id)).await?;
        debug!(parent_id, count = children.len(), "Loaded child categories");
        Ok(children)
    }

    pub async fn all(&self) -> CategoryResult<Vec<Category>> {
        self.store.list_all().await
    }
}
