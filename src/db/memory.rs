//! In-process category store used when no database is configured.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;
use tracing::info;

use super::{Category, CategoryStore};
use crate::errors::{CategoryError, CategoryResult};

#[derive(Debug, Default)]
struct Rows {
    next_id: i64,
    by_id: BTreeMap<i64, Category>,
}

/// Category store kept in a `BTreeMap`, so iteration follows id order
#[derive(Debug, Default)]
pub struct InMemoryCategoryStore {
    rows: RwLock<Rows>,
}

impl InMemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryStore for InMemoryCategoryStore {
    async fn find_by_id(&self, id: i64) -> CategoryResult<Option<Category>> {
        Ok(self.rows.read().await.by_id.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> CategoryResult<Option<Category>> {
        let rows = self.rows.read().await;
        Ok(rows.by_id.values().find(|c| c.name == name).cloned())
    }

    async fn find_by_parent(&self, parent_id: Option<i64>) -> CategoryResult<Vec<Category>> {
        let rows = self.rows.read().await;
        Ok(rows
            .by_id
            .values()
            .filter(|c| c.parent_id == parent_id)
            .cloned()
            .collect())
    }

    async fn exists_by_name(&self, name: &str) -> CategoryResult<bool> {
        let rows = self.rows.read().await;
        Ok(rows.by_id.values().any(|c| c.name == name))
    }

    async fn save(&self, name: &str, parent_id: Option<i64>) -> CategoryResult<Category> {
        let mut rows = self.rows.write().await;

        // Mirrors the UNIQUE constraint of the SQL schema
        if rows.by_id.values().any(|c| c.name == name) {
            return Err(CategoryError::DuplicateName(name.to_string()));
        }
        if let Some(parent_id) = parent_id {
            if !rows.by_id.contains_key(&parent_id) {
                return Err(CategoryError::NotFound(parent_id));
            }
        }

        rows.next_id += 1;
        let category = Category {
            id: rows.next_id,
            name: name.to_string(),
            parent_id,
        };
        rows.by_id.insert(category.id, category.clone());

        info!(category_id = category.id, name = %category.name, parent_id = ?parent_id, "Category saved");
        Ok(category)
    }

    async fn delete_by_id(&self, id: i64) -> CategoryResult<u64> {
        let mut rows = self.rows.write().await;
        if !rows.by_id.contains_key(&id) {
            return Ok(0);
        }

        // Collect the subtree breadth-first; the visited set guards against bad links
        let mut doomed: HashSet<i64> = HashSet::from([id]);
        let mut frontier = vec![id];
        while let Some(current) = frontier.pop() {
            for child in rows.by_id.values() {
                if child.parent_id == Some(current) && doomed.insert(child.id) {
                    frontier.push(child.id);
                }
            }
        }

        rows.by_id.retain(|id, _| !doomed.contains(id));

        let removed = doomed.len() as u64;
        info!(category_id = id, removed, "Category subtree deleted");
        Ok(removed)
    }

    async fn list_all(&self) -> CategoryResult<Vec<Category>> {
        Ok(self.rows.read().await.by_id.values().cloned().collect())
    }
}
