//! # Database Module
//!
//! Category persistence. The rest of the bot talks to the [`CategoryStore`]
//! trait; [`PgCategoryStore`] backs it with PostgreSQL and
//! [`memory::InMemoryCategoryStore`] keeps everything in process memory.
//!
//! Children are never stored on the parent. They are found by querying for
//! rows whose `parent_id` points at the parent.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use crate::errors::{CategoryError, CategoryResult};

pub mod memory;

pub use memory::InMemoryCategoryStore;

/// A node of the category tree
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// `None` for root categories
    pub parent_id: Option<i64>,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Key-value style category storage with parent links
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> CategoryResult<Option<Category>>;

    /// Exact, case-sensitive name lookup
    async fn find_by_name(&self, name: &str) -> CategoryResult<Option<Category>>;

    /// Direct children of `parent_id`, or the roots when `None`, in id order
    async fn find_by_parent(&self, parent_id: Option<i64>) -> CategoryResult<Vec<Category>>;

    async fn exists_by_name(&self, name: &str) -> CategoryResult<bool>;

    /// Insert a new category and return it with its assigned id
    async fn save(&self, name: &str, parent_id: Option<i64>) -> CategoryResult<Category>;

    /// Delete a category and all of its descendants, returning the number of removed rows
    async fn delete_by_id(&self, id: i64) -> CategoryResult<u64>;

    /// Every category in ascending id order
    async fn list_all(&self) -> CategoryResult<Vec<Category>>;
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> CategoryResult<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS categories (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            parent_id BIGINT REFERENCES categories(id) ON DELETE CASCADE
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS categories_parent_id_idx ON categories(parent_id)")
        .execute(pool)
        .await?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// PostgreSQL-backed category store
#[derive(Clone)]
pub struct PgCategoryStore {
    pool: PgPool,
}

impl PgCategoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect, create the schema if needed and return the store
    pub async fn connect(database_url: &str, max_connections: u32) -> CategoryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        init_database_schema(&pool).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl CategoryStore for PgCategoryStore {
    async fn find_by_id(&self, id: i64) -> CategoryResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, parent_id FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn find_by_name(&self, name: &str) -> CategoryResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, parent_id FROM categories WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn find_by_parent(&self, parent_id: Option<i64>) -> CategoryResult<Vec<Category>> {
        let categories = match parent_id {
            Some(parent_id) => {
                sqlx::query_as::<_, Category>(
                    "SELECT id, name, parent_id FROM categories WHERE parent_id = $1 ORDER BY id",
                )
                .bind(parent_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Category>(
                    "SELECT id, name, parent_id FROM categories WHERE parent_id IS NULL ORDER BY id",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(categories)
    }

    async fn exists_by_name(&self, name: &str) -> CategoryResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn save(&self, name: &str, parent_id: Option<i64>) -> CategoryResult<Category> {
        let result = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, parent_id) VALUES ($1, $2) RETURNING id, name, parent_id",
        )
        .bind(name)
        .bind(parent_id)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(category) => {
                info!(category_id = category.id, name = %category.name, parent_id = ?parent_id, "Category saved");
                Ok(category)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(CategoryError::DuplicateName(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_by_id(&self, id: i64) -> CategoryResult<u64> {
        let result = sqlx::query(
            "WITH RECURSIVE subtree AS (
                SELECT id FROM categories WHERE id = $1
                UNION ALL
                SELECT c.id FROM categories c JOIN subtree s ON c.parent_id = s.id
            )
            DELETE FROM categories WHERE id IN (SELECT id FROM subtree)",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        let removed = result.rows_affected();
        info!(category_id = id, removed, "Category subtree deleted");
        Ok(removed)
    }

    async fn list_all(&self) -> CategoryResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name, parent_id FROM categories ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        debug!(count = categories.len(), "Listed categories");
        Ok(categories)
    }
}
