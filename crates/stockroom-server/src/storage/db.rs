//! SQLite record store (embedded, no external dependencies)
//!
//! The authoritative products table. Every write is followed by a read-back
//! of the affected row so callers always observe the canonical stored
//! values. No retries happen here; retry policy belongs to the caller.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::sync::Arc;
use stockroom_core::{Product, ProductInput, Result, StockError};

pub struct Database {
    pool: Arc<SqlitePool>,
}

fn store_err(e: sqlx::Error) -> StockError {
    StockError::Store(e.to_string())
}

impl Database {
    pub async fn new(database_path: &str) -> Result<Self> {
        tracing::info!("Opening SQLite database at: {}", database_path);

        if let Some(parent) = std::path::Path::new(database_path).parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StockError::Store(format!(
                    "failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(store_err)?;

        Self::run_migrations(&pool).await?;

        tracing::info!("Database initialization complete");

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Ephemeral single-connection database for tests and demo runs. The
    /// pool is pinned to one connection that never expires, because each
    /// SQLite `:memory:` connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::new())
            .await
            .map_err(store_err)?;

        Self::run_migrations(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                price REAL NOT NULL,
                description TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, price, description FROM products ORDER BY id
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub async fn get_product(&self, id: i64) -> Result<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, price, description FROM products WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(|r| r.into()))
    }

    /// Insert a product and return the stored row, id assigned.
    pub async fn insert_product(&self, input: &ProductInput) -> Result<Product> {
        let res = sqlx::query(
            r#"
            INSERT INTO products (name, price, description) VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&input.name)
        .bind(input.price)
        .bind(&input.description)
        .execute(&*self.pool)
        .await
        .map_err(store_err)?;

        let id = res.last_insert_rowid();
        self.get_product(id).await?.ok_or_else(|| {
            StockError::Store(format!("inserted product {id} vanished before read-back"))
        })
    }

    /// Update a product; `None` when no row has that id.
    pub async fn update_product(&self, product: &Product) -> Result<Option<Product>> {
        let res = sqlx::query(
            r#"
            UPDATE products SET name = ?1, price = ?2, description = ?3 WHERE id = ?4
            "#,
        )
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.description)
        .bind(product.id)
        .execute(&*self.pool)
        .await
        .map_err(store_err)?;

        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_product(product.id).await
    }

    /// Delete a product, returning the affected row count.
    pub async fn delete_product(&self, id: i64) -> Result<u64> {
        let res = sqlx::query(
            r#"
            DELETE FROM products WHERE id = ?1
            "#,
        )
        .bind(id)
        .execute(&*self.pool)
        .await
        .map_err(store_err)?;

        Ok(res.rows_affected())
    }
}

// Helper struct for sqlx query_as
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: f64,
    description: String,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: r.id,
            name: r.name,
            price: r.price,
            description: r.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pen() -> ProductInput {
        ProductInput {
            name: "Pen".to_string(),
            price: 1.5,
            description: "blue pen".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_reads_back_canonical_row() {
        let db = Database::in_memory().await.unwrap();

        let stored = db.insert_product(&pen()).await.unwrap();
        assert!(stored.id > 0);
        assert_eq!(stored.name, "Pen");
        assert_eq!(stored.price, 1.5);
        assert_eq!(stored.description, "blue pen");

        let fetched = db.get_product(stored.id).await.unwrap().unwrap();
        assert_eq!(fetched, stored);
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_none_and_mutates_nothing() {
        let db = Database::in_memory().await.unwrap();
        let stored = db.insert_product(&pen()).await.unwrap();

        let ghost = Product {
            id: stored.id + 100,
            name: "Ghost".to_string(),
            price: 0.0,
            description: String::new(),
        };
        assert!(db.update_product(&ghost).await.unwrap().is_none());

        let still = db.get_product(stored.id).await.unwrap().unwrap();
        assert_eq!(still, stored);
    }

    #[tokio::test]
    async fn delete_reports_affected_rows() {
        let db = Database::in_memory().await.unwrap();
        let stored = db.insert_product(&pen()).await.unwrap();

        assert_eq!(db.delete_product(stored.id).await.unwrap(), 1);
        assert_eq!(db.delete_product(stored.id).await.unwrap(), 0);
        assert!(db.get_product(stored.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_returns_rows_in_id_order() {
        let db = Database::in_memory().await.unwrap();
        db.insert_product(&pen()).await.unwrap();
        db.insert_product(&ProductInput {
            name: "Chair".to_string(),
            price: 49.99,
            description: "oak chair".to_string(),
        })
        .await
        .unwrap();

        let all = db.list_products().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].id < all[1].id);
    }
}
