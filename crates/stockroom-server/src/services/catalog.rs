//! Catalog service
//!
//! Authoritative reads plus write-through mutations: every create, update,
//! or delete hits the record store first and is immediately followed by the
//! matching single-key mirror operation. The two stores are not
//! transactional; when a mirror write fails after the row committed, the
//! error still propagates (the row stays committed) and the resulting
//! staleness heals on the next reconciliation. Concurrent mutations of the
//! same id are not serialized here, so last writer wins.

use crate::services::ProductMirror;
use crate::storage::Database;
use std::sync::Arc;
use stockroom_core::{CachedProduct, Product, ProductInput, Result, StockError};
use tracing::info;

pub struct CatalogService {
    db: Arc<Database>,
    mirror: ProductMirror,
}

impl CatalogService {
    pub fn new(db: Arc<Database>, mirror: ProductMirror) -> Self {
        Self { db, mirror }
    }

    pub async fn list_all(&self) -> Result<Vec<Product>> {
        self.db.list_products().await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Product>> {
        self.db.get_product(id).await
    }

    /// Insert a product and project it into the mirror. Returns the stored
    /// row with its server-assigned id.
    pub async fn create(&self, input: &ProductInput) -> Result<Product> {
        let product = self.db.insert_product(input).await?;
        info!("Created product {} ({})", product.id, product.name);

        self.mirror.put(&CachedProduct::project(&product)).await?;
        Ok(product)
    }

    /// Update a product and re-project it. `NotFound` when no row has the
    /// given id; nothing is mutated in that case.
    pub async fn update(&self, product: &Product) -> Result<Product> {
        let stored = self
            .db
            .update_product(product)
            .await?
            .ok_or(StockError::NotFound(product.id))?;
        info!("Updated product {}", stored.id);

        self.mirror.put(&CachedProduct::project(&stored)).await?;
        Ok(stored)
    }

    /// Delete a product and its mirror entry. `NotFound` when zero rows
    /// were affected.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let affected = self.db.delete_product(id).await?;
        if affected == 0 {
            return Err(StockError::NotFound(id));
        }
        info!("Deleted product {id}");

        self.mirror.delete(id).await?;
        Ok(())
    }
}
