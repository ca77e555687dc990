//! Product cache mirror
//!
//! Per-record key/value entries under `products:<id>`. Each write or delete
//! targets exactly one key, so a reader observes either the pre-write or the
//! post-write entry, never a torn record. Errors carry the affected id so a
//! failure during reconciliation is attributable to a specific record.

use std::collections::HashMap;
use std::sync::Arc;
use stockroom_core::{product_key, CacheBackend, CachedProduct, Result, StockError};
use tracing::debug;

#[derive(Clone)]
pub struct ProductMirror {
    cache: Arc<dyn CacheBackend>,
}

impl ProductMirror {
    pub fn new(cache: Arc<dyn CacheBackend>) -> Self {
        Self { cache }
    }

    /// Overwrite the mirror entry for a product with its full field set.
    pub async fn put(&self, product: &CachedProduct) -> Result<()> {
        let key = product_key(product.id);
        debug!("Mirroring product {} into {key}", product.id);

        self.cache
            .hash_set(&key, product.to_fields())
            .await
            .map_err(|e| StockError::MirrorWrite {
                id: product.id,
                reason: e.to_string(),
            })
    }

    /// Remove the mirror entry for an id. Removing an absent entry is fine.
    pub async fn delete(&self, id: i64) -> Result<()> {
        debug!("Removing mirror entry for product {id}");

        self.cache
            .delete_key(&product_key(id))
            .await
            .map_err(|e| StockError::MirrorDelete {
                id,
                reason: e.to_string(),
            })
    }

    /// Raw field map for an id, if mirrored.
    pub async fn get_raw(&self, id: i64) -> Result<Option<HashMap<String, String>>> {
        self.cache
            .hash_get(&product_key(id))
            .await
            .map_err(|e| StockError::MirrorRead {
                id,
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use stockroom_core::Product;

    fn chair() -> CachedProduct {
        CachedProduct::project(&Product {
            id: 7,
            name: "Chair".to_string(),
            price: 49.99,
            description: "oak chair".to_string(),
        })
    }

    #[tokio::test]
    async fn put_then_get_raw_round_trips() {
        let mirror = ProductMirror::new(Arc::new(MemoryStore::new()));
        let cached = chair();

        mirror.put(&cached).await.unwrap();
        let fields = mirror.get_raw(7).await.unwrap().unwrap();
        assert_eq!(CachedProduct::from_fields(7, &fields).unwrap(), cached);
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let mirror = ProductMirror::new(Arc::new(MemoryStore::new()));
        mirror.put(&chair()).await.unwrap();

        mirror.delete(7).await.unwrap();
        assert!(mirror.get_raw(7).await.unwrap().is_none());
        // Absent entry, still no error
        mirror.delete(7).await.unwrap();
    }
}
