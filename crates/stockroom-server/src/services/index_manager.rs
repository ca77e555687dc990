//! Search index lifecycle
//!
//! Exactly one logical index exists over the product mirror. `ensure_index`
//! settles it into the expected schema: a failed probe means absent and
//! triggers creation, a schema mismatch triggers drop-and-recreate, and in
//! every case leftover entries under the prefix are wiped so a following
//! repopulation starts from a clean slate.

use std::sync::Arc;
use stockroom_core::{CacheBackend, IndexField, IndexSpec, Result, KEY_PREFIX};
use tracing::{debug, warn};

/// Name of the product search index.
pub const INDEX_NAME: &str = "idx:products";

#[derive(Clone)]
pub struct IndexManager {
    cache: Arc<dyn CacheBackend>,
}

impl IndexManager {
    pub fn new(cache: Arc<dyn CacheBackend>) -> Self {
        Self { cache }
    }

    /// The fixed schema: id numeric, name text, price numeric,
    /// description text, bound to hash entries under `products:`.
    pub fn expected_spec() -> IndexSpec {
        IndexSpec {
            name: INDEX_NAME.to_string(),
            prefix: KEY_PREFIX.to_string(),
            fields: vec![
                IndexField::numeric("id"),
                IndexField::text("name"),
                IndexField::numeric("price"),
                IndexField::text("description"),
            ],
        }
    }

    /// Idempotent: a second call with no intervening writes only probes the
    /// existing index. Creation failure is fatal to the caller's pass.
    pub async fn ensure_index(&self) -> Result<()> {
        let expected = Self::expected_spec();

        match self.cache.index_info(INDEX_NAME).await {
            Ok(current) if current == expected => {
                debug!("Search index present and current");
            }
            Ok(_) => {
                warn!("Search index schema is stale, rebuilding");
                self.cache.drop_index(INDEX_NAME).await?;
                self.cache.create_index(&expected).await?;
            }
            Err(e) => {
                debug!("Search index probe failed ({e}), creating");
                self.cache.create_index(&expected).await?;
            }
        }

        // Wipe-before-repopulate: entries from a previous, possibly
        // inconsistent population must not survive into the next one.
        for key in self.cache.keys_with_prefix(KEY_PREFIX).await? {
            self.cache.delete_key(&key).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::collections::HashMap;

    #[tokio::test]
    async fn ensure_index_is_idempotent() {
        let cache: Arc<dyn CacheBackend> = Arc::new(MemoryStore::new());
        let manager = IndexManager::new(cache.clone());

        manager.ensure_index().await.unwrap();
        let first = cache.index_info(INDEX_NAME).await.unwrap();

        manager.ensure_index().await.unwrap();
        let second = cache.index_info(INDEX_NAME).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second, IndexManager::expected_spec());
    }

    #[tokio::test]
    async fn ensure_index_rebuilds_stale_schema() {
        let cache: Arc<dyn CacheBackend> = Arc::new(MemoryStore::new());
        let stale = IndexSpec {
            name: INDEX_NAME.to_string(),
            prefix: KEY_PREFIX.to_string(),
            fields: vec![IndexField::numeric("id")],
        };
        cache.create_index(&stale).await.unwrap();

        IndexManager::new(cache.clone()).ensure_index().await.unwrap();
        let current = cache.index_info(INDEX_NAME).await.unwrap();
        assert_eq!(current, IndexManager::expected_spec());
    }

    #[tokio::test]
    async fn ensure_index_wipes_leftover_entries() {
        let cache: Arc<dyn CacheBackend> = Arc::new(MemoryStore::new());
        cache
            .hash_set("products:99", HashMap::new())
            .await
            .unwrap();
        cache
            .hash_set("orders:1", HashMap::new())
            .await
            .unwrap();

        IndexManager::new(cache.clone()).ensure_index().await.unwrap();

        assert!(cache.hash_get("products:99").await.unwrap().is_none());
        // Keys outside the prefix are untouched
        assert!(cache.hash_get("orders:1").await.unwrap().is_some());
    }
}
