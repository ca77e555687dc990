//! Reconciliation
//!
//! Rebuilds the cache mirror and its index from the authoritative table.
//! Runs once at service start, before the listener binds; mutations after
//! that use incremental write-through, never a full pass. Per-record mirror
//! failures are collected and reported as a partial result rather than
//! aborting the remaining records or passing silently.

use crate::services::{IndexManager, ProductMirror};
use crate::storage::Database;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use stockroom_core::{
    CacheBackend, CachedProduct, RecordFailure, Result, StockError,
};
use tracing::info;

/// Upper bound on concurrently in-flight mirror writes during a pass.
const RECONCILE_FANOUT: usize = 8;

pub struct Synchronizer {
    db: Arc<Database>,
    cache: Arc<dyn CacheBackend>,
    index: IndexManager,
    mirror: ProductMirror,
}

impl Synchronizer {
    pub fn new(
        db: Arc<Database>,
        cache: Arc<dyn CacheBackend>,
        index: IndexManager,
        mirror: ProductMirror,
    ) -> Self {
        Self {
            db,
            cache,
            index,
            mirror,
        }
    }

    /// Run one reconciliation pass and return the number of mirrored
    /// products. Store and index errors abort the pass; mirror-write
    /// failures accumulate into `ReconciliationPartial`.
    pub async fn reconcile(&self) -> Result<usize> {
        self.cache
            .ping()
            .await
            .map_err(|e| StockError::CacheUnavailable(e.to_string()))?;

        self.index.ensure_index().await?;

        let products = self.db.list_products().await?;
        let total = products.len();
        info!("Reconciling {total} products into the cache mirror");

        let results: Vec<std::result::Result<(), RecordFailure>> =
            stream::iter(products.into_iter().map(|product| {
                let mirror = self.mirror.clone();
                async move {
                    let id = product.id;
                    mirror
                        .put(&CachedProduct::project(&product))
                        .await
                        .map_err(|e| RecordFailure {
                            id,
                            reason: e.to_string(),
                        })
                }
            }))
            .buffer_unordered(RECONCILE_FANOUT)
            .collect()
            .await;

        let failures: Vec<RecordFailure> =
            results.into_iter().filter_map(|r| r.err()).collect();

        if failures.is_empty() {
            info!("Reconciliation complete: {total} products mirrored");
            Ok(total)
        } else {
            Err(StockError::ReconciliationPartial {
                synced: total - failures.len(),
                failures,
            })
        }
    }
}
