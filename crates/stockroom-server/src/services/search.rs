//! Query façade over the cache mirror
//!
//! Reads go to the search index, never the relational store. Lookups by id
//! are expressed as a numeric range with identical bounds because the index
//! exposes numeric fields through range queries rather than equality; see
//! `find_by_id`.

use crate::services::index_manager::INDEX_NAME;
use serde::Serialize;
use std::sync::Arc;
use stockroom_core::{parse_product_key, CacheBackend, CachedProduct, Result, StockError};

/// Query result: hit count plus the decoded entries. A zero `total` is a
/// valid empty outcome, distinct from a raised search error.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub total: usize,
    pub items: Vec<CachedProduct>,
}

#[derive(Clone)]
pub struct SearchService {
    cache: Arc<dyn CacheBackend>,
}

impl SearchService {
    pub fn new(cache: Arc<dyn CacheBackend>) -> Self {
        Self { cache }
    }

    /// All mirrored products, in id order.
    pub async fn find_all(&self) -> Result<SearchOutcome> {
        self.run("*").await
    }

    /// Zero or one product. The range `[id id]` is an equality match in
    /// range clothing; a backend with native numeric equality could use
    /// that instead.
    pub async fn find_by_id(&self, id: i64) -> Result<SearchOutcome> {
        self.run(&format!("@id:[{id} {id}]")).await
    }

    async fn run(&self, query: &str) -> Result<SearchOutcome> {
        let reply = self.cache.search(INDEX_NAME, query).await?;

        let mut items = Vec::with_capacity(reply.docs.len());
        for (key, fields) in reply.docs {
            let id = parse_product_key(&key).ok_or_else(|| {
                StockError::Index(format!("unexpected key in search result: {key}"))
            })?;
            items.push(CachedProduct::from_fields(id, &fields)?);
        }

        Ok(SearchOutcome {
            total: reply.total,
            items,
        })
    }
}
