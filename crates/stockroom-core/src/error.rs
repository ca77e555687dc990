//! Error types for Stockroom

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StockError>;

/// A single record that could not be projected during a reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFailure {
    pub id: i64,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum StockError {
    #[error("store error: {0}")]
    Store(String),

    #[error("cache backend unreachable: {0}")]
    CacheUnavailable(String),

    #[error("cache projection failed for product {id}: {reason}")]
    MirrorWrite { id: i64, reason: String },

    #[error("cache entry removal failed for product {id}: {reason}")]
    MirrorDelete { id: i64, reason: String },

    #[error("cache entry for product {id} is malformed: {reason}")]
    MirrorRead { id: i64, reason: String },

    #[error("index error: {0}")]
    Index(String),

    #[error("product not found: {0}")]
    NotFound(i64),

    #[error("reconciliation synced {synced} products but {} failed", .failures.len())]
    ReconciliationPartial {
        synced: usize,
        failures: Vec<RecordFailure>,
    },
}

impl StockError {
    /// True when the error means "the requested row does not exist",
    /// as opposed to an I/O or consistency failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StockError::NotFound(_))
    }
}
