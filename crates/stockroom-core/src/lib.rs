//! Stockroom Core Library
//!
//! Domain types, error taxonomy, and the cache-backend port for the
//! Stockroom inventory service. No runtime dependencies live here; the
//! server crate plugs concrete storage implementations into these seams.

pub mod error;
pub mod ports;
pub mod product;

pub use error::{RecordFailure, Result, StockError};
pub use ports::{CacheBackend, FieldKind, IndexField, IndexSpec, SearchReply};
pub use product::{
    parse_product_key, product_key, CachedProduct, Product, ProductInput, KEY_PREFIX,
    PROJECTION_VERSION,
};
