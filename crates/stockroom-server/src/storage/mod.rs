//! Storage layer
//!
//! SQLite (embedded, via sqlx) is the authoritative record store; a
//! DashMap-backed in-memory store provides the cache mirror and its
//! search index behind the `CacheBackend` port.

pub mod db;
pub mod memory;

pub use db::Database;
pub use memory::MemoryStore;
