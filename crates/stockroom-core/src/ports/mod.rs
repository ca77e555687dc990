//! Port traits (interfaces) for dependency injection

pub mod cache;

pub use cache::{CacheBackend, FieldKind, IndexField, IndexSpec, SearchReply};
