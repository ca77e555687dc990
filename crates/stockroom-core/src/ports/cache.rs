//! Cache backend port
//!
//! The server talks to its key/value + search store exclusively through this
//! trait: hash-shaped entries, key-prefix enumeration, and a named search
//! index supporting create/info/drop/search. The in-memory backend implements
//! it for production and tests alike; a Redis-backed implementation would
//! slot in behind the same seam.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of an indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Numeric,
    Text,
}

/// One field of an index schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexField {
    pub name: String,
    pub kind: FieldKind,
}

impl IndexField {
    pub fn numeric(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Numeric,
        }
    }

    pub fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Text,
        }
    }
}

/// Schema of a search index over hash entries under a key prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub prefix: String,
    pub fields: Vec<IndexField>,
}

impl IndexSpec {
    /// Look up a schema field by name.
    pub fn field(&self, name: &str) -> Option<&IndexField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Result of a search query: total hit count plus the matching documents
/// as (key, field map) pairs.
#[derive(Debug, Clone, Default)]
pub struct SearchReply {
    pub total: usize,
    pub docs: Vec<(String, HashMap<String, String>)>,
}

/// Key/value hash store with a search-index subsystem.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Cheap reachability probe. A backend that cannot answer this must
    /// never be treated as synchronized.
    async fn ping(&self) -> Result<()>;

    /// Overwrite all fields of the hash entry at `key`.
    async fn hash_set(&self, key: &str, fields: HashMap<String, String>) -> Result<()>;

    /// Read the hash entry at `key`, if present.
    async fn hash_get(&self, key: &str) -> Result<Option<HashMap<String, String>>>;

    /// Remove the entry at `key`. Removing an absent key is not an error.
    async fn delete_key(&self, key: &str) -> Result<()>;

    /// Enumerate all keys starting with `prefix`.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Create a named index. Fails if an index with that name already exists.
    async fn create_index(&self, spec: &IndexSpec) -> Result<()>;

    /// Return the schema of a named index; errs if the index does not exist.
    async fn index_info(&self, name: &str) -> Result<IndexSpec>;

    /// Destroy a named index (its entries survive).
    async fn drop_index(&self, name: &str) -> Result<()>;

    /// Run a query against a named index. Supported syntax: `*` matches
    /// everything; `@field:[min max]` is an inclusive numeric range
    /// (`-inf`/`+inf` bounds allowed); `@field:term` and bare `term` match
    /// text fields by case-insensitive containment. Clauses are conjunctive.
    async fn search(&self, name: &str, query: &str) -> Result<SearchReply>;
}
