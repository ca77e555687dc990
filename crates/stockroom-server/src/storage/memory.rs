//! In-memory cache backend using DashMap (replaces Redis for simplicity)
//!
//! Hash entries plus a small search-index subsystem: named indexes over a
//! key prefix, queried with `*`, inclusive numeric ranges
//! (`@field:[min max]`) and case-insensitive text containment.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use stockroom_core::{CacheBackend, FieldKind, IndexSpec, Result, SearchReply, StockError};

pub struct MemoryStore {
    hashes: DashMap<String, HashMap<String, String>>,
    indexes: DashMap<String, IndexSpec>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            hashes: DashMap::new(),
            indexes: DashMap::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn hash_set(&self, key: &str, fields: HashMap<String, String>) -> Result<()> {
        self.hashes.insert(key.to_string(), fields);
        Ok(())
    }

    async fn hash_get(&self, key: &str) -> Result<Option<HashMap<String, String>>> {
        Ok(self.hashes.get(key).map(|entry| entry.value().clone()))
    }

    async fn delete_key(&self, key: &str) -> Result<()> {
        self.hashes.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .hashes
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<()> {
        if self.indexes.contains_key(&spec.name) {
            return Err(StockError::Index(format!(
                "index '{}' already exists",
                spec.name
            )));
        }
        self.indexes.insert(spec.name.clone(), spec.clone());
        Ok(())
    }

    async fn index_info(&self, name: &str) -> Result<IndexSpec> {
        self.indexes
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StockError::Index(format!("unknown index '{name}'")))
    }

    async fn drop_index(&self, name: &str) -> Result<()> {
        self.indexes
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StockError::Index(format!("unknown index '{name}'")))
    }

    async fn search(&self, name: &str, query: &str) -> Result<SearchReply> {
        let spec = self.index_info(name).await?;
        let clauses = parse_query(query, &spec)?;

        let mut docs: Vec<(String, HashMap<String, String>)> = self
            .hashes
            .iter()
            .filter(|entry| entry.key().starts_with(&spec.prefix))
            .filter(|entry| clauses.iter().all(|c| c.matches(entry.value(), &spec)))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        // Deterministic order: numeric key suffix where it parses, then raw key.
        docs.sort_by(|(a, _), (b, _)| {
            let na = a.strip_prefix(&spec.prefix).and_then(|s| s.parse::<i64>().ok());
            let nb = b.strip_prefix(&spec.prefix).and_then(|s| s.parse::<i64>().ok());
            na.cmp(&nb).then_with(|| a.cmp(b))
        });

        Ok(SearchReply {
            total: docs.len(),
            docs,
        })
    }
}

enum Clause {
    MatchAll,
    NumericRange {
        field: String,
        min: f64,
        max: f64,
    },
    TextMatch {
        /// `None` means any text field in the schema may match.
        field: Option<String>,
        term: String,
    },
}

impl Clause {
    fn matches(&self, fields: &HashMap<String, String>, spec: &IndexSpec) -> bool {
        match self {
            Clause::MatchAll => true,
            Clause::NumericRange { field, min, max } => fields
                .get(field)
                .and_then(|v| v.parse::<f64>().ok())
                .map(|v| *min <= v && v <= *max)
                .unwrap_or(false),
            Clause::TextMatch { field: Some(field), term } => fields
                .get(field)
                .map(|v| v.to_lowercase().contains(term))
                .unwrap_or(false),
            Clause::TextMatch { field: None, term } => spec
                .fields
                .iter()
                .filter(|f| f.kind == FieldKind::Text)
                .any(|f| {
                    fields
                        .get(&f.name)
                        .map(|v| v.to_lowercase().contains(term))
                        .unwrap_or(false)
                }),
        }
    }
}

/// Split a query into clause strings, keeping `[...]` groups intact so
/// `@id:[7 7]` survives whitespace splitting.
fn split_clauses(query: &str) -> Vec<String> {
    let mut clauses = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;

    for ch in query.chars() {
        match ch {
            '[' => {
                in_brackets = true;
                current.push(ch);
            }
            ']' => {
                in_brackets = false;
                current.push(ch);
            }
            c if c.is_whitespace() && !in_brackets => {
                if !current.is_empty() {
                    clauses.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        clauses.push(current);
    }
    clauses
}

fn parse_bound(raw: &str) -> Option<f64> {
    match raw {
        "-inf" => Some(f64::NEG_INFINITY),
        "inf" | "+inf" => Some(f64::INFINITY),
        other => other.parse().ok(),
    }
}

fn parse_query(query: &str, spec: &IndexSpec) -> Result<Vec<Clause>> {
    let query = query.trim();
    if query.is_empty() || query == "*" {
        return Ok(vec![Clause::MatchAll]);
    }

    let bad = |reason: String| StockError::Index(format!("invalid query '{query}': {reason}"));

    let mut clauses = Vec::new();
    for raw in split_clauses(query) {
        if let Some(rest) = raw.strip_prefix('@') {
            let (field, value) = rest
                .split_once(':')
                .ok_or_else(|| bad(format!("clause '{raw}' has no ':'")))?;
            let schema_field = spec
                .field(field)
                .ok_or_else(|| bad(format!("unknown field '{field}'")))?;

            if let Some(range) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
                if schema_field.kind != FieldKind::Numeric {
                    return Err(bad(format!("field '{field}' is not numeric")));
                }
                let mut bounds = range.split_whitespace();
                let min = bounds
                    .next()
                    .and_then(parse_bound)
                    .ok_or_else(|| bad(format!("bad lower bound in '{raw}'")))?;
                let max = bounds
                    .next()
                    .and_then(parse_bound)
                    .ok_or_else(|| bad(format!("bad upper bound in '{raw}'")))?;
                if bounds.next().is_some() {
                    return Err(bad(format!("too many bounds in '{raw}'")));
                }
                clauses.push(Clause::NumericRange {
                    field: field.to_string(),
                    min,
                    max,
                });
            } else {
                if schema_field.kind != FieldKind::Text {
                    return Err(bad(format!("field '{field}' is not text")));
                }
                clauses.push(Clause::TextMatch {
                    field: Some(field.to_string()),
                    term: value.to_lowercase(),
                });
            }
        } else {
            clauses.push(Clause::TextMatch {
                field: None,
                term: raw.to_lowercase(),
            });
        }
    }
    Ok(clauses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::IndexField;

    async fn store_with_index() -> MemoryStore {
        let store = MemoryStore::new();
        let spec = IndexSpec {
            name: "idx:test".to_string(),
            prefix: "products:".to_string(),
            fields: vec![
                IndexField::numeric("id"),
                IndexField::text("name"),
                IndexField::numeric("price"),
                IndexField::text("description"),
            ],
        };
        store.create_index(&spec).await.unwrap();
        store
    }

    fn entry(id: i64, name: &str, price: f64, description: &str) -> HashMap<String, String> {
        HashMap::from([
            ("id".to_string(), id.to_string()),
            ("name".to_string(), name.to_string()),
            ("price".to_string(), price.to_string()),
            ("description".to_string(), description.to_string()),
        ])
    }

    #[tokio::test]
    async fn hash_operations() {
        let store = MemoryStore::new();

        store
            .hash_set("products:1", entry(1, "Pen", 1.5, "blue pen"))
            .await
            .unwrap();
        let fields = store.hash_get("products:1").await.unwrap().unwrap();
        assert_eq!(fields.get("name").map(String::as_str), Some("Pen"));

        assert!(store.hash_get("products:2").await.unwrap().is_none());

        store.delete_key("products:1").await.unwrap();
        assert!(store.hash_get("products:1").await.unwrap().is_none());
        // Deleting an absent key is fine
        store.delete_key("products:1").await.unwrap();
    }

    #[tokio::test]
    async fn prefix_enumeration() {
        let store = MemoryStore::new();
        store
            .hash_set("products:1", entry(1, "Pen", 1.5, ""))
            .await
            .unwrap();
        store
            .hash_set("products:2", entry(2, "Chair", 49.99, ""))
            .await
            .unwrap();
        store
            .hash_set("orders:1", HashMap::new())
            .await
            .unwrap();

        let mut keys = store.keys_with_prefix("products:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["products:1", "products:2"]);
    }

    #[tokio::test]
    async fn index_lifecycle() {
        let store = store_with_index().await;

        let info = store.index_info("idx:test").await.unwrap();
        assert_eq!(info.prefix, "products:");
        assert_eq!(info.fields.len(), 4);

        // Duplicate creation fails
        assert!(store.create_index(&info).await.is_err());

        store.drop_index("idx:test").await.unwrap();
        assert!(store.index_info("idx:test").await.is_err());
        assert!(store.drop_index("idx:test").await.is_err());
    }

    #[tokio::test]
    async fn search_match_all_sorted_by_id() {
        let store = store_with_index().await;
        store
            .hash_set("products:10", entry(10, "Chair", 49.99, "oak chair"))
            .await
            .unwrap();
        store
            .hash_set("products:2", entry(2, "Pen", 1.5, "blue pen"))
            .await
            .unwrap();
        // Outside the prefix, must not appear
        store
            .hash_set("orders:1", HashMap::new())
            .await
            .unwrap();

        let reply = store.search("idx:test", "*").await.unwrap();
        assert_eq!(reply.total, 2);
        assert_eq!(reply.docs[0].0, "products:2");
        assert_eq!(reply.docs[1].0, "products:10");
    }

    #[tokio::test]
    async fn search_numeric_range_as_equality() {
        let store = store_with_index().await;
        store
            .hash_set("products:2", entry(2, "Pen", 1.5, "blue pen"))
            .await
            .unwrap();
        store
            .hash_set("products:3", entry(3, "Chair", 49.99, "oak chair"))
            .await
            .unwrap();

        let reply = store.search("idx:test", "@id:[2 2]").await.unwrap();
        assert_eq!(reply.total, 1);
        assert_eq!(reply.docs[0].0, "products:2");

        let none = store.search("idx:test", "@id:[99 99]").await.unwrap();
        assert_eq!(none.total, 0);
    }

    #[tokio::test]
    async fn search_open_ended_range_and_text() {
        let store = store_with_index().await;
        store
            .hash_set("products:2", entry(2, "Pen", 1.5, "blue pen"))
            .await
            .unwrap();
        store
            .hash_set("products:3", entry(3, "Chair", 49.99, "oak chair"))
            .await
            .unwrap();

        let cheap = store.search("idx:test", "@price:[-inf 10]").await.unwrap();
        assert_eq!(cheap.total, 1);
        assert_eq!(cheap.docs[0].0, "products:2");

        let named = store.search("idx:test", "@name:chair").await.unwrap();
        assert_eq!(named.total, 1);

        let bare = store.search("idx:test", "blue").await.unwrap();
        assert_eq!(bare.total, 1);
        assert_eq!(bare.docs[0].0, "products:2");
    }

    #[tokio::test]
    async fn search_rejects_bad_queries() {
        let store = store_with_index().await;
        assert!(store.search("idx:test", "@nope:[1 2]").await.is_err());
        assert!(store.search("idx:test", "@name:[1 2]").await.is_err());
        assert!(store.search("idx:test", "@id:[x y]").await.is_err());
        assert!(store.search("idx:missing", "*").await.is_err());
    }
}
