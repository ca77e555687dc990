//! Product types and the cache projection
//!
//! `Product` is the authoritative row shape; `CachedProduct` is its
//! versioned projection into the cache mirror. The projection is explicit
//! and validated in both directions so a schema mismatch surfaces as an
//! error instead of a silent field drop.

use crate::{Result, StockError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key prefix for mirror entries; `products:<id>` maps back to the row id.
pub const KEY_PREFIX: &str = "products:";

/// Version stamp written into every mirror entry. Bump when the projected
/// field set changes so stale entries are rejected at read time.
pub const PROJECTION_VERSION: &str = "1";

/// Authoritative product record, owned by the relational store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub description: String,
}

/// Insert payload; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub price: f64,
    pub description: String,
}

/// Flattened mirror entry stored under `products:<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedProduct {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub description: String,
}

/// Cache key for a product id.
pub fn product_key(id: i64) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// Inverse of [`product_key`]; `None` for keys outside the product prefix.
pub fn parse_product_key(key: &str) -> Option<i64> {
    key.strip_prefix(KEY_PREFIX)?.parse().ok()
}

impl CachedProduct {
    /// Project an authoritative row into its mirror shape.
    pub fn project(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            description: product.description.clone(),
        }
    }

    /// Flatten into the field map written to the cache.
    pub fn to_fields(&self) -> HashMap<String, String> {
        HashMap::from([
            ("_v".to_string(), PROJECTION_VERSION.to_string()),
            ("id".to_string(), self.id.to_string()),
            ("name".to_string(), self.name.clone()),
            ("price".to_string(), self.price.to_string()),
            ("description".to_string(), self.description.clone()),
        ])
    }

    /// Rebuild from a raw field map read back from the cache. `id` is the id
    /// parsed from the entry's key; the entry must agree with it.
    pub fn from_fields(id: i64, fields: &HashMap<String, String>) -> Result<Self> {
        let get = |name: &str| {
            fields.get(name).ok_or_else(|| StockError::MirrorRead {
                id,
                reason: format!("missing field '{name}'"),
            })
        };

        let version = get("_v")?;
        if version != PROJECTION_VERSION {
            return Err(StockError::MirrorRead {
                id,
                reason: format!("projection version '{version}' is not '{PROJECTION_VERSION}'"),
            });
        }

        let field_id: i64 = get("id")?.parse().map_err(|_| StockError::MirrorRead {
            id,
            reason: "field 'id' is not an integer".to_string(),
        })?;
        if field_id != id {
            return Err(StockError::MirrorRead {
                id,
                reason: format!("entry id {field_id} does not match key id {id}"),
            });
        }

        let price: f64 = get("price")?.parse().map_err(|_| StockError::MirrorRead {
            id,
            reason: "field 'price' is not a number".to_string(),
        })?;

        Ok(Self {
            id,
            name: get("name")?.clone(),
            price,
            description: get("description")?.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Product {
        Product {
            id: 7,
            name: "Chair".to_string(),
            price: 49.99,
            description: "oak chair".to_string(),
        }
    }

    #[test]
    fn key_round_trip() {
        assert_eq!(product_key(7), "products:7");
        assert_eq!(parse_product_key("products:7"), Some(7));
        assert_eq!(parse_product_key("orders:7"), None);
        assert_eq!(parse_product_key("products:abc"), None);
    }

    #[test]
    fn projection_round_trip() {
        let cached = CachedProduct::project(&sample());
        let fields = cached.to_fields();
        assert_eq!(fields.get("_v").map(String::as_str), Some("1"));

        let back = CachedProduct::from_fields(7, &fields).unwrap();
        assert_eq!(back, cached);
    }

    #[test]
    fn from_fields_rejects_missing_field() {
        let mut fields = CachedProduct::project(&sample()).to_fields();
        fields.remove("price");
        let err = CachedProduct::from_fields(7, &fields).unwrap_err();
        assert!(matches!(err, StockError::MirrorRead { id: 7, .. }));
    }

    #[test]
    fn from_fields_rejects_wrong_version() {
        let mut fields = CachedProduct::project(&sample()).to_fields();
        fields.insert("_v".to_string(), "0".to_string());
        assert!(CachedProduct::from_fields(7, &fields).is_err());
    }

    #[test]
    fn from_fields_rejects_key_mismatch() {
        let fields = CachedProduct::project(&sample()).to_fields();
        assert!(CachedProduct::from_fields(8, &fields).is_err());
    }
}
