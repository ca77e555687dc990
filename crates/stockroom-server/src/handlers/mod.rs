//! HTTP handlers

pub mod health;
pub mod products;

pub use health::health;
