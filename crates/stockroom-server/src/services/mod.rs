//! Business logic services

pub mod catalog;
pub mod index_manager;
pub mod mirror;
pub mod search;
pub mod synchronizer;

pub use catalog::CatalogService;
pub use index_manager::IndexManager;
pub use mirror::ProductMirror;
pub use search::{SearchOutcome, SearchService};
pub use synchronizer::Synchronizer;
