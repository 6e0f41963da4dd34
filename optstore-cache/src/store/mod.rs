//! Store adapters
//!
//! All backends implement the [`StoreAdapter`] trait:
//!
//! - [`InMemoryStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileStore`] -- one JSON file per scope

pub mod adapter;
pub mod file;
pub mod memory;

pub use adapter::{AutoloadMarker, StoreAdapter, StoredOption};
pub use file::FileStore;
pub use memory::{InMemoryStore, StoreMetrics};
