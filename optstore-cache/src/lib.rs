//! # optstore-cache
//!
//! A scoped option store for host applications that read and write named
//! settings and want to hit their backing store as rarely as possible.
//!
//! ## Features
//!
//! - Loose scope identifiers (`null`, `false`, `0`, `"0"` mean "current")
//! - Autoload cache with optional bulk warm-up
//! - Not-found cache so absent names are looked up once
//! - Update skipping driven by a loose, type-coercing equality
//! - Pluggable backing store behind an async trait
//! - Async-first design using tokio
//!
//! ## Reading and Writing Options
//!
//! ```no_run
//! use optstore_cache::{FileStore, OptionCache, EngineConfig, OptionValue, ScopeParam};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(FileStore::new("./options"));
//!     let options = OptionCache::new(store, EngineConfig::from_env()?)?;
//!
//!     options.add_with_autoload(ScopeParam::Null, "siteurl", "https://example.org", true).await?;
//!
//!     let url = options.get(ScopeParam::Null, "siteurl", OptionValue::Null).await?;
//!     println!("siteurl = {}", url);
//!
//!     let outcome = options.update(2i64, "siteurl", "https://example.net").await?;
//!     println!("update in scope 2: {}", outcome);
//!     Ok(())
//! }
//! ```
//!
//! ## Update Skipping
//!
//! ```no_run
//! use optstore_cache::{evaluate, OptionValue, UpdateDecision};
//!
//! // Scalars compare by their database text
//! assert_eq!(evaluate(&"1".into(), &OptionValue::Bool(true)), UpdateDecision::Skip);
//! // but "0" and false are stored differently
//! assert_eq!(evaluate(&"0".into(), &OptionValue::Bool(false)), UpdateDecision::Write);
//! ```
//!
//! ## Bulk Warm-up
//!
//! ```no_run
//! use optstore_cache::{InMemoryStore, OptionCache, ScopeParam};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let options = OptionCache::with_defaults(Arc::new(InMemoryStore::new()));
//!
//!     let autoloaded = options.load_autoloaded(ScopeParam::Null).await?;
//!     println!("{} options preloaded", autoloaded.len());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod equality;
pub mod error;
pub mod scope;
pub mod store;
pub mod value;

// Re-export main types for convenience
pub use cache::{
    AutoloadCache, CacheStats, EngineConfig, EngineConfigBuilder, NegativeCache, OptionCache,
    ScopeCache, UpdateOutcome,
};
pub use equality::{evaluate, is_equal_database_value, values_loosely_equal, UpdateDecision};
pub use error::{OptionError, Result, StoreError, StoreResult};
pub use scope::{resolve, ScopeId, ScopeKey, ScopeParam};
pub use store::{AutoloadMarker, FileStore, InMemoryStore, StoreAdapter, StoreMetrics, StoredOption};
pub use value::OptionValue;
