//! # Option Caching Layer
//!
//! This module implements the two per-scope caches that sit in front of the
//! backing store, and the engine that keeps them consistent with it.
//!
//! ## Features
//!
//! - **Autoload Cache**: values of options flagged for bulk loading, filled
//!   lazily on read or all at once by [`OptionCache::load_autoloaded`]
//! - **Not-Found Cache**: names confirmed absent, so repeated misses never
//!   reach the store
//! - **Update Skipping**: writes whose value is loosely equal to the stored
//!   one are dropped before the store is called
//! - **Per-Scope Locking**: each scope's caches are guarded by their own mutex
//!
//! ## Example
//!
//! ```rust
//! use optstore_cache::cache::{EngineConfig, OptionCache, UpdateOutcome};
//! use optstore_cache::{InMemoryStore, OptionValue, ScopeParam};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = Arc::new(InMemoryStore::new());
//! let options = OptionCache::new(store, EngineConfig::site())?;
//!
//! options.add(ScopeParam::Null, "blogname", "My Site").await?;
//!
//! // "1" and 1 are the same row content, so this never reaches the store
//! options.add(ScopeParam::Null, "users_can_register", "1").await?;
//! let outcome = options.update(ScopeParam::Null, "users_can_register", 1i64).await?;
//! assert_eq!(outcome, UpdateOutcome::Skipped);
//!
//! let name = options.get(ScopeParam::Null, "blogname", OptionValue::Null).await?;
//! println!("Site name: {}", name);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod scoped;
pub mod types;

pub use config::{EngineConfig, EngineConfigBuilder};
pub use engine::{OptionCache, UpdateOutcome};
pub use scoped::{AutoloadCache, NegativeCache, ScopeCache};
pub use types::CacheStats;
