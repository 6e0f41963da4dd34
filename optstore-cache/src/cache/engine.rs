//! Option cache engine
//!
//! Orchestrates add/get/update/delete over a [`StoreAdapter`], answering
//! reads from the per-scope caches where it can and skipping writes whose
//! new value is loosely equal to the old one.

use crate::cache::{
    config::EngineConfig,
    scoped::ScopeCache,
    types::CacheStats,
};
use crate::equality::{evaluate, UpdateDecision};
use crate::error::{Result, StoreError};
use crate::scope::{resolve, ScopeId, ScopeParam};
use crate::store::StoreAdapter;
use crate::value::OptionValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Result of [`OptionCache::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateOutcome {
    /// The stored value was replaced
    Written,
    /// The option did not exist and was created
    Added,
    /// Old and new values are loosely equal; the store was not touched
    Skipped,
    /// The scope or name was invalid; nothing was touched
    Rejected,
}

impl UpdateOutcome {
    /// Truthiness legacy callers branch on: did the store change?
    pub fn is_updated(self) -> bool {
        matches!(self, UpdateOutcome::Written | UpdateOutcome::Added)
    }

    pub fn is_skipped(self) -> bool {
        self == UpdateOutcome::Skipped
    }

    pub fn is_rejected(self) -> bool {
        self == UpdateOutcome::Rejected
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::Written => write!(f, "written"),
            UpdateOutcome::Added => write!(f, "added"),
            UpdateOutcome::Skipped => write!(f, "skipped"),
            UpdateOutcome::Rejected => write!(f, "rejected"),
        }
    }
}

/// What a lookup found for one name
enum Lookup {
    Absent,
    Found { value: OptionValue, autoload: bool },
}

/// Scoped option store with autoload and not-found caches
///
/// This implementation provides:
/// - Per-scope locking: each scope's caches sit behind their own mutex, held
///   across the whole read-modify-write including the store call
/// - Read-your-writes within the process
/// - Loose update-skip semantics (see [`crate::equality`])
pub struct OptionCache {
    config: EngineConfig,

    store: Arc<dyn StoreAdapter>,

    scopes: RwLock<HashMap<ScopeId, Arc<Mutex<ScopeCache>>>>,

    stats: Mutex<CacheStats>,
}

impl OptionCache {
    /// Create an engine over `store`
    pub fn new(store: Arc<dyn StoreAdapter>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        info!("Initializing option cache with config: {:?}", config);

        Ok(Self {
            config,
            store,
            scopes: RwLock::new(HashMap::new()),
            stats: Mutex::new(CacheStats::default()),
        })
    }

    /// Create an engine with the default configuration
    pub fn with_defaults(store: Arc<dyn StoreAdapter>) -> Self {
        Self {
            config: EngineConfig::default(),
            store,
            scopes: RwLock::new(HashMap::new()),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve a caller-supplied scope to the id its caches live under
    pub fn resolve_scope(&self, scope: impl Into<ScopeParam>) -> Option<ScopeId> {
        resolve(&scope.into()).map(|key| key.canonical(self.config.current_scope))
    }

    /// Read an option, returning `default` when it does not exist.
    ///
    /// An invalid scope or empty name yields `OptionValue::Bool(false)`.
    pub async fn get(
        &self,
        scope: impl Into<ScopeParam>,
        name: &str,
        default: OptionValue,
    ) -> Result<OptionValue> {
        let Some((scope, name)) = self.target(scope.into(), name, "get").await else {
            return Ok(OptionValue::Bool(false));
        };

        Ok(self.read(scope, name).await?.unwrap_or(default))
    }

    /// Read an option, telling a stored null apart from a missing row.
    ///
    /// Returns `None` when the option does not exist or the scope or name is
    /// invalid.
    pub async fn get_if_exists(
        &self,
        scope: impl Into<ScopeParam>,
        name: &str,
    ) -> Result<Option<OptionValue>> {
        let Some((scope, name)) = self.target(scope.into(), name, "get").await else {
            return Ok(None);
        };

        self.read(scope, name).await
    }

    /// Create an option with the configured default autoload flag
    pub async fn add(
        &self,
        scope: impl Into<ScopeParam>,
        name: &str,
        value: impl Into<OptionValue>,
    ) -> Result<bool> {
        self.add_with_autoload(scope, name, value, self.config.default_autoload)
            .await
    }

    /// Create an option. Returns `false` if it already exists or the scope or
    /// name is invalid.
    pub async fn add_with_autoload(
        &self,
        scope: impl Into<ScopeParam>,
        name: &str,
        value: impl Into<OptionValue>,
        autoload: bool,
    ) -> Result<bool> {
        let Some((scope, name)) = self.target(scope.into(), name, "add").await else {
            return Ok(false);
        };

        let cell = self.scope_cache(scope).await;
        let mut cache = cell.lock().await;

        if let Lookup::Found { .. } = self.lookup(scope, name, &mut cache).await? {
            debug!("Option already exists, not adding: {}:{}", scope, name);
            return Ok(false);
        }

        let value = value.into();
        self.write(scope, name, value, autoload, &mut cache).await?;
        debug!("Added option {}:{} (autoload: {})", scope, name, autoload);
        Ok(true)
    }

    /// Replace an option's value unless the new value is loosely equal to
    /// the old one. A name that was never set is added instead.
    pub async fn update(
        &self,
        scope: impl Into<ScopeParam>,
        name: &str,
        value: impl Into<OptionValue>,
    ) -> Result<UpdateOutcome> {
        let Some((scope, name)) = self.target(scope.into(), name, "update").await else {
            return Ok(UpdateOutcome::Rejected);
        };

        let cell = self.scope_cache(scope).await;
        let mut cache = cell.lock().await;
        let value = value.into();

        let (old, autoload) = match self.lookup(scope, name, &mut cache).await? {
            Lookup::Found { value: old, autoload } => (old, autoload),
            Lookup::Absent => {
                let autoload = self.config.default_autoload;
                self.write(scope, name, value, autoload, &mut cache).await?;
                debug!("Update of unset option {}:{} added it", scope, name);
                return Ok(UpdateOutcome::Added);
            }
        };

        match evaluate(&old, &value) {
            UpdateDecision::Skip => {
                self.record(|s| s.skipped_updates += 1).await;
                debug!("Skipping loosely equal update: {}:{}", scope, name);
                Ok(UpdateOutcome::Skipped)
            }
            UpdateDecision::Write => {
                self.write(scope, name, value, autoload, &mut cache).await?;
                debug!("Updated option {}:{}", scope, name);
                Ok(UpdateOutcome::Written)
            }
        }
    }

    /// Remove an option. Returns whether a row actually existed.
    pub async fn delete(&self, scope: impl Into<ScopeParam>, name: &str) -> Result<bool> {
        let Some((scope, name)) = self.target(scope.into(), name, "delete").await else {
            return Ok(false);
        };

        let cell = self.scope_cache(scope).await;
        let mut cache = cell.lock().await;

        let existed = self
            .store
            .delete_raw(scope, name)
            .await
            .map_err(|e| store_failure("delete", scope, name, e))?;
        self.record(|s| s.store_deletes += 1).await;
        self.forget(&mut cache, name);

        debug!("Deleted option {}:{} (existed: {})", scope, name, existed);
        Ok(existed)
    }

    /// Bulk-load the autoloaded options of a scope.
    ///
    /// The first call per scope reads the whole autoload partition from the
    /// store and replaces the scope's autoload cache with it; later calls are
    /// answered from the cache until the scope is flushed.
    pub async fn load_autoloaded(
        &self,
        scope: impl Into<ScopeParam>,
    ) -> Result<BTreeMap<String, OptionValue>> {
        let Some(scope) = self.resolve_or_reject(scope.into(), "load_autoloaded").await else {
            return Ok(BTreeMap::new());
        };

        let cell = self.scope_cache(scope).await;
        let mut cache = cell.lock().await;

        if cache.is_warmed() {
            return Ok(cache.autoload().snapshot());
        }

        let values = self
            .store
            .get_autoloaded(scope)
            .await
            .map_err(|e| store_failure("load_autoloaded", scope, "*", e))?;
        self.record(|s| s.bulk_loads += 1).await;
        info!("Loaded {} autoloaded options for scope {}", values.len(), scope);

        cache.replace_autoloaded(values.clone());
        Ok(values)
    }

    /// Change the persisted autoload flag of an existing option.
    ///
    /// Returns `false` if the option does not exist or the scope or name is
    /// invalid. The value itself is left untouched.
    pub async fn set_autoload(
        &self,
        scope: impl Into<ScopeParam>,
        name: &str,
        autoload: bool,
    ) -> Result<bool> {
        let Some((scope, name)) = self.target(scope.into(), name, "set_autoload").await else {
            return Ok(false);
        };

        let cell = self.scope_cache(scope).await;
        let mut cache = cell.lock().await;

        if cache.negative().contains(name) {
            self.record(|s| s.negative_hits += 1).await;
            return Ok(false);
        }

        // The cached copy doesn't carry the flag of non-autoloaded rows
        let row = self
            .store
            .get_raw(scope, name)
            .await
            .map_err(|e| store_failure("read", scope, name, e))?;
        self.record(|s| s.store_reads += 1).await;

        let Some(row) = row else {
            self.forget(&mut cache, name);
            return Ok(false);
        };

        if row.is_autoload() == autoload {
            cache.mark_present(name, row.value, autoload);
            return Ok(true);
        }

        self.write(scope, name, row.value, autoload, &mut cache).await?;
        info!("Set autoload of {}:{} to {}", scope, name, autoload);
        Ok(true)
    }

    /// Drop both caches of one scope so the next access reads the store.
    /// Returns `false` for an invalid scope.
    pub async fn flush(&self, scope: impl Into<ScopeParam>) -> bool {
        let Some(scope) = self.resolve_or_reject(scope.into(), "flush").await else {
            return false;
        };

        let cell = self.scope_cache(scope).await;
        cell.lock().await.clear();
        info!("Flushed option caches for scope {}", scope);
        true
    }

    /// Drop the caches of every scope
    pub async fn flush_all(&self) {
        // Cells stay in place so callers already holding one keep sharing
        // its lock with later callers
        let cells: Vec<_> = self.scopes.read().await.values().cloned().collect();
        for cell in &cells {
            cell.lock().await.clear();
        }
        info!("Flushed option caches for {} scopes", cells.len());
    }

    /// Whether `name` is currently recorded as absent in `scope`
    pub async fn is_negative_cached(&self, scope: impl Into<ScopeParam>, name: &str) -> bool {
        match self.resolve_scope(scope) {
            Some(scope) => {
                let cell = self.scope_cache(scope).await;
                let cache = cell.lock().await;
                cache.negative().contains(name.trim())
            }
            None => false,
        }
    }

    /// Whether `name` currently has a value in the autoload cache of `scope`
    pub async fn is_autoload_cached(&self, scope: impl Into<ScopeParam>, name: &str) -> bool {
        match self.resolve_scope(scope) {
            Some(scope) => {
                let cell = self.scope_cache(scope).await;
                let cache = cell.lock().await;
                cache.autoload().contains(name.trim())
            }
            None => false,
        }
    }

    /// Get engine statistics
    pub async fn stats(&self) -> CacheStats {
        self.stats.lock().await.clone()
    }

    /// Internal: resolve scope and trim the name, counting rejections.
    ///
    /// Names are keyed by their trimmed form; an empty name and `"0"` are
    /// rejected.
    async fn target<'n>(
        &self,
        scope: ScopeParam,
        name: &'n str,
        op: &str,
    ) -> Option<(ScopeId, &'n str)> {
        let name = name.trim();
        if name.is_empty() || name == "0" {
            warn!("Rejected {} with invalid option name {:?}", op, name);
            self.record(|s| s.rejected += 1).await;
            return None;
        }
        let scope = self.resolve_or_reject(scope, op).await?;
        Some((scope, name))
    }

    async fn resolve_or_reject(&self, scope: ScopeParam, op: &str) -> Option<ScopeId> {
        match resolve(&scope) {
            Some(key) => Some(key.canonical(self.config.current_scope)),
            None => {
                warn!("Rejected {} with invalid scope {:?}", op, scope);
                self.record(|s| s.rejected += 1).await;
                None
            }
        }
    }

    /// Internal: the cache cell of a scope, created on first use
    async fn scope_cache(&self, scope: ScopeId) -> Arc<Mutex<ScopeCache>> {
        if let Some(cell) = self.scopes.read().await.get(&scope) {
            return Arc::clone(cell);
        }

        let mut scopes = self.scopes.write().await;
        Arc::clone(scopes.entry(scope).or_default())
    }

    /// Internal: locked read of one option
    async fn read(&self, scope: ScopeId, name: &str) -> Result<Option<OptionValue>> {
        let cell = self.scope_cache(scope).await;
        let mut cache = cell.lock().await;

        match self.lookup(scope, name, &mut cache).await? {
            Lookup::Found { value, .. } => Ok(Some(value)),
            Lookup::Absent => Ok(None),
        }
    }

    /// Internal: read-through lookup in cache order
    async fn lookup(&self, scope: ScopeId, name: &str, cache: &mut ScopeCache) -> Result<Lookup> {
        if cache.negative().contains(name) {
            debug!("Not-found cache hit: {}:{}", scope, name);
            self.record(|s| s.negative_hits += 1).await;
            return Ok(Lookup::Absent);
        }

        if let Some(value) = cache.autoload().get(name) {
            debug!("Autoload cache hit: {}:{}", scope, name);
            let value = value.clone();
            self.record(|s| s.autoload_hits += 1).await;
            return Ok(Lookup::Found {
                value,
                autoload: true,
            });
        }

        let row = self
            .store
            .get_raw(scope, name)
            .await
            .map_err(|e| store_failure("read", scope, name, e))?;
        self.record(|s| s.store_reads += 1).await;

        match row {
            Some(row) => {
                let autoload = row.is_autoload();
                if autoload {
                    cache.mark_present(name, row.value.clone(), true);
                }
                debug!("Store hit: {}:{} (autoload: {})", scope, name, autoload);
                Ok(Lookup::Found {
                    value: row.value,
                    autoload,
                })
            }
            None => {
                debug!("Store miss: {}:{}", scope, name);
                if self.config.enable_negative_cache {
                    cache.mark_absent(name);
                }
                Ok(Lookup::Absent)
            }
        }
    }

    /// Internal: persist a row, then bring the caches in line with it
    async fn write(
        &self,
        scope: ScopeId,
        name: &str,
        value: OptionValue,
        autoload: bool,
        cache: &mut ScopeCache,
    ) -> Result<()> {
        self.store
            .put_raw(scope, name, &value, autoload)
            .await
            .map_err(|e| store_failure("write", scope, name, e))?;
        self.record(|s| s.store_writes += 1).await;
        cache.mark_present(name, value, autoload);
        Ok(())
    }

    /// Internal: the row is gone
    fn forget(&self, cache: &mut ScopeCache, name: &str) {
        if self.config.enable_negative_cache {
            cache.mark_absent(name);
        } else {
            cache.autoload.remove(name);
        }
    }

    async fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        if self.config.enable_metrics {
            update(&mut *self.stats.lock().await);
        }
    }
}

fn store_failure(op: &str, scope: ScopeId, name: &str, err: StoreError) -> StoreError {
    warn!("Store {} failed for {}:{}: {}", op, scope, name, err);
    err
}

impl fmt::Debug for OptionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionCache")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn engine() -> (OptionCache, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let cache = OptionCache::new(store.clone(), EngineConfig::default()).unwrap();
        (cache, store)
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let (cache, _store) = engine();

        assert!(cache.add(ScopeParam::Null, "blogname", "My Site").await.unwrap());
        let value = cache
            .get(ScopeParam::Null, "blogname", OptionValue::Bool(false))
            .await
            .unwrap();
        assert_eq!(value, OptionValue::from("My Site"));
    }

    #[tokio::test]
    async fn test_invalid_scope_touches_nothing() {
        let (cache, store) = engine();

        assert!(!cache.add(true, "k", "v").await.unwrap());
        assert_eq!(cache.update("string", "k", "v").await.unwrap(), UpdateOutcome::Rejected);
        assert!(!cache.delete(true, "k").await.unwrap());
        assert_eq!(
            cache.get("string", "k", OptionValue::from("default")).await.unwrap(),
            OptionValue::Bool(false)
        );

        assert_eq!(store.metrics().total(), 0);
        assert_eq!(cache.stats().await.rejected, 4);
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let (cache, store) = engine();

        assert!(!cache.add(ScopeParam::Null, "  ", "v").await.unwrap());
        assert_eq!(cache.update(ScopeParam::Null, "", "v").await.unwrap(), UpdateOutcome::Rejected);
        assert_eq!(store.metrics().total(), 0);
    }

    #[tokio::test]
    async fn test_zero_name_rejected() {
        let (cache, store) = engine();

        assert!(!cache.add(ScopeParam::Null, "0", "v").await.unwrap());
        assert!(!cache.add(ScopeParam::Null, " 0 ", "v").await.unwrap());
        assert_eq!(
            cache.get(ScopeParam::Null, "0", OptionValue::Null).await.unwrap(),
            OptionValue::Bool(false)
        );
        assert_eq!(store.metrics().total(), 0);
        assert_eq!(cache.stats().await.rejected, 3);
    }

    #[tokio::test]
    async fn test_names_are_trimmed() {
        let (cache, store) = engine();

        assert!(cache.add(ScopeParam::Null, " blogname ", "My Site").await.unwrap());
        assert!(store.row(ScopeId(1), "blogname").is_some());
        assert!(store.row(ScopeId(1), " blogname ").is_none());

        assert!(!cache.add(ScopeParam::Null, "blogname", "Other").await.unwrap());
        assert_eq!(
            cache.get(ScopeParam::Null, "\tblogname\n", OptionValue::Null).await.unwrap(),
            OptionValue::from("My Site")
        );
        assert_eq!(
            cache.update(ScopeParam::Null, "blogname  ", "My Site").await.unwrap(),
            UpdateOutcome::Skipped
        );
        assert!(cache.delete(ScopeParam::Null, "  blogname").await.unwrap());
        assert!(cache.is_negative_cached(ScopeParam::Null, " blogname ").await);
    }

    #[tokio::test]
    async fn test_get_if_exists_tells_null_from_absent() {
        let (cache, _store) = engine();

        cache.add(ScopeParam::Null, "nothing", OptionValue::Null).await.unwrap();

        assert_eq!(
            cache.get_if_exists(ScopeParam::Null, "nothing").await.unwrap(),
            Some(OptionValue::Null)
        );
        assert_eq!(cache.get_if_exists(ScopeParam::Null, "absent").await.unwrap(), None);
        assert_eq!(cache.get_if_exists(true, "nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_current_scope_aliases_share_partition() {
        let (cache, store) = engine();

        cache.add(0i64, "shared", "yes").await.unwrap();
        let value = cache.get(1i64, "shared", OptionValue::Null).await.unwrap();
        assert_eq!(value, OptionValue::from("yes"));
        assert!(store.row(ScopeId(1), "shared").is_some());
    }

    #[tokio::test]
    async fn test_update_outcomes() {
        let (cache, store) = engine();

        assert_eq!(cache.update(ScopeParam::Null, "n", "1").await.unwrap(), UpdateOutcome::Added);
        assert_eq!(cache.update(ScopeParam::Null, "n", 1i64).await.unwrap(), UpdateOutcome::Skipped);
        assert_eq!(cache.update(ScopeParam::Null, "n", "2").await.unwrap(), UpdateOutcome::Written);
        assert_eq!(store.metrics().writes, 2);

        let stats = cache.stats().await;
        assert_eq!(stats.skipped_updates, 1);
        assert_eq!(stats.store_writes, 2);
    }

    #[tokio::test]
    async fn test_outcome_truthiness() {
        assert!(UpdateOutcome::Written.is_updated());
        assert!(UpdateOutcome::Added.is_updated());
        assert!(!UpdateOutcome::Skipped.is_updated());
        assert!(UpdateOutcome::Skipped.is_skipped());
        assert!(UpdateOutcome::Rejected.is_rejected());
        assert_eq!(UpdateOutcome::Skipped.to_string(), "skipped");
    }

    #[tokio::test]
    async fn test_metrics_disabled() {
        let store = Arc::new(InMemoryStore::new());
        let config = EngineConfig::builder().enable_metrics(false).build();
        let cache = OptionCache::new(store, config).unwrap();

        cache.add(ScopeParam::Null, "k", "v").await.unwrap();
        assert_eq!(cache.stats().await, CacheStats::default());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let config = EngineConfig::builder().current_scope(ScopeId(0)).build();
        assert!(OptionCache::new(store, config).is_err());
    }
}
