use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::scope::ScopeId;
use crate::store::adapter::{StoreAdapter, StoredOption};
use crate::value::OptionValue;

/// Number of calls made against an [`InMemoryStore`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMetrics {
    pub reads: u64,
    pub bulk_reads: u64,
    pub writes: u64,
    pub deletes: u64,
}

impl StoreMetrics {
    /// Every call of any kind
    pub fn total(&self) -> u64 {
        self.reads + self.bulk_reads + self.writes + self.deletes
    }
}

/// In-memory, HashMap-based option store.
///
/// Intended for tests and embedding. Rows are held behind a `RwLock` and
/// cloned on read/write. Every call is counted so tests can assert that the
/// engine answered from its caches.
pub struct InMemoryStore {
    rows: RwLock<HashMap<(ScopeId, String), StoredOption>>,
    reads: AtomicU64,
    bulk_reads: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            reads: AtomicU64::new(0),
            bulk_reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Snapshot of the call counters.
    pub fn metrics(&self) -> StoreMetrics {
        StoreMetrics {
            reads: self.reads.load(Ordering::SeqCst),
            bulk_reads: self.bulk_reads.load(Ordering::SeqCst),
            writes: self.writes.load(Ordering::SeqCst),
            deletes: self.deletes.load(Ordering::SeqCst),
        }
    }

    /// Make every following call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Seed a row without going through the counters.
    pub fn insert_row(&self, scope: ScopeId, name: &str, value: OptionValue, autoload: bool) {
        self.rows
            .write()
            .expect("lock poisoned")
            .insert((scope, name.to_string()), StoredOption::new(value, autoload));
    }

    /// Peek at a row without going through the counters.
    pub fn row(&self, scope: ScopeId, name: &str) -> Option<StoredOption> {
        self.rows
            .read()
            .expect("lock poisoned")
            .get(&(scope, name.to_string()))
            .cloned()
    }

    /// Number of rows across all scopes.
    pub fn len(&self) -> usize {
        self.rows.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.read().expect("lock poisoned").is_empty()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store switched off".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreAdapter for InMemoryStore {
    async fn get_raw(&self, scope: ScopeId, name: &str) -> StoreResult<Option<StoredOption>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.row(scope, name))
    }

    async fn get_autoloaded(&self, scope: ScopeId) -> StoreResult<BTreeMap<String, OptionValue>> {
        self.bulk_reads.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let rows = self.rows.read().expect("lock poisoned");
        Ok(rows
            .iter()
            .filter(|((row_scope, _), row)| *row_scope == scope && row.is_autoload())
            .map(|((_, name), row)| (name.clone(), row.value.clone()))
            .collect())
    }

    async fn put_raw(
        &self,
        scope: ScopeId,
        name: &str,
        value: &OptionValue,
        autoload: bool,
    ) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.insert_row(scope, name, value.clone(), autoload);
        Ok(())
    }

    async fn delete_raw(&self, scope: ScopeId, name: &str) -> StoreResult<bool> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut rows = self.rows.write().expect("lock poisoned");
        Ok(rows.remove(&(scope, name.to_string())).is_some())
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("row_count", &self.len())
            .field("metrics", &self.metrics())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = InMemoryStore::new();
        let scope = ScopeId(1);

        assert_ok!(store.put_raw(scope, "blogname", &"My Site".into(), true).await);
        let row = store.get_raw(scope, "blogname").await.unwrap().unwrap();
        assert_eq!(row.value, OptionValue::from("My Site"));
        assert!(row.is_autoload());

        assert!(store.delete_raw(scope, "blogname").await.unwrap());
        assert!(!store.delete_raw(scope, "blogname").await.unwrap());
        assert!(store.get_raw(scope, "blogname").await.unwrap().is_none());

        let metrics = store.metrics();
        assert_eq!(metrics.writes, 1);
        assert_eq!(metrics.reads, 2);
        assert_eq!(metrics.deletes, 2);
        assert_eq!(metrics.total(), 5);
    }

    #[tokio::test]
    async fn test_get_autoloaded_filters_scope_and_flag() {
        let store = InMemoryStore::new();
        store.insert_row(ScopeId(1), "a", "1".into(), true);
        store.insert_row(ScopeId(1), "b", "2".into(), false);
        store.insert_row(ScopeId(2), "c", "3".into(), true);

        let loaded = store.get_autoloaded(ScopeId(1)).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("a"), Some(&OptionValue::from("1")));
        assert_eq!(store.metrics().bulk_reads, 1);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let store = InMemoryStore::new();
        store.set_unavailable(true);
        let err = assert_err!(store.get_raw(ScopeId(1), "x").await);
        assert!(matches!(err, StoreError::Unavailable(_)));

        store.set_unavailable(false);
        assert_ok!(store.get_raw(ScopeId(1), "x").await);
    }
}
