//! JSON-file backed option store
//!
//! One file per scope (`scope-<id>.json`) under a base directory. Each file
//! maps option names to rows carrying the value, the `"yes"`/`"no"` autoload
//! marker and the time of the last write. A missing file is an empty scope.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::scope::ScopeId;
use crate::store::adapter::{AutoloadMarker, StoreAdapter, StoredOption};
use crate::value::OptionValue;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileRow {
    value: OptionValue,
    autoload: AutoloadMarker,
    updated_at: DateTime<Utc>,
}

type ScopeFile = BTreeMap<String, FileRow>;

/// Option store persisting each scope as a pretty-printed JSON file
pub struct FileStore {
    base_dir: PathBuf,
    // Serializes read-modify-write cycles on the files
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the file holding one scope
    pub fn scope_path(&self, scope: ScopeId) -> PathBuf {
        self.base_dir.join(format!("scope-{}.json", scope))
    }

    async fn load(&self, scope: ScopeId) -> StoreResult<ScopeFile> {
        let path = self.scope_path(scope);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ScopeFile::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(ScopeFile::new());
        }

        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            scope: scope.to_string(),
            name: "*".to_string(),
            reason: format!("{}: {}", path.display(), e),
        })
    }

    async fn save(&self, scope: ScopeId, file: &ScopeFile) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.base_dir).await?;

        let path = self.scope_path(scope);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(file)?;

        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!("Wrote {} rows to {}", file.len(), path.display());
        Ok(())
    }
}

#[async_trait]
impl StoreAdapter for FileStore {
    async fn get_raw(&self, scope: ScopeId, name: &str) -> StoreResult<Option<StoredOption>> {
        let file = self.load(scope).await?;
        Ok(file.get(name).map(|row| StoredOption {
            value: row.value.clone(),
            autoload: row.autoload,
        }))
    }

    async fn get_autoloaded(&self, scope: ScopeId) -> StoreResult<BTreeMap<String, OptionValue>> {
        let file = self.load(scope).await?;
        Ok(file
            .into_iter()
            .filter(|(_, row)| row.autoload.is_autoload())
            .map(|(name, row)| (name, row.value))
            .collect())
    }

    async fn put_raw(
        &self,
        scope: ScopeId,
        name: &str,
        value: &OptionValue,
        autoload: bool,
    ) -> StoreResult<()> {
        if !value.is_finite() {
            return Err(StoreError::Serialization(format!(
                "{}:{} holds a non-finite float, which JSON cannot represent",
                scope, name
            )));
        }

        let _guard = self.write_lock.lock().await;

        let mut file = self.load(scope).await?;
        file.insert(
            name.to_string(),
            FileRow {
                value: value.clone(),
                autoload: autoload.into(),
                updated_at: Utc::now(),
            },
        );
        self.save(scope, &file).await
    }

    async fn delete_raw(&self, scope: ScopeId, name: &str) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().await;

        let mut file = self.load(scope).await?;
        if file.remove(name).is_none() {
            return Ok(false);
        }
        self.save(scope, &file).await?;
        Ok(true)
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("base_dir", &self.base_dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_missing_file_is_empty_scope() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());

        assert!(store.get_raw(ScopeId(1), "anything").await.unwrap().is_none());
        assert!(store.get_autoloaded(ScopeId(1)).await.unwrap().is_empty());
        assert!(!store.delete_raw(ScopeId(1), "anything").await.unwrap());
    }

    #[tokio::test]
    async fn test_non_finite_floats_are_refused() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());

        let nested = OptionValue::List(vec![OptionValue::Float(f64::INFINITY)]);
        for value in [OptionValue::Float(f64::NAN), nested] {
            let err = assert_err!(store.put_raw(ScopeId(1), "ratio", &value, true).await);
            assert!(matches!(err, StoreError::Serialization(_)));
        }

        // Nothing was written, so the row never turns into a null
        assert!(store.get_raw(ScopeId(1), "ratio").await.unwrap().is_none());
        assert!(!store.scope_path(ScopeId(1)).exists());

        assert_ok!(store.put_raw(ScopeId(1), "ratio", &OptionValue::Float(0.5), true).await);
        let row = store.get_raw(ScopeId(1), "ratio").await.unwrap().unwrap();
        assert_eq!(row.value, OptionValue::Float(0.5));
    }

    #[tokio::test]
    async fn test_rows_persist_with_legacy_marker() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("options"));

        assert_ok!(store.put_raw(ScopeId(3), "theme_mods_a", &"a-value".into(), false).await);
        assert_ok!(store.put_raw(ScopeId(3), "theme_mods_b", &OptionValue::Int(7), true).await);

        let content = std::fs::read_to_string(store.scope_path(ScopeId(3))).unwrap();
        assert!(content.contains("\"autoload\": \"no\""));
        assert!(content.contains("\"autoload\": \"yes\""));

        // A second handle sees the same rows
        let reopened = FileStore::new(store.base_dir());
        let row = reopened.get_raw(ScopeId(3), "theme_mods_b").await.unwrap().unwrap();
        assert_eq!(row.value, OptionValue::Int(7));
        assert_eq!(row.autoload, AutoloadMarker::Yes);

        let autoloaded = reopened.get_autoloaded(ScopeId(3)).await.unwrap();
        assert_eq!(autoloaded.keys().collect::<Vec<_>>(), vec!["theme_mods_b"]);
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        std::fs::write(store.scope_path(ScopeId(1)), "{ not json").unwrap();

        let err = assert_err!(store.get_raw(ScopeId(1), "x").await);
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }
}
