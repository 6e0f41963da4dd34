//! Backing-store contract consumed by the engine

use crate::error::StoreResult;
use crate::scope::ScopeId;
use crate::value::OptionValue;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Persisted autoload marker
///
/// Existing deployments store exactly `"yes"` or `"no"`; this marker is what
/// splits rows into the bulk-loaded partition and the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoloadMarker {
    Yes,
    No,
}

impl AutoloadMarker {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutoloadMarker::Yes => "yes",
            AutoloadMarker::No => "no",
        }
    }

    pub fn is_autoload(self) -> bool {
        self == AutoloadMarker::Yes
    }
}

impl From<bool> for AutoloadMarker {
    fn from(autoload: bool) -> Self {
        if autoload {
            AutoloadMarker::Yes
        } else {
            AutoloadMarker::No
        }
    }
}

impl FromStr for AutoloadMarker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" => Ok(AutoloadMarker::Yes),
            "no" => Ok(AutoloadMarker::No),
            other => Err(format!("invalid autoload marker '{}'", other)),
        }
    }
}

impl fmt::Display for AutoloadMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row as returned by [`StoreAdapter::get_raw`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOption {
    pub value: OptionValue,
    pub autoload: AutoloadMarker,
}

impl StoredOption {
    pub fn new(value: OptionValue, autoload: bool) -> Self {
        Self {
            value,
            autoload: autoload.into(),
        }
    }

    pub fn is_autoload(&self) -> bool {
        self.autoload.is_autoload()
    }
}

/// Raw persistence of `(scope, name) -> (value, autoload)`.
///
/// Implementations own their I/O policy: the engine imposes no timeout and
/// performs no retry, and every error is handed back to the caller as-is.
#[async_trait]
pub trait StoreAdapter: Send + Sync {
    /// Read one row. `Ok(None)` means the store has no such row.
    async fn get_raw(&self, scope: ScopeId, name: &str) -> StoreResult<Option<StoredOption>>;

    /// Read every autoloaded row of a scope in one call.
    async fn get_autoloaded(&self, scope: ScopeId) -> StoreResult<BTreeMap<String, OptionValue>>;

    /// Insert or overwrite a row.
    async fn put_raw(
        &self,
        scope: ScopeId,
        name: &str,
        value: &OptionValue,
        autoload: bool,
    ) -> StoreResult<()>;

    /// Remove a row. Returns `true` if the row existed.
    async fn delete_raw(&self, scope: ScopeId, name: &str) -> StoreResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_strings() {
        assert_eq!(AutoloadMarker::Yes.to_string(), "yes");
        assert_eq!(AutoloadMarker::from(false).as_str(), "no");
        assert_eq!("yes".parse::<AutoloadMarker>(), Ok(AutoloadMarker::Yes));
        assert!("on".parse::<AutoloadMarker>().is_err());
        assert_eq!(serde_json::to_string(&AutoloadMarker::No).unwrap(), "\"no\"");
    }

    #[test]
    fn test_stored_option() {
        let row = StoredOption::new("v".into(), true);
        assert!(row.is_autoload());
        assert_eq!(row.autoload, AutoloadMarker::Yes);
    }
}
