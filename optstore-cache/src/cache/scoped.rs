//! Per-scope cache partitions
//!
//! A [`ScopeCache`] pairs the not-found set with the autoload map of one
//! scope. Its mutators keep the two disjoint: marking a name absent evicts it
//! from the autoload map and caching a value clears its not-found mark.

use crate::value::OptionValue;
use std::collections::{BTreeMap, HashSet};

/// Names confirmed absent from the store
#[derive(Debug, Clone, Default)]
pub struct NegativeCache {
    names: HashSet<String>,
}

impl NegativeCache {
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn insert(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }
}

/// Autoloaded option values
#[derive(Debug, Clone, Default)]
pub struct AutoloadCache {
    values: BTreeMap<String, OptionValue>,
}

impl AutoloadCache {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn insert(&mut self, name: &str, value: OptionValue) -> Option<OptionValue> {
        self.values.insert(name.to_string(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<OptionValue> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<String, OptionValue> {
        self.values.clone()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Both caches of one scope
#[derive(Debug, Default)]
pub struct ScopeCache {
    pub(crate) negative: NegativeCache,
    pub(crate) autoload: AutoloadCache,
    /// Set once the whole autoload partition has been bulk-loaded
    pub(crate) warmed: bool,
}

impl ScopeCache {
    pub fn negative(&self) -> &NegativeCache {
        &self.negative
    }

    pub fn autoload(&self) -> &AutoloadCache {
        &self.autoload
    }

    pub fn is_warmed(&self) -> bool {
        self.warmed
    }

    /// Record that the store has no row for `name`
    pub fn mark_absent(&mut self, name: &str) {
        self.autoload.remove(name);
        self.negative.insert(name);
    }

    /// Record that `name` now exists; autoloaded values are cached
    pub fn mark_present(&mut self, name: &str, value: OptionValue, autoload: bool) {
        self.negative.remove(name);
        if autoload {
            self.autoload.insert(name, value);
        } else {
            self.autoload.remove(name);
        }
    }

    /// Replace the autoload partition with a freshly loaded one
    pub fn replace_autoloaded(&mut self, values: BTreeMap<String, OptionValue>) {
        for name in values.keys() {
            self.negative.remove(name);
        }
        self.autoload = AutoloadCache { values };
        self.warmed = true;
    }

    pub fn clear(&mut self) {
        self.negative.clear();
        self.autoload.clear();
        self.warmed = false;
    }
}
