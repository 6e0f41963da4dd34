//! Statistics for the option cache engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Counters for cache performance monitoring
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads answered from the autoload cache
    pub autoload_hits: u64,

    /// Reads answered from the not-found cache
    pub negative_hits: u64,

    /// Single-row reads issued to the store
    pub store_reads: u64,

    /// Bulk autoload reads issued to the store
    pub bulk_loads: u64,

    /// Writes issued to the store
    pub store_writes: u64,

    /// Deletes issued to the store
    pub store_deletes: u64,

    /// Updates that were loosely equal and never reached the store
    pub skipped_updates: u64,

    /// Operations refused because the scope or name was invalid
    pub rejected: u64,
}

impl CacheStats {
    /// Reads served without touching the store
    pub fn hits(&self) -> u64 {
        self.autoload_hits + self.negative_hits
    }

    /// Calculate cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.store_reads;
        if total == 0 {
            0.0
        } else {
            (self.hits() as f64 / total as f64) * 100.0
        }
    }

    /// Every call of any kind issued to the store
    pub fn store_calls(&self) -> u64 {
        self.store_reads + self.bulk_loads + self.store_writes + self.store_deletes
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, store_reads: {}, hit_rate: {:.2}%, writes: {}, deletes: {}, skipped: {} }}",
            self.hits(),
            self.store_reads,
            self.hit_rate(),
            self.store_writes,
            self.store_deletes,
            self.skipped_updates
        )
    }
}
