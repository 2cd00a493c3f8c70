//! Configuration for the in-memory store

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`MemoryStore`](crate::MemoryStore)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStoreConfig {
    /// Maximum number of live entries
    pub max_entries: usize,
    /// Interval of the background sweeper (zero disables it)
    pub cleanup_interval: Duration,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl MemoryStoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_entries == 0 {
            return Err("max_entries must be greater than 0".to_string());
        }
        Ok(())
    }
}
