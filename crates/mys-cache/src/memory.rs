//! In-process key-value store with per-entry TTL
//!
//! Entries live in a [`DashMap`] so concurrent readers and writers on
//! different keys do not contend. Expired entries are dropped lazily on read
//! and, when the store was created with [`MemoryStore::new_with_cleanup`], by
//! a background sweeper task.

use crate::{
    config::MemoryStoreConfig,
    error::{CacheError, CacheResult},
    stats::{AtomicStats, CacheStats},
    traits::KeyValueStore,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::time::interval;

#[derive(Debug)]
struct StoreEntry {
    value: String,
    expires_at: Instant,
}

impl StoreEntry {
    fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory [`KeyValueStore`] with TTL expiry.
///
/// When the store is full the entry closest to expiry is evicted to make
/// room for a new key.
pub struct MemoryStore {
    storage: Arc<DashMap<String, StoreEntry>>,
    config: MemoryStoreConfig,
    stats: Arc<AtomicStats>,
    cleanup_handle: Option<tokio::task::JoinHandle<()>>,
}

impl MemoryStore {
    /// Create a store without a background sweeper
    pub fn new(config: MemoryStoreConfig) -> CacheResult<Self> {
        config
            .validate()
            .map_err(CacheError::InvalidConfiguration)?;

        Ok(Self {
            storage: Arc::new(DashMap::with_capacity(config.max_entries.min(1024))),
            config,
            stats: Arc::new(AtomicStats::default()),
            cleanup_handle: None,
        })
    }

    /// Create a store and start the background sweeper.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new_with_cleanup(config: MemoryStoreConfig) -> CacheResult<Self> {
        let cleanup_interval = config.cleanup_interval;
        let mut store = Self::new(config)?;

        if cleanup_interval > Duration::ZERO {
            store.start_cleanup_task(cleanup_interval);
        }

        Ok(store)
    }

    fn start_cleanup_task(&mut self, cleanup_interval: Duration) {
        let storage = Arc::clone(&self.storage);
        let stats = Arc::clone(&self.stats);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(cleanup_interval);

            loop {
                ticker.tick().await;
                let removed = purge_expired(&storage, &stats);
                if removed > 0 {
                    tracing::debug!("Swept {} expired cache entries", removed);
                }
            }
        });

        self.cleanup_handle = Some(handle);
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        purge_expired(&self.storage, &self.stats)
    }

    /// Number of stored entries, expired ones included until swept
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn clear(&self) {
        self.storage.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.storage.len() as u64)
    }

    fn make_room(&self) -> CacheResult<()> {
        purge_expired(&self.storage, &self.stats);
        if self.storage.len() < self.config.max_entries {
            return Ok(());
        }

        let victim = self
            .storage
            .iter()
            .min_by_key(|entry| entry.value().expires_at)
            .map(|entry| entry.key().clone())
            .ok_or(CacheError::CapacityExceeded)?;

        if self.storage.remove(&victim).is_some() {
            self.stats.record_eviction();
        }
        Ok(())
    }
}

fn purge_expired(storage: &DashMap<String, StoreEntry>, stats: &AtomicStats) -> usize {
    let mut removed = 0;
    storage.retain(|_, entry| {
        if entry.is_expired() {
            removed += 1;
            stats.record_expiration();
            false
        } else {
            true
        }
    });
    removed
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        if let Some(handle) = self.cleanup_handle.take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        if let Some(entry) = self.storage.get(key)
            && !entry.is_expired()
        {
            self.stats.record_hit();
            return Ok(Some(entry.value.clone()));
        }

        if self
            .storage
            .remove_if(key, |_, entry| entry.is_expired())
            .is_some()
        {
            self.stats.record_expiration();
        }
        self.stats.record_miss();
        Ok(None)
    }

    async fn set_ex(&self, key: &str, ttl: Duration, value: String) -> CacheResult<()> {
        if ttl.is_zero() {
            self.storage.remove(key);
            return Ok(());
        }

        if !self.storage.contains_key(key) && self.storage.len() >= self.config.max_entries {
            self.make_room()?;
        }

        self.storage
            .insert(key.to_string(), StoreEntry::new(value, ttl));
        self.stats.record_write();
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        Ok(self.storage.remove(key).is_some())
    }
}
