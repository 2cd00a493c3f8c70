//! Store contract shared by every API client

use crate::error::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

/// Shared keyed store with per-entry expiry.
///
/// Implementations are shared across client instances and across concurrent
/// requests, so they must be `Send + Sync`. Values are opaque strings.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns None for missing or expired keys.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value. The entry
    /// expires `ttl` after this call.
    async fn set_ex(&self, key: &str, ttl: Duration, value: String) -> CacheResult<()>;

    /// Returns true if the key was present and removed.
    async fn remove(&self, key: &str) -> CacheResult<bool>;
}
