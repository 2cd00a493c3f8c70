//! Response cache over the shared key-value store.
//!
//! Keys hash the account id, operation name and a canonical serialization of
//! the parameters, so equal parameter sets hit the same entry regardless of
//! key order. Only successful responses are ever written.

use mys_cache::KeyValueStore;
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::response::ApiResponse;

const KEY_PREFIX: &str = "mys:cache:";

/// Cache layer bound to one store and TTL
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl ResponseCache {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store key for one request.
    ///
    /// `uid` and `operation` are length-prefixed so no split of the same
    /// characters between them yields the same material.
    pub fn key(uid: &str, operation: &str, params: &Value) -> String {
        let mut material = String::with_capacity(64);
        let _ = write!(material, "{}:{uid}{}:{operation}", uid.len(), operation.len());
        write_canonical(&mut material, params);
        format!("{KEY_PREFIX}{:x}", md5::compute(material.as_bytes()))
    }

    /// Look up a cached response.
    ///
    /// Entries that no longer deserialize are treated as misses.
    pub async fn get(&self, key: &str) -> Result<Option<ApiResponse>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(response) => Ok(Some(response)),
            Err(e) => {
                tracing::warn!("Discarding unreadable cache entry {}: {}", key, e);
                Ok(None)
            }
        }
    }

    /// Write `response` unless it carries a non-success status.
    ///
    /// Returns whether anything was written.
    pub async fn put(&self, key: &str, response: &ApiResponse) -> Result<bool> {
        if !response.is_success() {
            return Ok(false);
        }
        let raw = serde_json::to_string(response)?;
        self.store.set_ex(key, self.ttl, raw).await?;
        Ok(true)
    }
}

/// JSON with object keys sorted at every level
fn write_canonical(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{}:", Value::String(key.clone()));
                write_canonical(out, value);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        scalar => {
            let _ = write!(out, "{scalar}");
        }
    }
}
