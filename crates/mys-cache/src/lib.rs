//! Shared key-value store for cached miHoYo API responses
//!
//! API clients for different accounts share one keyed store so that repeated
//! queries inside the time-to-live window are answered without touching the
//! provider. This crate defines the store contract the clients depend on and
//! ships an in-process implementation.
//!
//! # Store contract
//!
//! [`KeyValueStore`] mirrors the two commands the clients rely on:
//!
//! - `GET key` returning the stored string or nothing
//! - `SETEX key ttl value` storing a string that expires `ttl` after the write
//!
//! Expiry is the store's job. Callers never check timestamps themselves.
//!
//! # In-memory store
//!
//! [`MemoryStore`] keeps entries in a [`dashmap::DashMap`], drops expired
//! entries lazily on read and, when created with
//! [`MemoryStore::new_with_cleanup`], sweeps them periodically on a tokio
//! task.
//!
//! ```rust,no_run
//! use mys_cache::{KeyValueStore, MemoryStore, MemoryStoreConfig};
//! use std::time::Duration;
//!
//! # async fn run() -> mys_cache::CacheResult<()> {
//! let store = MemoryStore::new(MemoryStoreConfig::default())?;
//! store.set_ex("mys:cache:abc", Duration::from_secs(300), "{}".to_string()).await?;
//! assert_eq!(store.get("mys:cache:abc").await?.as_deref(), Some("{}"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod stats;
pub mod traits;

pub use config::MemoryStoreConfig;
pub use error::{CacheError, CacheResult};
pub use memory::MemoryStore;
pub use stats::CacheStats;
pub use traits::KeyValueStore;
