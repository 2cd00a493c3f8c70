//! Error types for store operations

use thiserror::Error;

/// Errors that can occur while talking to a key-value store
#[derive(Debug, Error)]
pub enum CacheError {
    /// Invalid store configuration
    #[error("Invalid cache configuration: {0}")]
    InvalidConfiguration(String),

    /// Store is at capacity and nothing could be evicted
    #[error("Cache capacity exceeded")]
    CapacityExceeded,

    /// Store backend-specific error
    #[error("Backend error: {0}")]
    Backend(String),
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;
