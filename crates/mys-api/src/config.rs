//! Configuration for the API client

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ApiError, Result};

/// Proxy address that explicitly disables proxying
pub const NULL_PROXY: &str = "http://0.0.0.0:0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Proxy for overseas traffic; empty or [`NULL_PROXY`] disables it
    pub proxy_address: Option<String>,

    /// Bound on one request, connect included
    pub request_timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Time-to-live of cached responses
    pub cache_ttl: Duration,

    /// Log per-request latency and failing request parameters
    pub log_requests: bool,

    /// Fixed device id for sign-in requests (derived from the uid when unset)
    pub device_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy_address: None,
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(300),
            log_requests: true,
            device_id: None,
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            proxy_address: std::env::var("MYS_PROXY_ADDRESS")
                .ok()
                .filter(|s| !s.is_empty()),
            request_timeout: std::env::var("MYS_REQUEST_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(defaults.request_timeout, Duration::from_secs),
            connect_timeout: std::env::var("MYS_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(defaults.connect_timeout, Duration::from_secs),
            cache_ttl: std::env::var("MYS_CACHE_TTL")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(defaults.cache_ttl, Duration::from_secs),
            log_requests: std::env::var("MYS_LOG_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.log_requests),
            device_id: std::env::var("MYS_DEVICE_ID").ok().filter(|s| !s.is_empty()),
        }
    }

    #[must_use]
    pub fn with_proxy(mut self, address: impl Into<String>) -> Self {
        self.proxy_address = Some(address.into());
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Configured proxy, unless it is empty or the null sentinel
    pub fn effective_proxy(&self) -> Option<&str> {
        self.proxy_address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty() && *address != NULL_PROXY)
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(ApiError::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }
        if let Some(address) = self.effective_proxy() {
            url::Url::parse(address).map_err(|e| {
                ApiError::Config(format!("invalid proxy address '{address}': {e}"))
            })?;
        }
        Ok(())
    }
}
