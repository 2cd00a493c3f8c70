//! HTTP transport for provider requests

use reqwest::{Client, ClientBuilder, Proxy};
use std::sync::Once;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::Result;

static CRYPTO_PROVIDER: Once = Once::new();

/// Install the ring TLS provider once per process.
///
/// reqwest is built without a bundled provider, so this must run before the
/// first client is built.
pub fn ensure_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Pooled HTTP client with the request timeout applied
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Direct client
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Self::builder(config).build()?;
        Ok(Self {
            client,
            timeout: config.request_timeout,
        })
    }

    /// Client routing every request through `proxy_address`
    pub fn with_proxy(config: &ClientConfig, proxy_address: &str) -> Result<Self> {
        let proxy = Proxy::all(proxy_address)?;
        let client = Self::builder(config).proxy(proxy).build()?;
        Ok(Self {
            client,
            timeout: config.request_timeout,
        })
    }

    fn builder(config: &ClientConfig) -> ClientBuilder {
        ensure_crypto_provider();
        ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .tcp_nodelay(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .redirect(reqwest::redirect::Policy::limited(3))
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
