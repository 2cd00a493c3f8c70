//! Proxy selection for overseas traffic.
//!
//! Only overseas servers are proxied, and only when a real proxy address is
//! configured. The proxied transport is built on first use and memoized;
//! if it cannot be built the failure is logged once and requests go out
//! directly.

use std::sync::OnceLock;

use crate::config::ClientConfig;
use crate::server::ServerCode;
use crate::transport::HttpTransport;

/// Lazily built proxied transport
#[derive(Debug)]
pub struct ProxyResolver {
    address: Option<String>,
    config: ClientConfig,
    transport: OnceLock<Option<HttpTransport>>,
}

impl ProxyResolver {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            address: config.effective_proxy().map(str::to_string),
            config: config.clone(),
            transport: OnceLock::new(),
        }
    }

    /// Whether requests to `server` should be proxied at all
    pub fn applies_to(&self, server: ServerCode) -> bool {
        self.address.is_some() && server.is_overseas()
    }

    /// Proxied transport for `server`, or `None` to go direct
    pub fn transport_for(&self, server: ServerCode) -> Option<&HttpTransport> {
        if !self.applies_to(server) {
            return None;
        }
        self.transport
            .get_or_init(|| {
                let address = self.address.as_deref()?;
                match HttpTransport::with_proxy(&self.config, address) {
                    Ok(transport) => {
                        tracing::debug!("Proxy transport ready for {}", address);
                        Some(transport)
                    }
                    Err(e) => {
                        tracing::error!("Proxy {} unavailable, sending directly: {}", address, e);
                        None
                    }
                }
            })
            .as_ref()
    }
}
