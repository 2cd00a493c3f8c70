//! Request dispatcher for one account.
//!
//! [`MysApi`] ties the pieces together: the route table describes the
//! request, the cache short-circuits it when the caller opts in, headers are
//! signed per request and the response is normalized and written back.

use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use mys_cache::KeyValueStore;

use crate::cache::ResponseCache;
use crate::config::ClientConfig;
use crate::device::DeviceIdentity;
use crate::error::{ApiError, Result};
use crate::headers;
use crate::proxy::ProxyResolver;
use crate::response::{self, ApiResponse};
use crate::routes::{MysRoutes, RequestDescriptor, RouteTable};
use crate::server::{Game, ServerCode};
use crate::transport::HttpTransport;

/// Account cookie. Never printed.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self(cookie.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// API client bound to one account and game
pub struct MysApi {
    uid: String,
    cookie: Credential,
    game: Game,
    server: ServerCode,
    device: DeviceIdentity,
    routes: Arc<dyn RouteTable>,
    cache: Option<ResponseCache>,
    transport: HttpTransport,
    proxy: ProxyResolver,
    config: ClientConfig,
}

impl std::fmt::Debug for MysApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MysApi")
            .field("uid", &self.uid)
            .field("cookie", &self.cookie)
            .field("game", &self.game)
            .field("server", &self.server)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl MysApi {
    /// Create a client with default configuration
    pub fn new(uid: impl Into<String>, cookie: impl Into<String>, game: Game) -> Result<Self> {
        Self::with_config(uid, cookie, game, ClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(
        uid: impl Into<String>,
        cookie: impl Into<String>,
        game: Game,
        config: ClientConfig,
    ) -> Result<Self> {
        let uid = uid.into();
        let server = ServerCode::resolve(&uid, game);
        let device = DeviceIdentity::new(uid.clone()).with_device_id(config.device_id.clone());
        let routes = Arc::new(MysRoutes::new(uid.clone(), server));

        tracing::debug!("Creating client for {} on {}", uid, server);

        Ok(Self {
            transport: HttpTransport::new(&config)?,
            proxy: ProxyResolver::new(&config),
            uid,
            cookie: Credential::new(cookie),
            game,
            server,
            device,
            routes,
            cache: None,
            config,
        })
    }

    /// Replace the operation table
    #[must_use]
    pub fn with_routes(mut self, routes: Arc<dyn RouteTable>) -> Self {
        self.routes = routes;
        self
    }

    /// Enable response caching over a shared store
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.cache = Some(ResponseCache::new(store, self.config.cache_ttl));
        self
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn server(&self) -> ServerCode {
        self.server
    }

    pub fn device(&self) -> &DeviceIdentity {
        &self.device
    }

    pub fn game(&self) -> Game {
        self.game
    }

    /// Run `operation` and return the tagged response.
    ///
    /// Every failure is logged here and collapses to `None`; callers should
    /// not log or retry again. Provider application errors (non-zero
    /// `retcode`) are returned as data.
    pub async fn fetch(
        &self,
        operation: &str,
        params: Value,
        use_cache: bool,
    ) -> Option<ApiResponse> {
        match self.try_fetch(operation, params, use_cache).await {
            Ok(response) => Some(response),
            Err(e) => {
                match &e {
                    ApiError::EmptyResponse | ApiError::Malformed(_) => {
                        tracing::warn!("[mys][{}][{}] {}", operation, self.uid, e);
                    }
                    _ => tracing::error!("[mys][{}][{}] {}", operation, self.uid, e),
                }
                None
            }
        }
    }

    /// Same as [`fetch`](Self::fetch) but keeps the failure kind
    pub async fn try_fetch(
        &self,
        operation: &str,
        mut params: Value,
        use_cache: bool,
    ) -> Result<ApiResponse> {
        let overrides = take_header_overrides(&mut params);

        let descriptor = self.routes.describe(operation, &params)?;

        let cache = self.cache.as_ref().filter(|_| use_cache);
        let key = cache.map(|_| ResponseCache::key(&self.uid, operation, &params));

        if let (Some(cache), Some(key)) = (cache, key.as_deref()) {
            match cache.get(key).await {
                Ok(Some(hit)) => {
                    tracing::debug!("[mys][{}][{}] cache hit", operation, self.uid);
                    return Ok(hit);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Cache read failed for {}: {}", key, e),
            }
        }

        let started = Instant::now();
        let body = self.send(&descriptor, overrides).await?;
        if self.config.log_requests {
            tracing::info!(
                "[mys][{}][{}] {}ms",
                operation,
                self.uid,
                started.elapsed().as_millis()
            );
        }

        let response = response::normalize(&body, operation)?;

        if !response.is_success() && self.config.log_requests {
            tracing::debug!(
                "[mys][{}][{}] retcode {:?} from {} params {}",
                operation,
                self.uid,
                response.retcode,
                descriptor.full_url(),
                params
            );
        }

        if let (Some(cache), Some(key)) = (cache, key.as_deref())
            && let Err(e) = cache.put(key, &response).await
        {
            tracing::warn!("Cache write failed for {}: {}", key, e);
        }

        Ok(response)
    }

    async fn send(
        &self,
        descriptor: &RequestDescriptor,
        overrides: Vec<(HeaderName, HeaderValue)>,
    ) -> Result<String> {
        let mut headers = self.request_headers(descriptor)?;
        for (name, value) in overrides {
            headers.insert(name, value);
        }

        let transport = match self.proxy.transport_for(self.server) {
            Some(proxied) => {
                tracing::debug!("Routing {} through proxy", self.server);
                proxied
            }
            None => &self.transport,
        };

        let mut request = transport
            .inner()
            .request(descriptor.method(), descriptor.full_url())
            .headers(headers)
            .timeout(transport.timeout());
        if let Some(body) = &descriptor.body {
            request = request.body(body.clone());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status));
        }

        Ok(response.text().await?)
    }

    fn request_headers(&self, descriptor: &RequestDescriptor) -> Result<HeaderMap> {
        let mut headers = headers::build(
            self.server.family(),
            &self.device,
            &descriptor.query,
            descriptor.body.as_deref().unwrap_or_default(),
            descriptor.sign,
        )?;
        headers.insert(
            COOKIE,
            HeaderValue::from_str(self.cookie.expose())
                .map_err(|_| ApiError::InvalidHeader("cookie"))?,
        );
        if descriptor.body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        Ok(headers)
    }
}

/// Remove a `headers` object from `params` and turn it into header pairs.
///
/// Entries that are not valid header names or values are skipped.
fn take_header_overrides(params: &mut Value) -> Vec<(HeaderName, HeaderValue)> {
    let Some(Value::Object(map)) = params.as_object_mut().and_then(|p| p.remove("headers"))
    else {
        return Vec::new();
    };

    map.into_iter()
        .filter_map(|(name, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => Some((name, value)),
                _ => {
                    tracing::warn!("Ignoring invalid header override {}", name);
                    None
                }
            }
        })
        .collect()
}
