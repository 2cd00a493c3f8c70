//! Signed, region-aware client for the miHoYo and HoYoLAB APIs
//!
//! [`MysApi`] issues requests for one game account. For every call it:
//!
//! - resolves the game server from the account id ([`ServerCode::resolve`])
//! - describes the request through a [`RouteTable`]
//! - answers from the shared response cache when the caller opts in
//! - signs the request with a fresh DS token and attaches the cookie
//! - routes overseas traffic through the configured proxy, if any
//! - normalizes the body (JSONP wrapping included) and tags it with the
//!   operation name
//!
//! Failures never surface as panics. [`MysApi::fetch`] logs them and returns
//! `None`; [`MysApi::try_fetch`] returns the [`ApiError`] instead. Responses
//! with a non-zero `retcode` are returned as data and are never cached.
//!
//! # Example
//!
//! ```rust,no_run
//! use mys_api::{Game, MysApi};
//! use mys_cache::{MemoryStore, MemoryStoreConfig};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new(MemoryStoreConfig::default())?);
//! let api = MysApi::new("100000001", "ltuid=...; ltoken=...", Game::Genshin)?
//!     .with_store(store);
//!
//! if let Some(note) = api.fetch("dailyNote", json!({}), true).await {
//!     println!("{}: {}", note.api, note.data);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod device;
pub mod ds;
pub mod error;
pub mod headers;
pub mod proxy;
pub mod response;
pub mod routes;
pub mod server;
pub mod transport;

pub use cache::ResponseCache;
pub use client::{Credential, MysApi};
pub use config::{ClientConfig, NULL_PROXY};
pub use device::DeviceIdentity;
pub use error::{ApiError, Result};
pub use proxy::ProxyResolver;
pub use response::ApiResponse;
pub use routes::{Hosts, MysRoutes, RequestDescriptor, RouteTable, SignStrength};
pub use server::{Game, ServerCode, ServerFamily};
pub use transport::HttpTransport;
