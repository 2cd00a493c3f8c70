//! End-to-end fetch tests against a stub provider

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use async_trait::async_trait;
use mys_api::{
    ApiError, ClientConfig, Game, Hosts, MysApi, MysRoutes, RequestDescriptor, RouteTable,
    ServerCode,
};
use mys_cache::{CacheError, CacheResult, KeyValueStore, MemoryStore, MemoryStoreConfig};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, header_exists, method, path, query_param},
};

const UID: &str = "123456789";
const COOKIE: &str = "ltuid=123; ltoken=secret";
const NOTE_PATH: &str = "/game_record/app/genshin/api/dailyNote";

fn note_body() -> Value {
    json!({
        "retcode": 0,
        "message": "OK",
        "data": { "current_resin": 120, "max_resin": 160 },
    })
}

fn client(server: &MockServer, config: ClientConfig) -> MysApi {
    let server_code = ServerCode::resolve(UID, Game::Genshin);
    let routes = MysRoutes::with_hosts(UID, server_code, Hosts::uniform(&server.uri()));
    MysApi::with_config(UID, COOKIE, Game::Genshin, config)
        .unwrap()
        .with_routes(Arc::new(routes))
}

fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new(MemoryStoreConfig::default()).unwrap())
}

#[tokio::test]
async fn test_fetch_without_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(NOTE_PATH))
        .and(query_param("role_id", UID))
        .and(query_param("server", "cn_gf01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(note_body()))
        .expect(1)
        .mount(&server)
        .await;

    let store = store();
    let api = client(&server, ClientConfig::default()).with_store(store.clone());

    let response = api.fetch("note", json!({ "uid": UID }), false).await.unwrap();

    assert_eq!(response.api, "note");
    assert_eq!(response.retcode, Some(0));
    assert_eq!(response.data, note_body()["data"]);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_second_call_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(NOTE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(note_body()))
        .expect(1)
        .mount(&server)
        .await;

    let store = store();
    let api = client(&server, ClientConfig::default()).with_store(store.clone());

    let first = api.fetch("note", json!({ "uid": UID }), true).await.unwrap();
    let second = api.fetch("note", json!({ "uid": UID }), true).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_cache_shared_between_clients() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(NOTE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(note_body()))
        .expect(1)
        .mount(&server)
        .await;

    let store = store();
    let first = client(&server, ClientConfig::default()).with_store(store.clone());
    let second = client(&server, ClientConfig::default()).with_store(store.clone());

    assert!(first.fetch("note", json!({ "a": 1, "b": 2 }), true).await.is_some());
    assert!(second.fetch("note", json!({ "b": 2, "a": 1 }), true).await.is_some());
}

#[tokio::test]
async fn test_http_error_is_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(NOTE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let api = client(&server, ClientConfig::default());

    assert!(api.fetch("note", json!({}), false).await.is_none());

    let err = api.try_fetch("note", json!({}), false).await.unwrap_err();
    assert!(
        matches!(err, ApiError::HttpStatus { status, .. } if status.as_u16() == 500),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_jsonp_body_matches_plain_body() {
    let server = MockServer::start().await;
    let plain = note_body().to_string();
    Mock::given(method("GET"))
        .and(path("/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_string(plain.clone()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wrapped"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("({plain})")))
        .mount(&server)
        .await;

    let api = MysApi::new(UID, COOKIE, Game::Genshin)
        .unwrap()
        .with_routes(Arc::new(StubRoutes(server.uri())));

    let plain = api.fetch("plain", json!({}), false).await.unwrap();
    let wrapped = api.fetch("wrapped", json!({}), false).await.unwrap();

    assert_eq!(wrapped.data, plain.data);
    assert_eq!(wrapped.retcode, plain.retcode);
    assert_eq!(wrapped.message, plain.message);
    assert_eq!(wrapped.api, "wrapped");
}

#[tokio::test]
async fn test_unknown_operation_never_hits_network() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200).set_body_json(note_body()))
        .expect(0)
        .mount(&server)
        .await;

    let api = client(&server, ClientConfig::default()).with_store(store());

    assert!(api.fetch("doesNotExist", json!({}), true).await.is_none());
    // Ledger has no overseas counterpart
    let overseas = MysApi::new("600000001", COOKIE, Game::Genshin)
        .unwrap()
        .with_routes(Arc::new(MysRoutes::with_hosts(
            "600000001",
            ServerCode::GenshinAmericas,
            Hosts::uniform(&server.uri()),
        )));
    assert!(matches!(
        overseas.try_fetch("ys_ledger", json!({ "month": 5 }), false).await,
        Err(ApiError::UnknownOperation(_))
    ));
}

#[tokio::test]
async fn test_empty_and_malformed_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(200).set_body_string("()"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/null"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .mount(&server)
        .await;

    let api = MysApi::new(UID, COOKIE, Game::Genshin)
        .unwrap()
        .with_routes(Arc::new(StubRoutes(server.uri())));

    assert!(api.fetch("empty", json!({}), false).await.is_none());
    assert!(matches!(
        api.try_fetch("null", json!({}), false).await,
        Err(ApiError::EmptyResponse)
    ));
    assert!(matches!(
        api.try_fetch("html", json!({}), false).await,
        Err(ApiError::Malformed(_))
    ));
}

#[tokio::test]
async fn test_application_error_returned_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(NOTE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retcode": 10001,
            "message": "Please login",
            "data": null,
        })))
        .expect(2)
        .mount(&server)
        .await;

    let store = store();
    let api = client(&server, ClientConfig::default()).with_store(store.clone());

    for _ in 0..2 {
        let response = api.fetch("note", json!({}), true).await.unwrap();
        assert_eq!(response.retcode, Some(10001));
        assert_eq!(response.message, "Please login");
        assert!(!response.is_success());
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_sign_in_request_headers() {
    let server = MockServer::start().await;
    let api = client(&server, ClientConfig::default());

    Mock::given(method("POST"))
        .and(path("/event/bbs_sign_reward/sign"))
        .and(header("cookie", COOKIE))
        .and(header("x-rpc-device_id", api.device().id()))
        .and(header("x-rpc-device_model", api.device().model()))
        .and(header("x-rpc-client_type", "5"))
        .and(header("x-rpc-platform", "android"))
        .and(header_exists("ds"))
        .and(body_json(json!({
            "act_id": "e202009291139501",
            "region": "cn_gf01",
            "uid": UID,
            "lang": "zh-cn",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retcode": 0,
            "message": "OK",
            "data": { "code": "ok" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = api.fetch("bbs_sign", json!({}), false).await.unwrap();
    assert_eq!(response.data, json!({ "code": "ok" }));
}

#[tokio::test]
async fn test_caller_header_overrides_win() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(NOTE_PATH))
        .and(header("x-rpc-app_version", "9.9.9"))
        .and(header("cookie", COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_json(note_body()))
        .expect(1)
        .mount(&server)
        .await;

    let store = store();
    let api = client(&server, ClientConfig::default()).with_store(store.clone());

    let params = json!({ "headers": { "x-rpc-app_version": "9.9.9" } });
    assert!(api.fetch("note", params, true).await.is_some());

    // Overrides are not part of the cache key
    assert!(api.fetch("note", json!({}), true).await.is_some());
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(NOTE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(note_body())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = ClientConfig::default().with_request_timeout(Duration::from_millis(200));
    let api = client(&server, config);

    let err = api.try_fetch("note", json!({}), false).await.unwrap_err();
    assert!(err.is_timeout(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_failing_store_does_not_fail_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(NOTE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(note_body()))
        .expect(2)
        .mount(&server)
        .await;

    let api = client(&server, ClientConfig::default()).with_store(Arc::new(FailingStore));

    assert!(api.fetch("note", json!({}), true).await.is_some());
    assert!(api.fetch("note", json!({}), true).await.is_some());
}

#[tokio::test]
async fn test_concurrent_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(NOTE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(note_body()))
        .mount(&server)
        .await;

    let api = Arc::new(client(&server, ClientConfig::default()).with_store(store()));

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let api = Arc::clone(&api);
            tokio::spawn(async move { api.fetch("note", json!({ "n": i }), true).await })
        })
        .collect();

    for result in futures::future::join_all(tasks).await {
        assert!(result.unwrap().is_some());
    }
}

#[tokio::test]
async fn test_missing_parameter_never_hits_network() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200).set_body_json(note_body()))
        .expect(0)
        .mount(&server)
        .await;

    let api = client(&server, ClientConfig::default());

    assert!(api.fetch("postFull", json!({}), false).await.is_none());
    assert!(matches!(
        api.try_fetch("searchPosts", json!({ "size": 5 }), false).await,
        Err(ApiError::MissingParameter { name: "keyword", .. })
    ));
}

#[tokio::test]
async fn test_loose_error_body_returned_to_caller() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(NOTE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"retcode":-100,"message":null,"data":null,"api":1}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let store = store();
    let api = client(&server, ClientConfig::default()).with_store(store.clone());

    let response = api.fetch("note", json!({}), true).await.unwrap();
    assert_eq!(response.retcode, Some(-100));
    assert_eq!(response.message, "");
    assert_eq!(response.api, "note");
    assert!(store.is_empty());
}

/// Maps the operation name straight onto a path of the stub server
struct StubRoutes(String);

impl RouteTable for StubRoutes {
    fn describe(&self, operation: &str, _params: &Value) -> mys_api::Result<RequestDescriptor> {
        Ok(RequestDescriptor::get(format!("{}/{operation}", self.0), ""))
    }
}

struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn set_ex(&self, _key: &str, _ttl: Duration, _value: String) -> CacheResult<()> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn remove(&self, _key: &str) -> CacheResult<bool> {
        Err(CacheError::Backend("connection refused".to_string()))
    }
}
