//! Request descriptors for provider operations.
//!
//! An operation name plus a parameter object maps to the URL, query string,
//! body and signing grade of one provider request. The client only consumes
//! [`RouteTable`]; [`MysRoutes`] is the table for the game record, sign-in,
//! ledger and community endpoints.

use reqwest::Method;
use serde_json::{Value, json};
use url::form_urlencoded;

use crate::error::{ApiError, Result};
use crate::server::{Game, ServerCode, ServerFamily};

const GENSHIN_SIGN_ACT: &str = "e202009291139501";
const GENSHIN_OS_SIGN_ACT: &str = "e202102251931481";
const STAR_RAIL_SIGN_ACT: &str = "e202304121516551";
const STAR_RAIL_OS_SIGN_ACT: &str = "e202303301540311";
const LANG: &str = "zh-cn";

/// Signing grade a request needs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignStrength {
    /// DS over query and body
    #[default]
    Standard,
    /// Sign-in DS plus device headers
    SignIn,
}

/// Everything needed to issue one provider request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub url: String,
    pub query: String,
    /// Serialized JSON body; `None` for GET requests
    pub body: Option<String>,
    pub sign: SignStrength,
}

impl RequestDescriptor {
    pub fn get(url: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: query.into(),
            body: None,
            sign: SignStrength::Standard,
        }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: String::new(),
            body: Some(body.into()),
            sign: SignStrength::Standard,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    #[must_use]
    pub fn signed_in(mut self) -> Self {
        self.sign = SignStrength::SignIn;
        self
    }

    /// POST when a body is present, GET otherwise
    pub fn method(&self) -> Method {
        if self.body.is_some() {
            Method::POST
        } else {
            Method::GET
        }
    }

    /// URL with the query string appended
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            self.url.clone()
        } else {
            format!("{}?{}", self.url, self.query)
        }
    }
}

/// Operation table consumed by the client.
///
/// Names the table does not serve resolve to [`ApiError::UnknownOperation`];
/// a known operation called without one of its required parameters resolves
/// to [`ApiError::MissingParameter`]. Neither may panic.
pub trait RouteTable: Send + Sync {
    fn describe(&self, operation: &str, params: &Value) -> Result<RequestDescriptor>;
}

/// Base URLs of the provider deployments, each ending in `/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hosts {
    pub takumi: String,
    pub record: String,
    pub hk4e: String,
    pub record_os: String,
    pub hk4e_os: String,
    pub public_os: String,
    pub bbs: String,
    pub bbs_static: String,
}

impl Default for Hosts {
    fn default() -> Self {
        Self {
            takumi: "https://api-takumi.mihoyo.com/".to_string(),
            record: "https://api-takumi-record.mihoyo.com/".to_string(),
            hk4e: "https://hk4e-api.mihoyo.com/".to_string(),
            record_os: "https://bbs-api-os.hoyolab.com/".to_string(),
            hk4e_os: "https://sg-hk4e-api.hoyolab.com/".to_string(),
            public_os: "https://sg-public-api.hoyolab.com/".to_string(),
            bbs: "https://bbs-api.mihoyo.com/".to_string(),
            bbs_static: "https://bbs-api-static.mihoyo.com/".to_string(),
        }
    }
}

impl Hosts {
    /// Point every deployment at one base URL
    pub fn uniform(base: &str) -> Self {
        let base = format!("{}/", base.trim_end_matches('/'));
        Self {
            takumi: base.clone(),
            record: base.clone(),
            hk4e: base.clone(),
            record_os: base.clone(),
            hk4e_os: base.clone(),
            public_os: base.clone(),
            bbs: base.clone(),
            bbs_static: base,
        }
    }
}

/// Route table for one account
#[derive(Debug, Clone)]
pub struct MysRoutes {
    uid: String,
    server: ServerCode,
    hosts: Hosts,
}

impl MysRoutes {
    pub fn new(uid: impl Into<String>, server: ServerCode) -> Self {
        Self::with_hosts(uid, server, Hosts::default())
    }

    pub fn with_hosts(uid: impl Into<String>, server: ServerCode, hosts: Hosts) -> Self {
        Self {
            uid: uid.into(),
            server,
            hosts,
        }
    }

    fn record_base(&self) -> String {
        let (host, segment) = match (self.server.game(), self.server.family()) {
            (Game::Genshin, ServerFamily::Domestic) => (&self.hosts.record, "app/genshin"),
            (Game::Genshin, ServerFamily::Overseas) => (&self.hosts.record_os, "genshin"),
            (Game::StarRail, ServerFamily::Domestic) => (&self.hosts.record, "app/hkrpg"),
            (Game::StarRail, ServerFamily::Overseas) => (&self.hosts.record_os, "hkrpg"),
        };
        format!("{host}game_record/{segment}/api/")
    }

    fn role_query(&self) -> String {
        query(&[("role_id", self.uid.clone()), ("server", self.server.as_str().to_string())])
    }

    fn role_body(&self) -> Result<String> {
        Ok(serde_json::to_string(&json!({
            "role_id": self.uid,
            "server": self.server.as_str(),
        }))?)
    }

    fn sign_in(&self, action: &str) -> Result<RequestDescriptor> {
        let server = self.server.as_str();
        let (base, act_id) = match (self.server.game(), self.server.family()) {
            (Game::Genshin, ServerFamily::Domestic) => (
                format!("{}event/bbs_sign_reward/", self.hosts.takumi),
                GENSHIN_SIGN_ACT,
            ),
            (Game::Genshin, ServerFamily::Overseas) => {
                (format!("{}event/sol/", self.hosts.hk4e_os), GENSHIN_OS_SIGN_ACT)
            }
            (Game::StarRail, ServerFamily::Domestic) => {
                (format!("{}event/luna/", self.hosts.takumi), STAR_RAIL_SIGN_ACT)
            }
            (Game::StarRail, ServerFamily::Overseas) => (
                format!("{}event/luna/os/", self.hosts.public_os),
                STAR_RAIL_OS_SIGN_ACT,
            ),
        };
        let url = format!("{base}{action}");

        let descriptor = match (action, self.server.family()) {
            ("sign", ServerFamily::Domestic) => RequestDescriptor::post(
                url,
                serde_json::to_string(&json!({
                    "act_id": act_id,
                    "region": server,
                    "uid": self.uid,
                    "lang": LANG,
                }))?,
            ),
            ("sign", ServerFamily::Overseas) => RequestDescriptor::post(
                url,
                serde_json::to_string(&json!({ "act_id": act_id, "lang": LANG }))?,
            ),
            (_, ServerFamily::Domestic) => RequestDescriptor::get(
                url,
                query(&[
                    ("act_id", act_id.to_string()),
                    ("region", server.to_string()),
                    ("uid", self.uid.clone()),
                ]),
            ),
            (_, ServerFamily::Overseas) => RequestDescriptor::get(
                url,
                query(&[("act_id", act_id.to_string()), ("lang", LANG.to_string())]),
            ),
        };
        Ok(descriptor.signed_in())
    }

    fn ledger(&self, operation: &str, params: &Value) -> Result<RequestDescriptor> {
        if self.server.is_overseas() {
            return Err(ApiError::UnknownOperation(operation.to_string()));
        }
        let month = param(params, "month").unwrap_or_else(|| "0".to_string());
        let server = self.server.as_str().to_string();
        Ok(match self.server.game() {
            Game::Genshin => RequestDescriptor::get(
                format!("{}event/ys_ledger/monthInfo", self.hosts.hk4e),
                query(&[
                    ("month", month),
                    ("bind_uid", self.uid.clone()),
                    ("bind_region", server),
                ]),
            ),
            Game::StarRail => RequestDescriptor::get(
                format!("{}event/srledger/month_info", self.hosts.takumi),
                query(&[("uid", self.uid.clone()), ("region", server), ("month", month)]),
            ),
        })
    }

    fn community(&self, operation: &str, params: &Value) -> Result<RequestDescriptor> {
        let gids = self.server.game().forum_id().to_string();
        let descriptor = match operation {
            "newsList" => RequestDescriptor::get(
                format!("{}painter/wapi/getNewsList", self.hosts.bbs_static),
                query(&[
                    ("gids", gids),
                    (
                        "page_size",
                        param(params, "page_size").unwrap_or_else(|| "20".to_string()),
                    ),
                    ("type", param(params, "type").unwrap_or_else(|| "1".to_string())),
                ]),
            ),
            "postFull" => RequestDescriptor::get(
                format!("{}post/wapi/getPostFull", self.hosts.bbs),
                query(&[
                    ("gids", gids),
                    ("read", "1".to_string()),
                    ("post_id", required(params, operation, "post_id")?),
                ]),
            ),
            "searchPosts" => RequestDescriptor::get(
                format!("{}post/wapi/searchPosts", self.hosts.bbs),
                query(&[
                    ("gids", gids),
                    ("size", param(params, "size").unwrap_or_else(|| "20".to_string())),
                    ("keyword", required(params, operation, "keyword")?),
                ]),
            ),
            _ => return Err(ApiError::UnknownOperation(operation.to_string())),
        };
        Ok(descriptor)
    }
}

impl RouteTable for MysRoutes {
    fn describe(&self, operation: &str, params: &Value) -> Result<RequestDescriptor> {
        let game = self.server.game();
        match operation {
            "index" => Ok(RequestDescriptor::get(
                format!("{}index", self.record_base()),
                self.role_query(),
            )),
            "note" | "dailyNote" => {
                let endpoint = match game {
                    Game::Genshin => "dailyNote",
                    Game::StarRail => "note",
                };
                Ok(RequestDescriptor::get(
                    format!("{}{endpoint}", self.record_base()),
                    self.role_query(),
                ))
            }
            "spiralAbyss" if game == Game::Genshin => Ok(RequestDescriptor::get(
                format!("{}spiralAbyss", self.record_base()),
                query(&[
                    ("role_id", self.uid.clone()),
                    (
                        "schedule_type",
                        param(params, "schedule_type").unwrap_or_else(|| "1".to_string()),
                    ),
                    ("server", self.server.as_str().to_string()),
                ]),
            )),
            "character" => {
                let endpoint = match game {
                    Game::Genshin => "character",
                    Game::StarRail => "avatar/info",
                };
                Ok(RequestDescriptor::post(
                    format!("{}{endpoint}", self.record_base()),
                    self.role_body()?,
                ))
            }
            "bbs_sign_info" => self.sign_in("info"),
            "bbs_sign_home" => self.sign_in("home"),
            "bbs_sign" => self.sign_in("sign"),
            "ys_ledger" if game == Game::Genshin => self.ledger(operation, params),
            "sr_ledger" if game == Game::StarRail => self.ledger(operation, params),
            _ => self.community(operation, params),
        }
    }
}

/// Encode `pairs` in the given order
fn query(pairs: &[(&str, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Parameter an operation cannot be described without
fn required(params: &Value, operation: &str, key: &'static str) -> Result<String> {
    param(params, key).ok_or_else(|| ApiError::MissingParameter {
        operation: operation.to_string(),
        name: key,
    })
}

/// String form of a scalar parameter
fn param(params: &Value, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn routes(uid: &str, game: Game) -> MysRoutes {
        MysRoutes::new(uid, ServerCode::resolve(uid, game))
    }

    #[test]
    fn test_unknown_operation() {
        assert!(matches!(
            routes("100000001", Game::Genshin).describe("nope", &json!({})),
            Err(ApiError::UnknownOperation(op)) if op == "nope"
        ));
    }

    #[test]
    fn test_genshin_daily_note() {
        let descriptor = routes("100000001", Game::Genshin)
            .describe("dailyNote", &json!({}))
            .unwrap();
        assert_eq!(
            descriptor.url,
            "https://api-takumi-record.mihoyo.com/game_record/app/genshin/api/dailyNote"
        );
        assert_eq!(descriptor.query, "role_id=100000001&server=cn_gf01");
        assert_eq!(descriptor.method(), Method::GET);
        assert_eq!(descriptor.sign, SignStrength::Standard);
    }

    #[test]
    fn test_note_alias_per_game() {
        let genshin = routes("100000001", Game::Genshin).describe("note", &json!({})).unwrap();
        let star_rail = routes("100000001", Game::StarRail).describe("note", &json!({})).unwrap();
        assert!(genshin.url.ends_with("/app/genshin/api/dailyNote"));
        assert!(star_rail.url.ends_with("/app/hkrpg/api/note"));
        assert_eq!(star_rail.query, "role_id=100000001&server=prod_gf_cn");
    }

    #[test]
    fn test_overseas_record_host() {
        let descriptor = routes("800000001", Game::Genshin).describe("index", &json!({})).unwrap();
        assert_eq!(
            descriptor.full_url(),
            "https://bbs-api-os.hoyolab.com/game_record/genshin/api/index?role_id=800000001&server=os_asia"
        );
    }

    #[test]
    fn test_character_is_post() {
        let descriptor = routes("100000001", Game::Genshin)
            .describe("character", &json!({}))
            .unwrap();
        assert_eq!(descriptor.method(), Method::POST);
        assert_eq!(
            descriptor.body.as_deref(),
            Some(r#"{"role_id":"100000001","server":"cn_gf01"}"#)
        );
        assert!(descriptor.query.is_empty());
    }

    #[test]
    fn test_spiral_abyss_schedule() {
        let table = routes("100000001", Game::Genshin);
        let current = table.describe("spiralAbyss", &json!({})).unwrap();
        let previous = table
            .describe("spiralAbyss", &json!({ "schedule_type": 2 }))
            .unwrap();
        assert!(current.query.contains("schedule_type=1"));
        assert!(previous.query.contains("schedule_type=2"));
        assert!(matches!(
            routes("100000001", Game::StarRail).describe("spiralAbyss", &json!({})),
            Err(ApiError::UnknownOperation(_))
        ));
    }

    #[test]
    fn test_sign_operations_need_sign_in_grade() {
        for uid in ["100000001", "700000001"] {
            for game in [Game::Genshin, Game::StarRail] {
                let table = routes(uid, game);
                for op in ["bbs_sign_info", "bbs_sign_home", "bbs_sign"] {
                    let descriptor = table.describe(op, &json!({})).unwrap();
                    assert_eq!(descriptor.sign, SignStrength::SignIn, "{uid} {game} {op}");
                }
                assert_eq!(
                    table.describe("bbs_sign", &json!({})).unwrap().method(),
                    Method::POST
                );
            }
        }
    }

    #[test]
    fn test_domestic_sign_query() {
        let descriptor = routes("100000001", Game::Genshin)
            .describe("bbs_sign_info", &json!({}))
            .unwrap();
        assert_eq!(
            descriptor.full_url(),
            "https://api-takumi.mihoyo.com/event/bbs_sign_reward/info?act_id=e202009291139501&region=cn_gf01&uid=100000001"
        );
    }

    #[test]
    fn test_ledger_domestic_only() {
        let descriptor = routes("100000001", Game::Genshin)
            .describe("ys_ledger", &json!({ "month": 5 }))
            .unwrap();
        assert_eq!(descriptor.query, "month=5&bind_uid=100000001&bind_region=cn_gf01");
        assert!(matches!(
            routes("600000001", Game::Genshin).describe("ys_ledger", &json!({ "month": 5 })),
            Err(ApiError::UnknownOperation(_))
        ));
        assert!(matches!(
            routes("100000001", Game::Genshin).describe("sr_ledger", &json!({})),
            Err(ApiError::UnknownOperation(_))
        ));
    }

    #[test]
    fn test_news_list_uses_forum_id() {
        let genshin = routes("100000001", Game::Genshin)
            .describe("newsList", &json!({ "type": 3 }))
            .unwrap();
        let star_rail = routes("100000001", Game::StarRail)
            .describe("newsList", &json!({}))
            .unwrap();
        assert_eq!(genshin.query, "gids=2&page_size=20&type=3");
        assert_eq!(star_rail.query, "gids=6&page_size=20&type=1");
    }

    #[test]
    fn test_search_encodes_keyword() {
        let descriptor = routes("100000001", Game::Genshin)
            .describe("searchPosts", &json!({ "keyword": "版本 更新" }))
            .unwrap();
        assert!(descriptor.query.starts_with("gids=2&size=20&keyword="));
        assert!(!descriptor.query.contains(' '));
    }

    #[test]
    fn test_missing_required_parameter() {
        let table = routes("100000001", Game::Genshin);
        assert!(matches!(
            table.describe("searchPosts", &json!({})),
            Err(ApiError::MissingParameter { ref operation, name: "keyword" }) if operation == "searchPosts"
        ));
        assert!(matches!(
            table.describe("postFull", &json!({ "post_id": null })),
            Err(ApiError::MissingParameter { name: "post_id", .. })
        ));
        let err = table.describe("postFull", &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Missing parameter post_id for postFull");
        assert!(err.is_local());
        assert!(table.describe("postFull", &json!({ "post_id": 12345 })).is_ok());
    }

    #[test]
    fn test_uniform_hosts() {
        let table = MysRoutes::with_hosts(
            "100000001",
            ServerCode::GenshinOfficial,
            Hosts::uniform("http://127.0.0.1:9000"),
        );
        let descriptor = table.describe("index", &json!({})).unwrap();
        assert_eq!(
            descriptor.url,
            "http://127.0.0.1:9000/game_record/app/genshin/api/index"
        );
    }
}
