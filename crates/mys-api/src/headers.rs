//! Request header assembly.
//!
//! Domestic and overseas deployments expect different app versions,
//! user agents and referers. The template is picked from the server family;
//! the credential cookie is attached later by the dispatcher.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, REFERER, USER_AGENT};

use crate::device::DeviceIdentity;
use crate::ds;
use crate::error::{ApiError, Result};
use crate::routes::SignStrength;
use crate::server::ServerFamily;

/// Client fingerprint for one deployment family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTemplate {
    pub app_version: &'static str,
    pub client_type: &'static str,
    pub referer: &'static str,
    pub requested_with: &'static str,
    app_tag: &'static str,
}

const DOMESTIC: ClientTemplate = ClientTemplate {
    app_version: "2.40.1",
    client_type: "5",
    referer: "https://webstatic.mihoyo.com",
    requested_with: "com.mihoyo.hyperion",
    app_tag: "miHoYoBBS/2.40.1",
};

const OVERSEAS: ClientTemplate = ClientTemplate {
    app_version: "2.9.0",
    client_type: "2",
    referer: "https://webstatic-sea.hoyolab.com",
    requested_with: "com.mihoyo.hoyolab",
    app_tag: "miHoYoBBSOversea/2.9.0",
};

impl ClientTemplate {
    pub fn for_family(family: ServerFamily) -> &'static Self {
        match family {
            ServerFamily::Domestic => &DOMESTIC,
            ServerFamily::Overseas => &OVERSEAS,
        }
    }

    pub fn user_agent(&self, device_model: &str) -> String {
        format!(
            "Mozilla/5.0 (Linux; Android 12; {device_model}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/99.0.4844.73 Mobile Safari/537.36 {}",
            self.app_tag
        )
    }
}

const PLATFORM: &str = "android";
const CHANNEL: &str = "miyousheluodi";
const SYS_VERSION: &str = "6.0.1";

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<()> {
    let value = HeaderValue::from_str(value).map_err(|_| ApiError::InvalidHeader(name))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

/// Build the signed headers for one request.
///
/// Computes a fresh DS token on every call.
pub fn build(
    family: ServerFamily,
    device: &DeviceIdentity,
    query: &str,
    body: &str,
    sign: SignStrength,
) -> Result<HeaderMap> {
    let client = ClientTemplate::for_family(family);
    let mut headers = HeaderMap::new();

    insert(&mut headers, "x-rpc-app_version", client.app_version)?;
    insert(&mut headers, "x-rpc-client_type", client.client_type)?;
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&client.user_agent(device.model()))
            .map_err(|_| ApiError::InvalidHeader("user-agent"))?,
    );
    headers.insert(REFERER, HeaderValue::from_static(client.referer));

    match sign {
        SignStrength::Standard => {
            insert(&mut headers, "ds", &ds::standard(family, query, body))?;
        }
        SignStrength::SignIn => {
            insert(&mut headers, "x-rpc-device_id", device.id())?;
            insert(&mut headers, "x-requested-with", client.requested_with)?;
            insert(&mut headers, "x-rpc-platform", PLATFORM)?;
            insert(&mut headers, "x-rpc-device_model", device.model())?;
            insert(&mut headers, "x-rpc-device_name", device.model())?;
            insert(&mut headers, "x-rpc-channel", CHANNEL)?;
            insert(&mut headers, "x-rpc-sys_version", SYS_VERSION)?;
            insert(&mut headers, "ds", &ds::sign_in())?;
        }
    }

    Ok(headers)
}
