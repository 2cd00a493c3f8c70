//! Provider response normalization

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiError, Result};

/// Provider response tagged with the operation that produced it.
///
/// Fields other than `retcode`, `message` and `data` are kept in `extra`
/// so nothing the provider sent is lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Provider status; absent when missing or not an integer
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_retcode"
    )]
    pub retcode: Option<i64>,

    #[serde(default, deserialize_with = "lenient_message")]
    pub message: String,

    #[serde(default)]
    pub data: Value,

    /// Operation name
    #[serde(default)]
    pub api: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiResponse {
    /// `retcode == 0` is the only success status
    pub fn is_success(&self) -> bool {
        self.retcode == Some(0)
    }
}

fn lenient_retcode<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<i64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_i64(),
        _ => None,
    })
}

fn lenient_message<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Strip exactly one pair of wrapping parentheses (JSONP-style callback)
fn unwrap_jsonp(body: &str) -> &str {
    let trimmed = body.trim();
    trimmed
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(trimmed)
}

#[allow(clippy::float_cmp)]
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Parse a raw response body and tag it with `operation`
pub fn normalize(body: &str, operation: &str) -> Result<ApiResponse> {
    let mut value: Value = serde_json::from_str(unwrap_jsonp(body))?;
    if is_empty(&value) {
        return Err(ApiError::EmptyResponse);
    }
    if let Value::Object(map) = &mut value {
        map.remove("api");
    }

    let mut response: ApiResponse = serde_json::from_value(value)?;
    response.api = operation.to_string();
    Ok(response)
}
