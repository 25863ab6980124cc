//! Upstream response bodies

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Top-level status code meaning success
pub const SUCCESS_CODE: &str = "10000";

/// Body of `GET vehicleHomePage`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryResponse {
    #[serde(default, deserialize_with = "code_as_string")]
    pub code: String,
    #[serde(default, alias = "msg")]
    pub message: Option<String>,
    /// Per-vehicle records, left loosely typed for the normalizer
    #[serde(default, deserialize_with = "records_or_none")]
    pub data: Option<Vec<Value>>,
}

impl TelemetryResponse {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Per-vehicle records, empty when `data` is missing
    pub fn vehicles(&self) -> &[Value] {
        self.data.as_deref().unwrap_or(&[])
    }
}

/// Body of `POST vehicleSet/network/unlock`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockResponse {
    #[serde(default, deserialize_with = "code_as_string")]
    pub code: String,
    #[serde(default, alias = "msg")]
    pub message: Option<String>,
}

impl UnlockResponse {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

/// The upstream sends `code` as a string, but numbers are accepted too
fn code_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Error replies may carry `""` or `{}` as `data`; only arrays are records
fn records_or_none<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(records) => Some(records),
        _ => None,
    })
}
