//! Upload results
//!
//! The API's response shape is not fixed, so a result is the decoded JSON
//! object as-is. Failures the client synthesizes itself use the same shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `status` value of client-side failures
pub const STATUS_ERROR: &str = "error";

/// `message` of the invalid JSON failure
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON response";

/// Decoded response body of an upload call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadResult(Map<String, Value>);

/// Tagged view over an [`UploadResult`]
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome<'a> {
    /// `success` is `true`
    Success(&'a Map<String, Value>),
    /// anything else
    Failure {
        status: Option<&'a str>,
        message: Option<&'a str>,
        raw: Option<&'a str>,
    },
}

/// One uploaded file as reported by the API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nextcloud_path: Option<String>,
}

impl UploadResult {
    /// Wrap a decoded JSON object
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// `{success: false, status: "error", message}` for a request that never got an answer
    pub fn transport_failure(message: impl Into<String>) -> Self {
        let mut map = failure_map();
        map.insert("message".to_string(), Value::String(message.into()));
        Self(map)
    }

    /// `{success: false, status: "error", message: "Invalid JSON response", raw}`
    pub fn invalid_json(raw: impl Into<String>) -> Self {
        let mut map = failure_map();
        map.insert("message".to_string(), Value::String(INVALID_JSON_MESSAGE.to_string()));
        map.insert("raw".to_string(), Value::String(raw.into()));
        Self(map)
    }

    /// The `success` flag, if the body has a boolean one
    pub fn success(&self) -> Option<bool> {
        self.0.get("success").and_then(Value::as_bool)
    }

    /// `true` only when the body explicitly says `success: true`
    pub fn is_success(&self) -> bool {
        self.success() == Some(true)
    }

    pub fn status(&self) -> Option<&str> {
        self.get_str("status")
    }

    pub fn message(&self) -> Option<&str> {
        self.get_str("message")
    }

    /// Undecodable body text; only present on the invalid JSON failure
    pub fn raw(&self) -> Option<&str> {
        self.get_str("raw")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Best-effort typed view of the `files` array. Entries that do not
    /// decode are skipped.
    pub fn files(&self) -> Vec<UploadedFile> {
        self.0
            .get("files")
            .and_then(Value::as_array)
            .map(|files| {
                files
                    .iter()
                    .filter_map(|f| serde_json::from_value(f.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn outcome(&self) -> UploadOutcome<'_> {
        if self.is_success() {
            UploadOutcome::Success(&self.0)
        } else {
            UploadOutcome::Failure {
                status: self.status(),
                message: self.message(),
                raw: self.raw(),
            }
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

impl From<UploadResult> for Value {
    fn from(result: UploadResult) -> Self {
        Value::Object(result.0)
    }
}

fn failure_map() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("success".to_string(), Value::Bool(false));
    map.insert("status".to_string(), Value::String(STATUS_ERROR.to_string()));
    map
}
