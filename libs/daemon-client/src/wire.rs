//! Daemon response envelope.
//!
//! Every reply is a JSON object of the form
//!
//! ```json
//! {"type": "async", "status": "Operation created", "status_code": 100,
//!  "operation": "/1.0/operations/<id>", "error_code": 0, "error": "",
//!  "metadata": { ... }}
//! ```
//!
//! The request bridge hands back the raw object; callers decode the parts
//! they need with the helpers here.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use vmvault_id::OperationId;

/// Version prefix of every daemon path.
pub const API_ROOT: &str = "/1.0";

/// Envelope type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Sync,
    Async,
    Error,
}

/// Decoded response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub error_code: u16,
    #[serde(default)]
    pub error: String,
    pub metadata: T,
}

/// Decode a reply object into a typed envelope.
pub fn decode<T: DeserializeOwned>(reply: &Map<String, Value>) -> serde_json::Result<Envelope<T>> {
    serde_json::from_value(Value::Object(reply.clone()))
}

/// Returns the `metadata` object of a reply, or an empty map.
pub fn metadata(reply: &Map<String, Value>) -> &Map<String, Value> {
    static EMPTY: std::sync::OnceLock<Map<String, Value>> = std::sync::OnceLock::new();
    reply
        .get("metadata")
        .and_then(Value::as_object)
        .unwrap_or_else(|| EMPTY.get_or_init(Map::new))
}

/// Extracts the operation ID from an async reply.
///
/// Prefers `metadata.id` and falls back to the trailing segment of the
/// `operation` path.
pub fn operation_id(reply: &Map<String, Value>) -> Option<OperationId> {
    if let Some(id) = metadata(reply).get("id").and_then(Value::as_str) {
        if let Ok(id) = OperationId::parse(id) {
            return Some(id);
        }
    }

    reply
        .get("operation")
        .and_then(Value::as_str)
        .and_then(|path| OperationId::from_operation_path(path).ok())
}

/// Returns the string value of `key`, or "" when absent.
pub fn str_field<'a>(object: &'a Map<String, Value>, key: &str) -> &'a str {
    object.get(key).and_then(Value::as_str).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_operation_id_from_metadata() {
        let reply = object(json!({
            "type": "async",
            "operation": "/1.0/operations/ignored",
            "metadata": {"id": "0a19a412-03d0-4118-bee8-a3095f06d4da"}
        }));
        assert_eq!(
            operation_id(&reply).unwrap().as_str(),
            "0a19a412-03d0-4118-bee8-a3095f06d4da"
        );
    }

    #[test]
    fn test_operation_id_from_path() {
        let reply = object(json!({
            "type": "async",
            "operation": "/1.0/operations/abc-123",
            "metadata": null
        }));
        assert_eq!(operation_id(&reply).unwrap().as_str(), "abc-123");
    }

    #[test]
    fn test_operation_id_missing() {
        let reply = object(json!({"type": "sync", "metadata": {}}));
        assert!(operation_id(&reply).is_none());
    }

    #[test]
    fn test_operation_id_empty_path() {
        let reply = object(json!({
            "type": "async",
            "operation": "/1.0/operations/",
            "metadata": null
        }));
        assert!(operation_id(&reply).is_none());
    }

    #[test]
    fn test_decode_envelope() {
        let reply = object(json!({
            "type": "sync",
            "status": "Success",
            "status_code": 200,
            "metadata": {"fingerprint": "e3b0"}
        }));
        let envelope: Envelope<Map<String, Value>> = decode(&reply).unwrap();
        assert_eq!(envelope.kind, ResponseKind::Sync);
        assert_eq!(envelope.status_code, 200);
        assert_eq!(str_field(&envelope.metadata, "fingerprint"), "e3b0");
        assert!(envelope.error.is_empty());
    }

    #[test]
    fn test_metadata_defaults_to_empty() {
        let reply = object(json!({"type": "sync", "metadata": null}));
        assert!(metadata(&reply).is_empty());
    }
}
