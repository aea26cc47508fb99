//! Request bridge to the daemon.
//!
//! `RequestClient::request` turns one control channel exchange into a single
//! awaited call: the transport future races a timer, a late reply is dropped
//! (aborting the exchange), and the outcome is classified as a JSON object,
//! not-found, a transport failure, or a malformed reply.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use hyper::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{trace, warn};

use crate::transport::{DaemonRequest, Transport, UnixSocketTransport};
use crate::wire::API_ROOT;

/// Characters left unescaped in a path segment or query value.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Failures of a single daemon request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The daemon answered 404.
    #[error("Resource not found: {url}")]
    NotFound { url: String },

    /// Any other failed exchange: I/O, non-success status, timeout.
    #[error("{url}: {message}")]
    Transport { url: String, message: String },

    /// The reply body is not a single JSON object.
    #[error("Invalid daemon response for {url}: {message}")]
    MalformedResponse { url: String, message: String },
}

impl RequestError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RequestError::NotFound { .. })
    }

    /// The url of the failed request.
    pub fn url(&self) -> &str {
        match self {
            RequestError::NotFound { url }
            | RequestError::Transport { url, .. }
            | RequestError::MalformedResponse { url, .. } => url,
        }
    }
}

/// Daemon API client scoped to one project namespace.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct RequestClient {
    transport: Arc<dyn Transport>,
    project: String,
}

impl RequestClient {
    /// Create a client over an arbitrary transport.
    pub fn new(transport: Arc<dyn Transport>, project: impl Into<String>) -> Self {
        Self {
            transport,
            project: project.into(),
        }
    }

    /// Create a client talking to the daemon socket at `socket_path`.
    pub fn unix<P: AsRef<Path>>(socket_path: P, project: impl Into<String>) -> Self {
        Self::new(Arc::new(UnixSocketTransport::new(socket_path)), project)
    }

    /// Build the path and query for a resource below the API root.
    ///
    /// Each segment of `path` and the project are percent-encoded, so
    /// instance names may contain spaces or `?`.
    pub fn url(&self, path: &str) -> String {
        let segments: Vec<String> = path
            .trim_start_matches('/')
            .split('/')
            .map(|segment| utf8_percent_encode(segment, COMPONENT).to_string())
            .collect();

        format!(
            "{}/{}?project={}",
            API_ROOT,
            segments.join("/"),
            utf8_percent_encode(&self.project, COMPONENT)
        )
    }

    /// Issue one request and wait for its JSON object reply.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        timeout: Duration,
    ) -> Result<Map<String, Value>, RequestError> {
        let url = self.url(path);
        trace!(method = %method, url = %url, "Requesting daemon");

        let body = match body {
            Some(json) => {
                let data = serde_json::to_vec(json).map_err(|e| RequestError::Transport {
                    url: url.clone(),
                    message: e.to_string(),
                })?;
                trace!(data = %String::from_utf8_lossy(&data), "Sending data");
                Some(Bytes::from(data))
            }
            None => None,
        };

        let request = DaemonRequest {
            method: method.clone(),
            path_and_query: url.clone(),
            body,
        };

        let response = match tokio::time::timeout(timeout, self.transport.send(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(RequestError::Transport {
                    url,
                    message: e.to_string(),
                })
            }
            Err(_) => {
                warn!(method = %method, url = %url, "Request timed out");
                return Err(RequestError::Transport {
                    url,
                    message: format!("request timed out after {}ms", timeout.as_millis()),
                });
            }
        };

        if response.status == 404 {
            return Err(RequestError::NotFound { url });
        }

        if !(200..300).contains(&response.status) {
            return Err(RequestError::Transport {
                message: error_message(response.status, &response.body),
                url,
            });
        }

        let reply: Value =
            serde_json::from_slice(&response.body).map_err(|e| RequestError::MalformedResponse {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let Value::Object(reply) = reply else {
            return Err(RequestError::MalformedResponse {
                message: format!("expected a JSON object, got {}", String::from_utf8_lossy(&response.body)),
                url,
            });
        };

        let decoded = serde_json::Value::Object(reply.clone());
        trace!(url = %url, reply = %decoded, "Got reply");

        Ok(reply)
    }

    pub async fn get(&self, path: &str, timeout: Duration) -> Result<Map<String, Value>, RequestError> {
        self.request(Method::GET, path, None, timeout).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<Map<String, Value>, RequestError> {
        self.request(Method::POST, path, Some(body), timeout).await
    }

    pub async fn delete(&self, path: &str, timeout: Duration) -> Result<Map<String, Value>, RequestError> {
        self.request(Method::DELETE, path, None, timeout).await
    }
}

/// Best description of a failed reply: the envelope's `error` if present,
/// the raw body otherwise.
fn error_message(status: u16, body: &[u8]) -> String {
    let detail = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());

    if detail.is_empty() {
        format!("daemon returned status {status}")
    } else {
        format!("daemon returned status {status}: {detail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_envelope_error() {
        let body = br#"{"type":"error","error":"not authorized","error_code":403}"#;
        assert_eq!(
            error_message(403, body),
            "daemon returned status 403: not authorized"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(
            error_message(500, b"boom\n"),
            "daemon returned status 500: boom"
        );
        assert_eq!(error_message(502, b""), "daemon returned status 502");
    }
}
