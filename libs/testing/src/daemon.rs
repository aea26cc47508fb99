//! Scripted daemon transport.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use vmvault_daemon_client::{
    DaemonRequest, DaemonResponse, Method, RequestClient, Transport, TransportError,
};

use crate::responses;

/// A request as seen by the fake daemon.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path without the query string, e.g. `/1.0/images`.
    pub path: String,
    /// Raw query string, e.g. `project=vmvault`.
    pub query: String,
    pub body: Option<Value>,
}

impl RecordedRequest {
    /// True if the verb matches and the path contains `fragment`.
    pub fn is(&self, method: &Method, fragment: &str) -> bool {
        &self.method == method && self.path.contains(fragment)
    }
}

type Handler = dyn Fn(&RecordedRequest) -> DaemonResponse + Send + Sync;

struct Inner {
    handler: Box<Handler>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// In-memory daemon. Cloning shares the request log.
#[derive(Clone)]
pub struct FakeDaemon {
    inner: Arc<Inner>,
    delay: Option<Duration>,
    unreachable: bool,
}

impl FakeDaemon {
    /// Answer every request with `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> DaemonResponse + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                handler: Box::new(handler),
                requests: Mutex::new(Vec::new()),
            }),
            delay: None,
            unreachable: false,
        }
    }

    /// A daemon that knows about nothing.
    pub fn not_found() -> Self {
        Self::new(|_| responses::not_found())
    }

    /// A daemon whose socket cannot be reached.
    pub fn unreachable() -> Self {
        let mut daemon = Self::not_found();
        daemon.unreachable = true;
        daemon
    }

    /// Delay every reply.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// A request client over this daemon.
    pub fn client(&self, project: &str) -> RequestClient {
        RequestClient::new(Arc::new(self.clone()), project)
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner
            .requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of requests with `method` whose path contains `fragment`.
    pub fn count(&self, method: &Method, fragment: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.is(method, fragment))
            .count()
    }
}

#[async_trait]
impl Transport for FakeDaemon {
    async fn send(&self, request: DaemonRequest) -> Result<DaemonResponse, TransportError> {
        let (path, query) = match request.path_and_query.split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (request.path_and_query.clone(), String::new()),
        };

        let body = match request.body {
            Some(bytes) => Some(
                serde_json::from_slice(&bytes)
                    .map_err(|e| TransportError::Other(format!("fake daemon: bad body: {e}")))?,
            ),
            None => None,
        };

        let recorded = RecordedRequest {
            method: request.method,
            path,
            query,
            body,
        };

        if let Ok(mut requests) = self.inner.requests.lock() {
            requests.push(recorded.clone());
        }

        if self.unreachable {
            return Err(TransportError::SocketNotFound("/nonexistent/daemon.sock".to_string()));
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        Ok((self.inner.handler)(&recorded))
    }
}
