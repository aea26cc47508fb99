//! Control channel transport.
//!
//! The daemon speaks HTTP over a Unix domain socket. `Transport` is the seam
//! between the request bridge and the wire so tests can script the daemon;
//! `UnixSocketTransport` is the production implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use hyper::http::uri::{InvalidUri, PathAndQuery};
use hyper::{Body, Client, Method, Request};
use hyperlocal::{UnixClientExt, UnixConnector, Uri};
use thiserror::Error;
use tracing::debug;

/// Errors raised below the request bridge.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] hyper::http::Error),

    #[error("Invalid request path: {0}")]
    InvalidUri(#[from] InvalidUri),

    #[error("Socket not found: {0}")]
    SocketNotFound(String),

    #[error("{0}")]
    Other(String),
}

/// A single request to the daemon.
#[derive(Debug, Clone)]
pub struct DaemonRequest {
    /// HTTP verb.
    pub method: Method,
    /// Absolute path including the query string, e.g. `/1.0/images?project=vmvault`.
    pub path_and_query: String,
    /// Serialized JSON body, if any.
    pub body: Option<Bytes>,
}

/// Raw daemon reply before classification.
#[derive(Debug, Clone)]
pub struct DaemonResponse {
    pub status: u16,
    pub body: Bytes,
}

impl DaemonResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Control channel abstraction.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and wait for the complete response.
    async fn send(&self, request: DaemonRequest) -> Result<DaemonResponse, TransportError>;
}

/// HTTP over the daemon's Unix socket.
pub struct UnixSocketTransport {
    socket_path: PathBuf,
    client: Client<UnixConnector>,
}

impl UnixSocketTransport {
    /// Create a transport for the given socket path.
    pub fn new<P: AsRef<Path>>(socket_path: P) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
            client: Client::unix(),
        }
    }

    /// Check if the socket exists.
    pub fn socket_exists(&self) -> bool {
        self.socket_path.exists()
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

#[async_trait]
impl Transport for UnixSocketTransport {
    async fn send(&self, request: DaemonRequest) -> Result<DaemonResponse, TransportError> {
        if !self.socket_exists() {
            return Err(TransportError::SocketNotFound(
                self.socket_path.display().to_string(),
            ));
        }

        // hyperlocal panics on a path it cannot parse.
        let path_and_query: PathAndQuery = request.path_and_query.parse()?;
        let uri: hyper::Uri = Uri::new(&self.socket_path, path_and_query.as_str()).into();

        debug!(
            method = %request.method,
            path = %request.path_and_query,
            "Daemon socket request"
        );

        let mut builder = Request::builder()
            .method(request.method)
            .uri(uri)
            .header("Accept", "application/json");

        let body = match request.body {
            Some(bytes) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(bytes)
            }
            None => Body::empty(),
        };

        let response = self.client.request(builder.body(body)?).await?;
        let status = response.status().as_u16();
        let body = hyper::body::to_bytes(response.into_body()).await?;

        Ok(DaemonResponse { status, body })
    }
}
