//! # vmvault-daemon-client
//!
//! Client side of the local hypervisor daemon's control channel.
//!
//! ## Modules
//!
//! - `transport`: the `Transport` seam and the Unix socket implementation
//! - `request`: `RequestClient`, one awaited request with timeout and typed
//!   failure classification
//! - `wire`: response envelope helpers
//! - `operation`: server-side operations and the `OperationPoller`
//! - `progress`: download progress parsing and the monitor callback type
//!
//! Every request is scoped to the client's project namespace; nothing is
//! retried.

pub mod operation;
pub mod progress;
pub mod request;
pub mod transport;
pub mod wire;

pub use hyper::Method;
pub use operation::{Operation, OperationError, OperationPoller, OperationStatus, PollerConfig};
pub use progress::{DownloadProgress, DownloadStage, ProgressMonitor, INDETERMINATE};
pub use request::{RequestClient, RequestError};
pub use transport::{DaemonRequest, DaemonResponse, Transport, TransportError, UnixSocketTransport};
