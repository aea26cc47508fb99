//! Server-side asynchronous operations.
//!
//! Long-running daemon work (image downloads) is tracked as an operation.
//! The poller reads its status until it is terminal, hands progress to a
//! caller-supplied monitor on every poll, and deletes the operation if the
//! monitor asks to stop.
//!
//! There is no overall deadline: each poll is bounded by `poll_timeout`, and
//! giving up is left to the monitor.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};
use vmvault_id::{Fingerprint, OperationId};

use crate::progress::{DownloadProgress, ProgressMonitor};
use crate::request::{RequestClient, RequestError};
use crate::wire;

/// Errors from waiting on an operation.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The daemon reports the operation failed.
    #[error("Operation {id} failed: {detail}")]
    Failed { id: OperationId, detail: String },

    /// The monitor asked to stop.
    #[error("Download aborted")]
    Aborted { id: OperationId },
}

/// Operation status as reported by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Created,
    Running,
    Success,
    Failure,
    Cancelled,
}

impl OperationStatus {
    /// Map a daemon status code.
    ///
    /// 100 Created, 101 Started, 102 Stopped, 103 Running, 104 Cancelling,
    /// 105 Pending, 200 Success, 400 Failure, 401 Cancelled. Unknown codes are
    /// bucketed by class.
    pub fn from_code(code: u16) -> Self {
        match code {
            100 | 105 => OperationStatus::Created,
            200..=299 => OperationStatus::Success,
            401 => OperationStatus::Cancelled,
            400..=u16::MAX => OperationStatus::Failure,
            _ => OperationStatus::Running,
        }
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationStatus::Created => write!(f, "created"),
            OperationStatus::Running => write!(f, "running"),
            OperationStatus::Success => write!(f, "success"),
            OperationStatus::Failure => write!(f, "failure"),
            OperationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Snapshot of a server-tracked operation.
#[derive(Debug, Clone)]
pub struct Operation {
    pub id: OperationId,
    pub class: String,
    pub status: OperationStatus,
    /// Progress of the current stage, if the daemon reported any.
    pub progress: Option<DownloadProgress>,
    /// Operation-specific metadata; carries the result once successful.
    pub result: Map<String, Value>,
    /// Error detail reported by the daemon.
    pub error: String,
}

#[derive(Debug, Deserialize)]
struct OperationMetadata {
    id: OperationId,
    #[serde(default)]
    class: String,
    status_code: u16,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
    #[serde(default)]
    err: String,
}

impl Operation {
    /// Decode an operation from a `GET operations/<id>` reply.
    pub fn from_reply(reply: &Map<String, Value>) -> serde_json::Result<Self> {
        let envelope: wire::Envelope<OperationMetadata> = wire::decode(reply)?;
        let metadata = envelope.metadata;
        let result = metadata.metadata.unwrap_or_default();

        let progress = result
            .get("download_progress")
            .and_then(Value::as_str)
            .map(DownloadProgress::parse);

        Ok(Self {
            id: metadata.id,
            class: metadata.class,
            status: OperationStatus::from_code(metadata.status_code),
            progress,
            result,
            error: metadata.err,
        })
    }

    /// Fingerprint of the image produced by a successful download.
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.result
            .get("fingerprint")
            .and_then(Value::as_str)
            .and_then(|s| Fingerprint::parse(s).ok())
    }
}

/// Poller settings.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Timeout of each individual status request.
    pub poll_timeout: Duration,
    /// Pause between polls of a running operation.
    pub poll_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Drives a daemon operation to completion.
pub struct OperationPoller {
    client: RequestClient,
    config: PollerConfig,
}

impl OperationPoller {
    pub fn new(client: RequestClient, config: PollerConfig) -> Self {
        Self { client, config }
    }

    /// Poll `id` until it reaches a terminal state or `monitor` returns false.
    pub async fn await_operation(
        &self,
        id: &OperationId,
        monitor: &mut ProgressMonitor<'_>,
    ) -> Result<Operation, OperationError> {
        let path = operation_path(id);

        loop {
            let reply = self.client.get(&path, self.config.poll_timeout).await?;

            let operation =
                Operation::from_reply(&reply).map_err(|e| RequestError::MalformedResponse {
                    url: self.client.url(&path),
                    message: e.to_string(),
                })?;

            let progress = operation.progress.unwrap_or(DownloadProgress::WAITING);
            if !monitor(progress.stage, progress.monitor_percent()) {
                self.cancel(id).await;
                return Err(OperationError::Aborted { id: id.clone() });
            }

            match operation.status {
                OperationStatus::Success => {
                    debug!(operation_id = %id, "Operation succeeded");
                    return Ok(operation);
                }
                OperationStatus::Failure => {
                    return Err(OperationError::Failed {
                        id: id.clone(),
                        detail: operation.error,
                    });
                }
                OperationStatus::Cancelled => {
                    let detail = if operation.error.is_empty() {
                        "operation was cancelled".to_string()
                    } else {
                        operation.error
                    };
                    return Err(OperationError::Failed {
                        id: id.clone(),
                        detail,
                    });
                }
                OperationStatus::Created | OperationStatus::Running => {
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }
    }

    /// Best-effort deletion of an unfinished operation.
    pub async fn cancel(&self, id: &OperationId) {
        let path = operation_path(id);
        match self.client.delete(&path, self.config.poll_timeout).await {
            Ok(_) => debug!(operation_id = %id, "Cancelled operation"),
            Err(e) => warn!(operation_id = %id, error = %e, "Failed to cancel operation"),
        }
    }
}

fn operation_path(id: &OperationId) -> String {
    format!("operations/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::DownloadStage;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_status_from_code() {
        assert_eq!(OperationStatus::from_code(100), OperationStatus::Created);
        assert_eq!(OperationStatus::from_code(103), OperationStatus::Running);
        assert_eq!(OperationStatus::from_code(104), OperationStatus::Running);
        assert_eq!(OperationStatus::from_code(200), OperationStatus::Success);
        assert_eq!(OperationStatus::from_code(400), OperationStatus::Failure);
        assert_eq!(OperationStatus::from_code(401), OperationStatus::Cancelled);
        assert_eq!(OperationStatus::from_code(500), OperationStatus::Failure);
    }

    #[test]
    fn test_operation_from_running_reply() {
        let reply = object(json!({
            "type": "sync",
            "status": "Success",
            "status_code": 200,
            "metadata": {
                "id": "0a19a412-03d0-4118-bee8-a3095f06d4da",
                "class": "task",
                "status": "Running",
                "status_code": 103,
                "metadata": {"download_progress": "rootfs: 25% (1.20MB/s)"},
                "err": ""
            }
        }));

        let op = Operation::from_reply(&reply).unwrap();
        assert_eq!(op.status, OperationStatus::Running);
        assert_eq!(op.class, "task");
        let progress = op.progress.unwrap();
        assert_eq!(progress.stage, DownloadStage::Rootfs);
        assert_eq!(progress.percent, Some(25));
        assert!(op.fingerprint().is_none());
    }

    #[test]
    fn test_operation_from_success_reply() {
        let reply = object(json!({
            "type": "sync",
            "status_code": 200,
            "metadata": {
                "id": "op-1",
                "status_code": 200,
                "metadata": {
                    "fingerprint": "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
                    "size": 342556672
                }
            }
        }));

        let op = Operation::from_reply(&reply).unwrap();
        assert_eq!(op.status, OperationStatus::Success);
        assert!(op.progress.is_none());
        assert!(op.fingerprint().unwrap().is_full());
    }

    #[test]
    fn test_operation_missing_status_code_is_error() {
        let reply = object(json!({"type": "sync", "metadata": {"id": "op-1"}}));
        assert!(Operation::from_reply(&reply).is_err());
    }
}
