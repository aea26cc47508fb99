//! Vault error taxonomy.

use thiserror::Error;
use vmvault_daemon_client::{OperationError, RequestError};
use vmvault_id::OperationId;
use vmvault_image_hosts::{HostError, ResolveError};

/// Errors returned by image vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Resource not found: {url}")]
    NotFound { url: String },

    #[error("Daemon request failed: {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Invalid daemon response for {url}: {message}")]
    MalformedResponse { url: String, message: String },

    #[error("http and file based images are not supported")]
    UnsupportedQueryType,

    #[error("Remote \"{0}\" is unknown.")]
    RemoteUnknown(String),

    #[error("Unable to find an image matching \"{0}\"")]
    AliasUnknown(String),

    #[error("Operation {id} failed: {detail}")]
    OperationFailed { id: OperationId, detail: String },

    #[error("Download aborted")]
    AbortedDownload { id: OperationId },

    #[error("Image host error: {0}")]
    Host(#[from] HostError),
}

impl VaultError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, VaultError::NotFound { .. })
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, VaultError::AbortedDownload { .. })
    }
}

impl From<RequestError> for VaultError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::NotFound { url } => VaultError::NotFound { url },
            RequestError::Transport { url, message } => VaultError::Transport { url, message },
            RequestError::MalformedResponse { url, message } => {
                VaultError::MalformedResponse { url, message }
            }
        }
    }
}

impl From<ResolveError> for VaultError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::RemoteUnknown(remote) => VaultError::RemoteUnknown(remote),
            ResolveError::AliasUnknown(alias) => VaultError::AliasUnknown(alias),
            ResolveError::Host(e) => VaultError::Host(e),
        }
    }
}

impl From<OperationError> for VaultError {
    fn from(err: OperationError) -> Self {
        match err {
            OperationError::Request(e) => e.into(),
            OperationError::Failed { id, detail } => VaultError::OperationFailed { id, detail },
            OperationError::Aborted { id } => VaultError::AbortedDownload { id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_errors_keep_their_kind() {
        let err: VaultError = RequestError::NotFound {
            url: "/1.0/images/abc".to_string(),
        }
        .into();
        assert!(err.is_not_found());

        let err: VaultError = OperationError::Request(RequestError::Transport {
            url: "/1.0/operations/x".to_string(),
            message: "connection reset".to_string(),
        })
        .into();
        assert!(matches!(err, VaultError::Transport { ref message, .. } if message == "connection reset"));
    }

    #[test]
    fn test_resolve_errors_are_distinguishable() {
        let remote: VaultError = ResolveError::RemoteUnknown("foo".to_string()).into();
        let alias: VaultError = ResolveError::AliasUnknown("xenial".to_string()).into();

        assert_eq!(remote.to_string(), "Remote \"foo\" is unknown.");
        assert_eq!(alias.to_string(), "Unable to find an image matching \"xenial\"");
    }

    #[test]
    fn test_aborted_operation() {
        let id = OperationId::parse("0a19a412-03d0-4118-bee8-a3095f06d4da").unwrap();
        let err: VaultError = OperationError::Aborted { id }.into();
        assert!(err.is_aborted());
        assert_eq!(err.to_string(), "Download aborted");
    }
}
