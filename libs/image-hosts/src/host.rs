//! Image host capability.
//!
//! Every catalog source (a local catalog file, a simplestreams mirror, a
//! test stub) implements `ImageHost`. The resolver queries hosts in order
//! and never needs to know which kind it is talking to.

use async_trait::async_trait;
use thiserror::Error;
use vmvault_id::Fingerprint;

use crate::info::VmImageInfo;
use crate::query::Query;

/// Errors from consulting an image host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

/// A source of image metadata.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Look up the image a query refers to.
    ///
    /// An empty `query.remote_name` means this host's default remote.
    /// `Ok(None)` means the host has no matching image.
    async fn info_for(&self, query: &Query) -> Result<Option<VmImageInfo>, HostError>;

    /// Look up an image by its complete content hash across all remotes.
    async fn info_for_full_hash(
        &self,
        hash: &Fingerprint,
    ) -> Result<Option<VmImageInfo>, HostError>;

    /// Remote names this host serves.
    fn supported_remotes(&self) -> Vec<String>;
}
