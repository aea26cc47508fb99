//! Stub image host.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use vmvault_id::Fingerprint;
use vmvault_image_hosts::{HostError, ImageHost, Query, VmImageInfo};

use crate::responses::{DEFAULT_ID, DEFAULT_RELEASE_TITLE, DEFAULT_STREAM_LOCATION, DEFAULT_VERSION};

/// Image host serving a single image on the "release" remote.
///
/// By default any alias resolves to that image.
pub struct StubImageHost {
    image: VmImageInfo,
    remotes: Vec<String>,
    aliases: Option<Vec<String>>,
    lookups: AtomicUsize,
}

impl StubImageHost {
    pub fn new() -> Self {
        Self {
            image: default_image_info(),
            remotes: vec!["release".to_string()],
            aliases: None,
            lookups: AtomicUsize::new(0),
        }
    }

    /// Only resolve the given aliases.
    #[must_use]
    pub fn only_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = Some(aliases.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn image(&self) -> &VmImageInfo {
        &self.image
    }

    /// Number of `info_for` calls so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl Default for StubImageHost {
    fn default() -> Self {
        Self::new()
    }
}

/// The image every stub host serves.
pub fn default_image_info() -> VmImageInfo {
    VmImageInfo {
        id: Fingerprint::parse(DEFAULT_ID).unwrap_or_else(|e| panic!("bad default id: {e}")),
        aliases: vec!["bionic".to_string(), "18.04".to_string()],
        os: "Ubuntu".to_string(),
        release: "bionic".to_string(),
        release_title: DEFAULT_RELEASE_TITLE.to_string(),
        supported: true,
        stream_location: DEFAULT_STREAM_LOCATION.to_string(),
        version: DEFAULT_VERSION.to_string(),
        size: None,
    }
}

#[async_trait]
impl ImageHost for StubImageHost {
    async fn info_for(&self, query: &Query) -> Result<Option<VmImageInfo>, HostError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if !query.remote_name.is_empty() && !self.remotes.contains(&query.remote_name) {
            return Ok(None);
        }

        let matches = self
            .aliases
            .as_ref()
            .map_or(true, |aliases| aliases.contains(&query.release));

        Ok(matches.then(|| self.image.clone()))
    }

    async fn info_for_full_hash(
        &self,
        hash: &Fingerprint,
    ) -> Result<Option<VmImageInfo>, HostError> {
        Ok((hash == &self.image.id).then(|| self.image.clone()))
    }

    fn supported_remotes(&self) -> Vec<String> {
        self.remotes.clone()
    }
}
