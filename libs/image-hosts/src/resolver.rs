//! Query resolution across image hosts.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use vmvault_id::Fingerprint;

use crate::host::{HostError, ImageHost};
use crate::info::VmImageInfo;
use crate::query::Query;

/// Why a query could not be resolved.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No host serves the requested remote.
    #[error("Remote \"{0}\" is unknown.")]
    RemoteUnknown(String),

    /// The remote exists but no image matches the alias.
    #[error("Unable to find an image matching \"{0}\"")]
    AliasUnknown(String),

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Ordered set of image hosts plus the remote -> host map.
pub struct ImageResolver {
    hosts: Vec<Arc<dyn ImageHost>>,
    remotes: HashMap<String, usize>,
}

impl ImageResolver {
    /// Build a resolver. Hosts are consulted in the given order; when two
    /// hosts claim the same remote the first one keeps it.
    pub fn new(hosts: Vec<Arc<dyn ImageHost>>) -> Self {
        let mut remotes = HashMap::new();
        for (index, host) in hosts.iter().enumerate() {
            for remote in host.supported_remotes() {
                if remotes.contains_key(&remote) {
                    warn!(remote = %remote, "Remote served by more than one image host, keeping the first");
                    continue;
                }
                remotes.insert(remote, index);
            }
        }

        Self { hosts, remotes }
    }

    /// Remote names known to any host, sorted.
    pub fn remotes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.remotes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a query to image metadata.
    pub async fn resolve(&self, query: &Query) -> Result<VmImageInfo, ResolveError> {
        if !query.remote_name.is_empty() {
            let index = self
                .remotes
                .get(&query.remote_name)
                .ok_or_else(|| ResolveError::RemoteUnknown(query.remote_name.clone()))?;

            if let Some(info) = self.hosts[*index].info_for(query).await? {
                debug!(release = %query.release, remote = %query.remote_name, id = %info.id.short(), "Resolved image");
                return Ok(info);
            }
        } else {
            for host in &self.hosts {
                if let Some(info) = host.info_for(query).await? {
                    debug!(release = %query.release, id = %info.id.short(), "Resolved image");
                    return Ok(info);
                }
            }
        }

        Err(ResolveError::AliasUnknown(query.release.clone()))
    }

    /// Find an image by its complete hash on any host.
    pub async fn info_for_full_hash(
        &self,
        hash: &Fingerprint,
    ) -> Result<Option<VmImageInfo>, ResolveError> {
        for host in &self.hosts {
            if let Some(info) = host.info_for_full_hash(hash).await? {
                return Ok(Some(info));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogImageHost;

    const RELEASE: &str = r#"
        [[remotes]]
        name = "release"
        server = "https://cloud-images.ubuntu.com/releases"

        [[remotes.images]]
        id = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        aliases = ["bionic", "18.04"]
        release_title = "18.04 LTS"
        version = "20200519.1"
    "#;

    const DAILY: &str = r#"
        [[remotes]]
        name = "daily"
        server = "https://cloud-images.ubuntu.com/daily"

        [[remotes.images]]
        id = "1f2e3d4c5b6a79881f2e3d4c5b6a79881f2e3d4c5b6a79881f2e3d4c5b6a7988"
        aliases = ["focal", "bionic"]
        release_title = "20.04 LTS"

        [[remotes]]
        name = "release"
        server = "https://mirror.example.com/releases"
    "#;

    fn resolver() -> ImageResolver {
        let release: Arc<dyn ImageHost> = Arc::new(CatalogImageHost::from_toml_str(RELEASE).unwrap());
        let daily: Arc<dyn ImageHost> = Arc::new(CatalogImageHost::from_toml_str(DAILY).unwrap());
        ImageResolver::new(vec![release, daily])
    }

    #[tokio::test]
    async fn test_resolves_on_explicit_remote() {
        let info = resolver()
            .resolve(&Query::alias("", "bionic").with_remote("release"))
            .await
            .unwrap();
        assert_eq!(info.release_title, "18.04 LTS");
    }

    #[tokio::test]
    async fn test_default_remote_uses_host_order() {
        let info = resolver().resolve(&Query::alias("", "focal")).await.unwrap();
        assert_eq!(info.release_title, "20.04 LTS");

        // Both hosts know "bionic"; the first registered host wins.
        let info = resolver().resolve(&Query::alias("", "bionic")).await.unwrap();
        assert_eq!(info.release_title, "18.04 LTS");
    }

    #[tokio::test]
    async fn test_unknown_remote() {
        let err = resolver()
            .resolve(&Query::alias("", "foo").with_remote("bar"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::RemoteUnknown(ref r) if r == "bar"));
        assert_eq!(err.to_string(), "Remote \"bar\" is unknown.");
    }

    #[tokio::test]
    async fn test_unknown_alias_on_known_remote() {
        let err = resolver()
            .resolve(&Query::alias("", "xenial").with_remote("release"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::AliasUnknown(ref a) if a == "xenial"));
        assert_eq!(err.to_string(), "Unable to find an image matching \"xenial\"");
    }

    #[tokio::test]
    async fn test_first_host_keeps_shared_remote() {
        let resolver = resolver();
        assert_eq!(resolver.remotes(), vec!["daily", "release"]);

        // "release" belongs to the first host, so the daily host's
        // "focal" is not reachable through it.
        let err = resolver
            .resolve(&Query::alias("", "focal").with_remote("release"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::AliasUnknown(_)));
    }

    #[tokio::test]
    async fn test_info_for_full_hash() {
        let hash =
            Fingerprint::parse("1f2e3d4c5b6a79881f2e3d4c5b6a79881f2e3d4c5b6a79881f2e3d4c5b6a7988")
                .unwrap();
        let info = resolver().info_for_full_hash(&hash).await.unwrap().unwrap();
        assert!(info.has_alias("focal"));

        let missing = Fingerprint::parse(&"0".repeat(64)).unwrap();
        assert!(resolver().info_for_full_hash(&missing).await.unwrap().is_none());
    }
}
