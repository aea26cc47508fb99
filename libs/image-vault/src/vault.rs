//! Image vault capability and the daemon-backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, info, trace, warn};
use vmvault_daemon_client::{
    wire, OperationPoller, PollerConfig, ProgressMonitor, RequestClient,
};
use vmvault_id::Fingerprint;
use vmvault_image_hosts::{ImageResolver, Query, QueryType, VmImageInfo};

use crate::config::VaultConfig;
use crate::error::VaultError;
use crate::image::{FetchType, PrepareAction, VmImage};

/// What every image vault backend offers.
#[async_trait]
pub trait VmImageVault: Send + Sync {
    /// Make the image a query refers to available locally.
    ///
    /// `prepare` is applied to the descriptor before it is returned.
    /// `monitor` receives download progress and may cancel the download by
    /// returning false.
    async fn fetch_image(
        &self,
        fetch_type: FetchType,
        query: &Query,
        prepare: &PrepareAction,
        monitor: &mut ProgressMonitor<'_>,
    ) -> Result<VmImage, VaultError>;

    /// Delete the record of instance `name`. A missing instance is not an
    /// error.
    async fn remove(&self, name: &str) -> Result<(), VaultError>;

    /// Whether instance `name` exists.
    async fn has_record_for(&self, name: &str) -> Result<bool, VaultError>;

    async fn prune_expired_images(&self) -> Result<(), VaultError>;

    async fn update_images(
        &self,
        fetch_type: FetchType,
        prepare: &PrepareAction,
        monitor: &mut ProgressMonitor<'_>,
    ) -> Result<(), VaultError>;
}

/// Image vault delegating storage to the hypervisor daemon.
///
/// Holds no state of its own; the daemon is the source of truth for which
/// images and instances exist.
pub struct DaemonImageVault {
    client: RequestClient,
    resolver: ImageResolver,
    poller: OperationPoller,
    request_timeout: Duration,
}

impl DaemonImageVault {
    pub fn new(client: RequestClient, resolver: ImageResolver, config: &VaultConfig) -> Self {
        let poller = OperationPoller::new(
            client.clone(),
            PollerConfig {
                poll_timeout: config.poll_timeout,
                poll_interval: config.poll_interval,
            },
        );

        Self {
            client,
            resolver,
            poller,
            request_timeout: config.request_timeout,
        }
    }

    /// Vault talking to the daemon socket named in `config`.
    pub fn connect(resolver: ImageResolver, config: &VaultConfig) -> Self {
        let client = RequestClient::unix(&config.socket_path, config.project.clone());
        Self::new(client, resolver, config)
    }

    /// Image an existing instance was created from, or `None` if there is
    /// no such instance.
    async fn instance_image(&self, name: &str) -> Result<Option<VmImage>, VaultError> {
        let path = instance_path(name);
        let reply = match self.client.get(&path, self.request_timeout).await {
            Ok(reply) => reply,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let config = wire::metadata(&reply)
            .get("config")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let id = Fingerprint::parse(wire::str_field(&config, "volatile.base_image")).map_err(|e| {
            VaultError::MalformedResponse {
                url: self.client.url(&path),
                message: format!("instance has no usable base image: {e}"),
            }
        })?;

        let mut image = VmImage {
            id,
            stream_location: wire::str_field(&config, "image.stream_location").to_string(),
            original_release: wire::str_field(&config, "image.release_title").to_string(),
            release_date: wire::str_field(&config, "image.version").to_string(),
            aliases: Vec::new(),
        };

        if image.original_release.is_empty() {
            if let Some(info) = self.resolver.info_for_full_hash(&image.id).await? {
                fill_from_info(&mut image, &info);
            }
        }

        Ok(Some(image))
    }

    /// Whether the daemon already stores image `id`.
    async fn has_image(&self, id: &Fingerprint) -> Result<bool, VaultError> {
        match self
            .client
            .get(&format!("images/{id}"), self.request_timeout)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Have the daemon pull `info` and wait for it.
    async fn download(
        &self,
        info: &VmImageInfo,
        monitor: &mut ProgressMonitor<'_>,
    ) -> Result<VmImage, VaultError> {
        info!(
            id = %info.id.short(),
            server = %info.stream_location,
            "Downloading image"
        );

        let reply = self
            .client
            .post("images", &pull_request(info), self.request_timeout)
            .await?;

        let operation_id =
            wire::operation_id(&reply).ok_or_else(|| VaultError::MalformedResponse {
                url: self.client.url("images"),
                message: "reply carries no operation id".to_string(),
            })?;

        debug!(operation_id = %operation_id, "Image download started");

        let operation = self.poller.await_operation(&operation_id, monitor).await?;

        let mut image = VmImage::from(info);
        if let Some(fingerprint) = operation.fingerprint() {
            image.id = fingerprint;
        }

        info!(id = %image.id.short(), "Image downloaded");
        Ok(image)
    }
}

#[async_trait]
impl VmImageVault for DaemonImageVault {
    async fn fetch_image(
        &self,
        _fetch_type: FetchType,
        query: &Query,
        prepare: &PrepareAction,
        monitor: &mut ProgressMonitor<'_>,
    ) -> Result<VmImage, VaultError> {
        if query.query_type != QueryType::Alias {
            return Err(VaultError::UnsupportedQueryType);
        }

        if !query.name.is_empty() {
            if let Some(image) = self.instance_image(&query.name).await? {
                debug!(name = %query.name, id = %image.id.short(), "Instance exists, using its image");
                return Ok(prepare(image));
            }
        }

        let info = self.resolver.resolve(query).await?;

        if self.has_image(&info.id).await? {
            debug!(id = %info.id.short(), "Image already present");
            return Ok(prepare(VmImage::from(&info)));
        }

        let image = self.download(&info, monitor).await?;
        Ok(prepare(image))
    }

    async fn remove(&self, name: &str) -> Result<(), VaultError> {
        match self
            .client
            .delete(&instance_path(name), self.request_timeout)
            .await
        {
            Ok(_) => {
                debug!(name = %name, "Removed instance");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!("Instance '{}' does not exist: not removing", name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn has_record_for(&self, name: &str) -> Result<bool, VaultError> {
        match self
            .client
            .get(&instance_path(name), self.request_timeout)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn prune_expired_images(&self) -> Result<(), VaultError> {
        trace!("Pruning expired images not implemented");
        Ok(())
    }

    async fn update_images(
        &self,
        _fetch_type: FetchType,
        _prepare: &PrepareAction,
        _monitor: &mut ProgressMonitor<'_>,
    ) -> Result<(), VaultError> {
        trace!("Updating images not implemented");
        Ok(())
    }
}

fn instance_path(name: &str) -> String {
    format!("virtual-machines/{name}")
}

fn fill_from_info(image: &mut VmImage, info: &VmImageInfo) {
    image.original_release = info.release_title.clone();
    if image.release_date.is_empty() {
        image.release_date = info.version.clone();
    }
    if image.stream_location.is_empty() {
        image.stream_location = info.stream_location.clone();
    }
    image.aliases = info.aliases.clone();
}

/// `POST images` body asking the daemon to pull `info` from its stream.
fn pull_request(info: &VmImageInfo) -> Value {
    let mut properties = Map::new();
    properties.insert("release_title".into(), info.release_title.clone().into());
    properties.insert("version".into(), info.version.clone().into());
    properties.insert("stream_location".into(), info.stream_location.clone().into());

    json!({
        "source": {
            "type": "image",
            "mode": "pull",
            "server": info.stream_location,
            "protocol": "simplestreams",
            "image_type": "virtual-machine",
            "fingerprint": info.id.as_str(),
        },
        "properties": properties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmvault_testing::StubImageHost;

    #[test]
    fn test_pull_request_body() {
        let host = StubImageHost::new();
        let body = pull_request(host.image());

        assert_eq!(body["source"]["type"], "image");
        assert_eq!(body["source"]["mode"], "pull");
        assert_eq!(body["source"]["protocol"], "simplestreams");
        assert_eq!(body["source"]["image_type"], "virtual-machine");
        assert_eq!(body["source"]["server"], "https://cloud-images.ubuntu.com/releases");
        assert_eq!(
            body["source"]["fingerprint"],
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(body["properties"]["release_title"], "18.04 LTS");
        assert_eq!(body["properties"]["version"], "20200519.1");
    }

    #[test]
    fn test_fill_keeps_recorded_labels() {
        let host = StubImageHost::new();
        let mut image = VmImage {
            id: host.image().id.clone(),
            stream_location: "https://mirror.example.com".to_string(),
            original_release: String::new(),
            release_date: String::new(),
            aliases: Vec::new(),
        };

        fill_from_info(&mut image, host.image());

        assert_eq!(image.stream_location, "https://mirror.example.com");
        assert_eq!(image.original_release, "18.04 LTS");
        assert_eq!(image.release_date, "20200519.1");
        assert_eq!(image.aliases, vec!["bionic", "18.04"]);
    }

    #[test]
    fn test_instance_path() {
        assert_eq!(instance_path("pied-piper-valley"), "virtual-machines/pied-piper-valley");
    }
}
