//! Image host backed by a TOML catalog file.
//!
//! ```toml
//! default_remote = "release"
//!
//! [[remotes]]
//! name = "release"
//! server = "https://cloud-images.ubuntu.com/releases"
//!
//! [[remotes.images]]
//! id = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
//! aliases = ["bionic", "18.04", "lts"]
//! release_title = "18.04 LTS"
//! version = "20200519.1"
//! ```

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use vmvault_id::Fingerprint;

use crate::host::{HostError, ImageHost};
use crate::info::VmImageInfo;
use crate::query::Query;

/// Shortest hash prefix accepted in place of an alias.
const MIN_HASH_PREFIX: usize = 8;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    default_remote: Option<String>,
    #[serde(default)]
    remotes: Vec<RemoteEntry>,
}

#[derive(Debug, Deserialize)]
struct RemoteEntry {
    name: String,
    server: String,
    #[serde(default)]
    images: Vec<VmImageInfo>,
}

#[derive(Debug)]
struct Remote {
    name: String,
    images: Vec<VmImageInfo>,
}

/// Image host serving one or more remotes from a static catalog.
#[derive(Debug)]
pub struct CatalogImageHost {
    default_remote: String,
    remotes: Vec<Remote>,
}

impl CatalogImageHost {
    /// Load a catalog file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, HostError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let host = Self::from_toml_str(&contents)?;
        debug!(
            path = %path.as_ref().display(),
            remotes = host.remotes.len(),
            "Loaded image catalog"
        );
        Ok(host)
    }

    /// Parse a catalog from TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self, HostError> {
        let file: CatalogFile = toml::from_str(contents)?;

        if file.remotes.is_empty() {
            return Err(HostError::Invalid("catalog defines no remotes".to_string()));
        }

        let mut seen = HashSet::new();
        let mut remotes = Vec::with_capacity(file.remotes.len());
        for entry in file.remotes {
            if !seen.insert(entry.name.clone()) {
                return Err(HostError::Invalid(format!(
                    "remote \"{}\" is defined twice",
                    entry.name
                )));
            }

            let images = entry
                .images
                .into_iter()
                .map(|mut image| {
                    if image.stream_location.is_empty() {
                        image.stream_location = entry.server.clone();
                    }
                    image
                })
                .collect();

            remotes.push(Remote {
                name: entry.name,
                images,
            });
        }

        let default_remote = match file.default_remote {
            Some(name) if seen.contains(&name) => name,
            Some(name) => {
                return Err(HostError::Invalid(format!(
                    "default remote \"{name}\" is not defined"
                )))
            }
            None => remotes[0].name.clone(),
        };

        Ok(Self {
            default_remote,
            remotes,
        })
    }

    pub fn default_remote(&self) -> &str {
        &self.default_remote
    }

    /// All catalog entries, optionally restricted to one remote.
    pub fn images<'a>(&'a self, remote: Option<&'a str>) -> impl Iterator<Item = (&'a str, &'a VmImageInfo)> + 'a {
        self.remotes
            .iter()
            .filter(move |r| remote.map_or(true, |name| r.name == name))
            .flat_map(|r| r.images.iter().map(move |image| (r.name.as_str(), image)))
    }

    fn remote(&self, name: &str) -> Option<&Remote> {
        self.remotes.iter().find(|r| r.name == name)
    }
}

fn matches(image: &VmImageInfo, release: &str) -> bool {
    (image.supported && image.has_alias(release))
        || (release.len() >= MIN_HASH_PREFIX && image.id.matches_prefix(release))
}

#[async_trait]
impl ImageHost for CatalogImageHost {
    async fn info_for(&self, query: &Query) -> Result<Option<VmImageInfo>, HostError> {
        let remote_name = if query.remote_name.is_empty() {
            self.default_remote.as_str()
        } else {
            query.remote_name.as_str()
        };

        Ok(self.remote(remote_name).and_then(|remote| {
            remote
                .images
                .iter()
                .find(|image| matches(image, &query.release))
                .cloned()
        }))
    }

    async fn info_for_full_hash(
        &self,
        hash: &Fingerprint,
    ) -> Result<Option<VmImageInfo>, HostError> {
        Ok(self
            .remotes
            .iter()
            .flat_map(|r| r.images.iter())
            .find(|image| &image.id == hash)
            .cloned())
    }

    fn supported_remotes(&self) -> Vec<String> {
        self.remotes.iter().map(|r| r.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    const CATALOG: &str = r#"
        default_remote = "release"

        [[remotes]]
        name = "release"
        server = "https://cloud-images.ubuntu.com/releases"

        [[remotes.images]]
        id = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        aliases = ["bionic", "18.04", "lts"]
        os = "Ubuntu"
        release = "bionic"
        release_title = "18.04 LTS"
        version = "20200519.1"

        [[remotes.images]]
        id = "9a9b9c9d9e9f9a9b9c9d9e9f9a9b9c9d9e9f9a9b9c9d9e9f9a9b9c9d9e9f9a9b"
        aliases = ["trusty"]
        release_title = "14.04 LTS"
        supported = false

        [[remotes]]
        name = "daily"
        server = "https://cloud-images.ubuntu.com/daily"

        [[remotes.images]]
        id = "1f2e3d4c5b6a79881f2e3d4c5b6a79881f2e3d4c5b6a79881f2e3d4c5b6a7988"
        aliases = ["focal"]
        release_title = "20.04 LTS"
        stream_location = "https://mirror.example.com/daily"
    "#;

    fn host() -> CatalogImageHost {
        CatalogImageHost::from_toml_str(CATALOG).unwrap()
    }

    #[rstest]
    #[case("", "bionic", Some("18.04 LTS"))]
    #[case("", "LTS", Some("18.04 LTS"))]
    #[case("release", "18.04", Some("18.04 LTS"))]
    #[case("", "e3b0c442", Some("18.04 LTS"))]
    #[case("", "e3b0", None)]
    #[case("", "focal", None)]
    #[case("daily", "focal", Some("20.04 LTS"))]
    #[case("", "trusty", None)]
    #[case("", "9a9b9c9d9e", Some("14.04 LTS"))]
    #[case("nowhere", "bionic", None)]
    #[tokio::test]
    async fn test_info_for(
        #[case] remote: &str,
        #[case] release: &str,
        #[case] expected: Option<&str>,
    ) {
        let query = Query::alias("", release).with_remote(remote);
        let info = host().info_for(&query).await.unwrap();
        assert_eq!(info.as_ref().map(|i| i.release_title.as_str()), expected);
    }

    #[tokio::test]
    async fn test_stream_location_inherits_server() {
        let host = host();
        let bionic = host.info_for(&Query::alias("", "bionic")).await.unwrap().unwrap();
        assert_eq!(bionic.stream_location, "https://cloud-images.ubuntu.com/releases");

        let focal = host
            .info_for(&Query::alias("", "focal").with_remote("daily"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(focal.stream_location, "https://mirror.example.com/daily");
    }

    #[test]
    fn test_supported_remotes_and_listing() {
        let host = host();
        assert_eq!(host.supported_remotes(), vec!["release", "daily"]);
        assert_eq!(host.default_remote(), "release");
        assert_eq!(host.images(None).count(), 3);
        assert_eq!(host.images(Some("daily")).count(), 1);
    }

    #[test]
    fn test_default_remote_falls_back_to_first() {
        let host = CatalogImageHost::from_toml_str(
            r#"
            [[remotes]]
            name = "snapcraft"
            server = "https://cloud-images.ubuntu.com/buildd/releases"
            "#,
        )
        .unwrap();
        assert_eq!(host.default_remote(), "snapcraft");
    }

    #[rstest]
    #[case("remotes = []")]
    #[case("default_remote = \"nope\"\n[[remotes]]\nname = \"release\"\nserver = \"x\"")]
    #[case("[[remotes]]\nname = \"a\"\nserver = \"x\"\n[[remotes]]\nname = \"a\"\nserver = \"y\"")]
    fn test_invalid_catalogs(#[case] contents: &str) {
        assert!(matches!(
            CatalogImageHost::from_toml_str(contents),
            Err(HostError::Invalid(_))
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            CatalogImageHost::from_toml_str("remotes = ["),
            Err(HostError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let host = CatalogImageHost::load(file.path()).unwrap();
        assert_eq!(host.supported_remotes().len(), 2);

        let missing = CatalogImageHost::load(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(HostError::Io(_))));
    }
}
