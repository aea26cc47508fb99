//! Image metadata published by image hosts.

use serde::{Deserialize, Serialize};
use vmvault_id::Fingerprint;

/// What a host knows about one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmImageInfo {
    /// Content hash; the canonical existence key on the daemon.
    pub id: Fingerprint,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub release: String,
    /// Human label, e.g. "18.04 LTS".
    #[serde(default)]
    pub release_title: String,
    #[serde(default = "default_supported")]
    pub supported: bool,
    /// Where the daemon pulls the image from.
    #[serde(default)]
    pub stream_location: String,
    /// Image build version, e.g. "20200519.1".
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

fn default_supported() -> bool {
    true
}

impl VmImageInfo {
    /// Case-insensitive alias match.
    pub fn has_alias(&self, alias: &str) -> bool {
        self.aliases.iter().any(|a| a.eq_ignore_ascii_case(alias))
    }
}
